//! Traceroute collection and parsing.

pub mod parser;
pub mod runner;

pub use parser::{parse_hop_line, parse_trace, ParsedTrace};
pub use runner::{run_traceroute, Prober, SystemTracerouteProber, TraceSettings};
