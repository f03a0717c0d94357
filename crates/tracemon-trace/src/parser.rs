use tracemon_model::{HopRecord, TraceSnapshot, UNKNOWN_ADDRESS};

/// Result of parsing one traceroute run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTrace {
    /// Target named in the header line, when it could be read.
    pub target: Option<String>,
    pub snapshot: TraceSnapshot,
    /// Non-blank lines whose first token was not a hop number.
    pub skipped_lines: Vec<String>,
}

/// Parses raw traceroute output. Never fails: the first line is treated as the
/// header, blank lines are ignored and lines without a leading hop number are
/// collected in [`ParsedTrace::skipped_lines`]. A later line for the same hop
/// replaces an earlier one.
pub fn parse_trace(text: &str) -> ParsedTrace {
    let mut parsed = ParsedTrace::default();
    let mut lines = text.trim().lines();

    if let Some(header) = lines.next() {
        parsed.target = parse_target(header);
    }

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        match parse_hop_line(line) {
            Some(record) => {
                parsed.snapshot.insert(record);
            }
            None => parsed.skipped_lines.push(line.trim().to_string()),
        }
    }

    parsed
}

/// Parses a single hop line such as ` 2  * 192.168.1.1  3.000 ms`.
///
/// Returns `None` when the first token is not a positive hop number. The
/// address is the first dotted-quad token anywhere after the hop number, so a
/// timed-out first probe does not hide it. The latency is the mean of every
/// `<n> ms` / `<n>ms` sample, or infinity when there are none.
pub fn parse_hop_line(line: &str) -> Option<HopRecord> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (first, rest) = tokens.split_first()?;

    let hop_number: u32 = first.parse().ok().filter(|hop| *hop > 0)?;

    let address = rest
        .iter()
        .copied()
        .find(|token| is_ipv4(token))
        .unwrap_or(UNKNOWN_ADDRESS);

    let samples = collect_rtts(rest);
    let average_latency_ms = if samples.is_empty() {
        f64::INFINITY
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    };

    Some(HopRecord::new(hop_number, address, average_latency_ms))
}

fn collect_rtts(tokens: &[&str]) -> Vec<f64> {
    let mut samples = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let next = tokens.get(i + 1).copied();
        match parse_rtt(tokens[i], next) {
            Some((val, consumed_next)) => {
                samples.push(val);
                i += if consumed_next { 2 } else { 1 };
            }
            None => i += 1,
        }
    }
    samples
}

fn parse_rtt(token: &str, next: Option<&str>) -> Option<(f64, bool)> {
    if let Some(num) = token.strip_suffix("ms") {
        return parse_sample(num).map(|val| (val, false));
    }

    if next == Some("ms") {
        return parse_sample(token).map(|val| (val, true));
    }

    None
}

fn parse_sample(text: &str) -> Option<f64> {
    text.parse::<f64>()
        .ok()
        .filter(|val| val.is_finite() && *val >= 0.0)
}

/// Four groups of one or more ASCII digits separated by dots.
fn is_ipv4(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Reads the target from a header such as
/// `traceroute to example.net (93.184.216.34), 30 hops max`, preferring the
/// resolved address in parentheses over the name.
fn parse_target(header: &str) -> Option<String> {
    let mut words = header.split_whitespace();
    if !words.next()?.to_ascii_lowercase().starts_with("traceroute") {
        return None;
    }
    words.find(|word| word.eq_ignore_ascii_case("to"))?;

    let name = words.next()?.trim_end_matches(',');
    let resolved = words
        .next()
        .and_then(|word| word.trim_end_matches(',').strip_prefix('('))
        .and_then(|word| word.strip_suffix(')'))
        .filter(|addr| !addr.is_empty());

    resolved
        .or(Some(name))
        .filter(|host| !host.is_empty())
        .map(str::to_string)
}
