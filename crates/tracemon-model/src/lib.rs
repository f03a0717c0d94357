//! Shared data structures for tracemon.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Address recorded for a hop when no IPv4 address appears on its line.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Observed state of a single hop.
#[derive(Debug, Clone, PartialEq)]
pub struct HopRecord {
    /// 1-based position along the path.
    pub hop_number: u32,
    /// Dotted-decimal IPv4 address, or [`UNKNOWN_ADDRESS`].
    pub address: String,
    /// Mean of the timed responses; infinity when every probe timed out.
    pub average_latency_ms: f64,
}

impl HopRecord {
    pub fn new(hop_number: u32, address: impl Into<String>, average_latency_ms: f64) -> Self {
        Self {
            hop_number,
            address: address.into(),
            average_latency_ms,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.address == UNKNOWN_ADDRESS
    }

    pub fn timed_out(&self) -> bool {
        self.average_latency_ms.is_infinite()
    }
}

/// Parsed representation of one trace, ordered by hop number.
///
/// On disk the snapshot is a JSON object keyed by the hop number as a string,
/// each value carrying `ip` and `average_ping`. Infinite latency is stored as
/// `null` because JSON has no infinity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceSnapshot {
    hops: BTreeMap<u32, HopRecord>,
}

impl TraceSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record under its hop number, returning the one it replaced.
    pub fn insert(&mut self, record: HopRecord) -> Option<HopRecord> {
        self.hops.insert(record.hop_number, record)
    }

    pub fn get(&self, hop_number: u32) -> Option<&HopRecord> {
        self.hops.get(&hop_number)
    }

    pub fn contains(&self, hop_number: u32) -> bool {
        self.hops.contains_key(&hop_number)
    }

    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn hop_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.hops.keys().copied()
    }

    /// Records in ascending hop order.
    pub fn iter(&self) -> std::collections::btree_map::Values<'_, u32, HopRecord> {
        self.hops.values()
    }
}

impl FromIterator<HopRecord> for TraceSnapshot {
    fn from_iter<I: IntoIterator<Item = HopRecord>>(iter: I) -> Self {
        let mut snapshot = TraceSnapshot::new();
        for record in iter {
            snapshot.insert(record);
        }
        snapshot
    }
}

impl<'a> IntoIterator for &'a TraceSnapshot {
    type Item = &'a HopRecord;
    type IntoIter = std::collections::btree_map::Values<'a, u32, HopRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Serialize, Deserialize)]
struct StoredHop {
    ip: String,
    #[serde(with = "latency")]
    average_ping: f64,
}

impl Serialize for TraceSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.hops.values().map(|record| {
            (
                record.hop_number.to_string(),
                StoredHop {
                    ip: record.address.clone(),
                    average_ping: record.average_latency_ms,
                },
            )
        }))
    }
}

impl<'de> Deserialize<'de> for TraceSnapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let stored: BTreeMap<String, StoredHop> = BTreeMap::deserialize(deserializer)?;
        let mut snapshot = TraceSnapshot::new();
        for (key, hop) in stored {
            let hop_number: u32 = key
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("invalid hop number key: {key}")))?;
            snapshot.insert(HopRecord::new(hop_number, hop.ip, hop.average_ping));
        }
        Ok(snapshot)
    }
}

/// Difference between two snapshots worth reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeEvent {
    /// Hop present now but absent from the previous snapshot.
    NewHop {
        hop_number: u32,
        address: String,
        #[serde(with = "latency")]
        average_latency_ms: f64,
    },
    /// Hop present in both snapshots with a different address.
    AddressChanged {
        hop_number: u32,
        old_address: String,
        new_address: String,
        #[serde(with = "latency")]
        average_latency_ms: f64,
    },
}

impl ChangeEvent {
    pub fn hop_number(&self) -> u32 {
        match self {
            ChangeEvent::NewHop { hop_number, .. }
            | ChangeEvent::AddressChanged { hop_number, .. } => *hop_number,
        }
    }

    pub fn average_latency_ms(&self) -> f64 {
        match self {
            ChangeEvent::NewHop {
                average_latency_ms, ..
            }
            | ChangeEvent::AddressChanged {
                average_latency_ms, ..
            } => *average_latency_ms,
        }
    }
}

mod latency {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
