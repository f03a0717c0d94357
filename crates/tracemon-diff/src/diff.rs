use std::collections::btree_map;
use tracemon_model::{ChangeEvent, HopRecord, TraceSnapshot};

/// Lazily compares `current` against `previous`, in `current`'s hop order.
///
/// A hop missing from `previous` is a [`ChangeEvent::NewHop`]; a hop whose
/// address differs is a [`ChangeEvent::AddressChanged`]. Latency-only changes
/// and hops that disappeared produce nothing. The iterator is `Clone`, so the
/// same comparison can be walked again.
pub fn diff<'a>(previous: &'a TraceSnapshot, current: &'a TraceSnapshot) -> Changes<'a> {
    Changes {
        previous,
        current: current.iter(),
    }
}

#[derive(Debug, Clone)]
pub struct Changes<'a> {
    previous: &'a TraceSnapshot,
    current: btree_map::Values<'a, u32, HopRecord>,
}

impl Iterator for Changes<'_> {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<ChangeEvent> {
        for hop in self.current.by_ref() {
            if let Some(event) = compare(self.previous.get(hop.hop_number), hop) {
                return Some(event);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.current.size_hint().1)
    }
}

impl std::iter::FusedIterator for Changes<'_> {}

fn compare(previous: Option<&HopRecord>, current: &HopRecord) -> Option<ChangeEvent> {
    match previous {
        None => Some(ChangeEvent::NewHop {
            hop_number: current.hop_number,
            address: current.address.clone(),
            average_latency_ms: current.average_latency_ms,
        }),
        Some(prev) if prev.address != current.address => Some(ChangeEvent::AddressChanged {
            hop_number: current.hop_number,
            old_address: prev.address.clone(),
            new_address: current.address.clone(),
            average_latency_ms: current.average_latency_ms,
        }),
        Some(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_hint_is_bounded_by_current() {
        let current: TraceSnapshot = [HopRecord::new(1, "10.0.0.1", 1.0)].into_iter().collect();
        let previous = TraceSnapshot::new();
        assert_eq!(diff(&previous, &current).size_hint(), (0, Some(1)));
    }

    #[test]
    fn unknown_to_known_is_an_address_change() {
        let previous: TraceSnapshot = [HopRecord::new(3, "unknown", f64::INFINITY)]
            .into_iter()
            .collect();
        let current: TraceSnapshot = [HopRecord::new(3, "10.0.0.3", 4.0)].into_iter().collect();

        let events: Vec<_> = diff(&previous, &current).collect();
        assert_eq!(
            events,
            vec![ChangeEvent::AddressChanged {
                hop_number: 3,
                old_address: "unknown".to_string(),
                new_address: "10.0.0.3".to_string(),
                average_latency_ms: 4.0,
            }]
        );
    }
}
