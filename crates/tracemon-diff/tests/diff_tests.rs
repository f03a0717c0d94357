use tracemon_diff::diff;
use tracemon_model::{ChangeEvent, HopRecord, TraceSnapshot};

fn snapshot(hops: &[(u32, &str, f64)]) -> TraceSnapshot {
    hops.iter()
        .map(|(hop, ip, ping)| HopRecord::new(*hop, *ip, *ping))
        .collect()
}

#[test]
fn identical_snapshots_produce_no_events() {
    let s = snapshot(&[
        (1, "10.0.0.1", 1.0),
        (2, "unknown", f64::INFINITY),
        (3, "10.0.0.3", 3.0),
    ]);
    assert_eq!(diff(&s, &s).count(), 0);
    assert_eq!(diff(&TraceSnapshot::new(), &TraceSnapshot::new()).count(), 0);
}

#[test]
fn empty_previous_reports_every_hop_in_order() {
    let current = snapshot(&[(1, "10.0.0.1", 1.0), (2, "10.0.0.2", 2.0)]);
    let events: Vec<ChangeEvent> = diff(&TraceSnapshot::new(), &current).collect();

    assert_eq!(
        events,
        vec![
            ChangeEvent::NewHop {
                hop_number: 1,
                address: "10.0.0.1".to_string(),
                average_latency_ms: 1.0,
            },
            ChangeEvent::NewHop {
                hop_number: 2,
                address: "10.0.0.2".to_string(),
                average_latency_ms: 2.0,
            },
        ]
    );
}

#[test]
fn address_change_reports_old_and_new() {
    let previous = snapshot(&[(1, "10.0.0.1", 1.0)]);
    let current = snapshot(&[(1, "10.0.0.2", 4.5)]);

    let events: Vec<ChangeEvent> = diff(&previous, &current).collect();
    assert_eq!(
        events,
        vec![ChangeEvent::AddressChanged {
            hop_number: 1,
            old_address: "10.0.0.1".to_string(),
            new_address: "10.0.0.2".to_string(),
            average_latency_ms: 4.5,
        }]
    );
}

#[test]
fn latency_only_change_is_silent() {
    let previous = snapshot(&[(1, "10.0.0.1", 1.0), (2, "10.0.0.2", 2.0)]);
    let current = snapshot(&[(1, "10.0.0.1", 100.0), (2, "10.0.0.2", f64::INFINITY)]);
    assert_eq!(diff(&previous, &current).count(), 0);
}

#[test]
fn removed_hops_are_silent() {
    let previous = snapshot(&[(1, "10.0.0.1", 1.0), (2, "10.0.0.2", 2.0), (3, "10.0.0.3", 3.0)]);
    let current = snapshot(&[(1, "10.0.0.1", 1.0)]);
    assert_eq!(diff(&previous, &current).count(), 0);
}

#[test]
fn mixed_changes_follow_current_order() {
    let previous = snapshot(&[(1, "10.0.0.1", 1.0), (3, "10.0.0.3", 3.0)]);
    let current = snapshot(&[
        (1, "10.0.0.1", 1.0),
        (2, "10.0.0.2", 2.0),
        (3, "10.0.9.3", 3.0),
        (4, "10.0.0.4", 4.0),
    ]);

    let hops: Vec<u32> = diff(&previous, &current).map(|e| e.hop_number()).collect();
    assert_eq!(hops, vec![2, 3, 4]);
}

#[test]
fn changes_can_be_restarted() {
    let previous = snapshot(&[(1, "10.0.0.1", 1.0)]);
    let current = snapshot(&[(1, "10.0.0.2", 1.0), (2, "10.0.0.3", 1.0)]);

    let changes = diff(&previous, &current);
    let first: Vec<ChangeEvent> = changes.clone().collect();
    let second: Vec<ChangeEvent> = changes.collect();
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
}
