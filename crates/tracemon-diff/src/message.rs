use tracemon_model::ChangeEvent;

/// Renders a latency with two decimals. Infinity (every probe timed out)
/// renders as `inf`.
pub fn format_latency(value: f64) -> String {
    if value.is_infinite() && value > 0.0 {
        "inf".to_string()
    } else if value.is_nan() {
        "nan".to_string()
    } else {
        format!("{value:.2}")
    }
}

/// Human-readable notification text for a change.
pub fn format_event(event: &ChangeEvent) -> String {
    match event {
        ChangeEvent::NewHop {
            hop_number,
            address,
            average_latency_ms,
        } => format!(
            "New hop detected: Hop {hop_number}, IP {address}, Ping {} ms",
            format_latency(*average_latency_ms)
        ),
        ChangeEvent::AddressChanged {
            hop_number,
            old_address,
            new_address,
            average_latency_ms,
        } => format!(
            "Hop {hop_number} IP change from {old_address} to {new_address}, New Ping: {} ms",
            format_latency(*average_latency_ms)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latency_has_two_decimals() {
        assert_eq!(format_latency(1.2895), "1.29");
        assert_eq!(format_latency(3.0), "3.00");
        assert_eq!(format_latency(0.0), "0.00");
        assert_eq!(format_latency(f64::INFINITY), "inf");
    }

    #[test]
    fn new_hop_message() {
        let event = ChangeEvent::NewHop {
            hop_number: 1,
            address: "192.168.1.1".to_string(),
            average_latency_ms: 1.2895,
        };
        assert_eq!(
            format_event(&event),
            "New hop detected: Hop 1, IP 192.168.1.1, Ping 1.29 ms"
        );
    }

    #[test]
    fn address_change_message() {
        let event = ChangeEvent::AddressChanged {
            hop_number: 4,
            old_address: "10.0.0.1".to_string(),
            new_address: "10.0.0.2".to_string(),
            average_latency_ms: 12.0,
        };
        assert_eq!(
            format_event(&event),
            "Hop 4 IP change from 10.0.0.1 to 10.0.0.2, New Ping: 12.00 ms"
        );
    }

    #[test]
    fn timed_out_hop_message() {
        let event = ChangeEvent::NewHop {
            hop_number: 3,
            address: "unknown".to_string(),
            average_latency_ms: f64::INFINITY,
        };
        assert_eq!(
            format_event(&event),
            "New hop detected: Hop 3, IP unknown, Ping inf ms"
        );
    }
}
