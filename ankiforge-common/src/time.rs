//! Timestamp utilities

use chrono::{Local, SecondsFormat};

/// Current local time as RFC 3339 with microseconds and UTC offset
///
/// Used for completion records written to the processed-word cache.
pub fn now_local_rfc3339() -> String {
    Local::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::time::Duration;

    #[test]
    fn test_local_rfc3339_round_trips_through_chrono() {
        let stamp = now_local_rfc3339();
        let parsed = DateTime::parse_from_rfc3339(&stamp);
        assert!(parsed.is_ok(), "not RFC 3339: {}", stamp);
    }

    #[tokio::test]
    async fn test_successive_stamps_advance() {
        let first = DateTime::parse_from_rfc3339(&now_local_rfc3339()).unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = DateTime::parse_from_rfc3339(&now_local_rfc3339()).unwrap();
        assert!(second > first);
    }
}
