//! Connection and record counters

/// Rolling delivery counters
///
/// `records_total` only ever grows; a connection or authentication failure
/// clears `connected` and `records_since_reconnect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryCounters {
    /// Whether the last connection attempt succeeded
    pub connected: bool,

    /// Records written since the last connection failure
    pub records_since_reconnect: u64,

    /// Records written since the process started
    pub records_total: u64,
}

impl DeliveryCounters {
    /// A connection or authentication attempt failed
    pub fn mark_failed(&mut self) {
        self.connected = false;
        self.records_since_reconnect = 0;
    }

    /// A connection attempt succeeded without writing a record
    pub fn mark_connected(&mut self) {
        self.connected = true;
    }

    /// A record was handed to the datastore
    pub fn record_delivered(&mut self) {
        self.connected = true;
        self.records_since_reconnect += 1;
        self.records_total += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_keeps_total() {
        let mut counters = DeliveryCounters::default();
        counters.record_delivered();
        counters.record_delivered();
        counters.mark_failed();

        assert!(!counters.connected);
        assert_eq!(counters.records_since_reconnect, 0);
        assert_eq!(counters.records_total, 2);

        counters.record_delivered();
        assert!(counters.connected);
        assert_eq!(counters.records_since_reconnect, 1);
        assert_eq!(counters.records_total, 3);
    }

    #[test]
    fn test_mark_connected_leaves_records() {
        let mut counters = DeliveryCounters::default();
        counters.record_delivered();
        counters.mark_connected();
        assert_eq!(counters.records_since_reconnect, 1);
        assert_eq!(counters.records_total, 1);
    }
}
