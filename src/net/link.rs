// SenseHub - Wi-Fi Link Supervision
//
// The association is owned by one background loop. A failed join only costs
// that attempt; the loop tries again on the next check, starting with the very
// first one at boot.

use std::thread;
use std::time::Duration;

use crate::error::NetError;

/// A station interface that can report and (re)establish its association.
pub trait Station {
    fn is_connected(&mut self) -> bool;

    /// Associate and wait until the interface has an address.
    fn join(&mut self) -> Result<(), NetError>;
}

/// Keep the station associated. Checks immediately, then every `interval`.
/// `cycles` bounds the number of checks for tests; the firmware runs forever.
pub fn supervise<S: Station>(station: &mut S, interval: Duration, cycles: Option<usize>) {
    let mut remaining = cycles;
    while remaining != Some(0) {
        if !station.is_connected() {
            log::info!("Connecting to Wi-Fi...");
            match station.join() {
                Ok(()) => log::info!("Wi-Fi connected"),
                Err(e) => log::warn!("Wi-Fi connection failed, retrying: {}", e),
            }
        }

        remaining = remaining.map(|n| n - 1);
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fails the first `failures` joins, then stays associated.
    struct FlakyStation {
        failures: usize,
        joins: usize,
        connected: bool,
    }

    impl FlakyStation {
        fn new(failures: usize) -> Self {
            Self { failures, joins: 0, connected: false }
        }
    }

    impl Station for FlakyStation {
        fn is_connected(&mut self) -> bool {
            self.connected
        }

        fn join(&mut self) -> Result<(), NetError> {
            self.joins += 1;
            if self.joins <= self.failures {
                return Err(NetError::Transport("no AP found".into()));
            }
            self.connected = true;
            Ok(())
        }
    }

    #[test]
    fn failed_first_join_is_retried() {
        let mut station = FlakyStation::new(2);
        supervise(&mut station, Duration::ZERO, Some(5));

        assert!(station.connected);
        assert_eq!(station.joins, 3);
    }

    #[test]
    fn unreachable_network_keeps_retrying() {
        let mut station = FlakyStation::new(usize::MAX);
        supervise(&mut station, Duration::ZERO, Some(4));

        assert!(!station.connected);
        assert_eq!(station.joins, 4);
    }

    #[test]
    fn dropped_association_is_rejoined() {
        let mut station = FlakyStation::new(0);
        supervise(&mut station, Duration::ZERO, Some(2));
        assert_eq!(station.joins, 1);

        station.connected = false;
        supervise(&mut station, Duration::ZERO, Some(2));
        assert_eq!(station.joins, 2);
    }
}
