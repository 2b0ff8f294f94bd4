// SenseHub - Error Types

use thiserror::Error;

/// Failure of a single bus transaction, as reported by the transport.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("transaction timed out")]
    Timeout,
    #[error("device did not acknowledge")]
    Nack,
}

/// Device-level failure with enough context to log which step went wrong.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SensorError {
    #[error("{device}: {op} timed out")]
    TransportTimeout {
        device: &'static str,
        op: &'static str,
    },
    #[error("{device}: {op} not acknowledged")]
    TransportNack {
        device: &'static str,
        op: &'static str,
    },
    /// The configuration register could not be read, so no conversion is possible.
    #[error("{device}: configuration register unreadable ({source})")]
    ConfigurationRead {
        device: &'static str,
        #[source]
        source: BusError,
    },
    #[error("I2C bus arbiter not initialized")]
    MutexUninitialized,
}

impl SensorError {
    pub fn transport(device: &'static str, op: &'static str, error: BusError) -> Self {
        match error {
            BusError::Timeout => Self::TransportTimeout { device, op },
            BusError::Nack => Self::TransportNack { device, op },
        }
    }

    /// `true` for failures that only cost the current cycle.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::MutexUninitialized)
    }
}

/// Failure of an upload to the collection server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("HTTP transport error: {0}")]
    Transport(String),
    #[error("payload encoding failed: {0}")]
    Encode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_keeps_bus_failure_kind() {
        assert_eq!(
            SensorError::transport("th_sensor", "trigger", BusError::Nack),
            SensorError::TransportNack { device: "th_sensor", op: "trigger" }
        );
        assert_eq!(
            SensorError::transport("accelerometer", "OUT_X_L", BusError::Timeout),
            SensorError::TransportTimeout { device: "accelerometer", op: "OUT_X_L" }
        );
    }

    #[test]
    fn only_missing_arbiter_is_fatal() {
        assert!(!SensorError::MutexUninitialized.is_transient());
        assert!(SensorError::ConfigurationRead {
            device: "accelerometer",
            source: BusError::Timeout,
        }
        .is_transient());
    }

    #[test]
    fn messages_name_device_and_step() {
        let err = SensorError::transport("accelerometer", "CLICK_SRC", BusError::Nack);
        assert_eq!(err.to_string(), "accelerometer: CLICK_SRC not acknowledged");
    }
}
