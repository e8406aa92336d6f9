//! Error types for sim-env.

use thiserror::Error;

/// Errors raised by the host capability object.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host refused to resize the viewport.
    #[error("resize to {width}x{height} refused by host")]
    ResizeRefused {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },

    /// Persistent storage is unavailable.
    #[error("storage unavailable while accessing {key:?}")]
    StorageUnavailable {
        /// Key being read or written.
        key: String,
    },
}

/// Errors returned by a [`Fetcher`](crate::Fetcher) or the network simulator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    /// The simulated network is offline.
    #[error("network offline: {url}")]
    Offline {
        /// Requested URL.
        url: String,
    },

    /// The request was dropped by simulated packet loss.
    #[error("request dropped: {url}")]
    PacketLoss {
        /// Requested URL.
        url: String,
    },

    /// The origin has nothing at this URL.
    #[error("not found: {url}")]
    NotFound {
        /// Requested URL.
        url: String,
    },

    /// No network profile has this id.
    #[error("unknown network profile: {0}")]
    UnknownProfile(String),
}

/// Errors returned by the device simulator and manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    /// No device preset has this id.
    #[error("unknown device preset: {0}")]
    UnknownPreset(String),

    /// The original viewport could not be restored.
    #[error("failed to restore original viewport: {0}")]
    RestoreRefused(#[source] HostError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = HostError::ResizeRefused {
            width: 375,
            height: 667,
        };
        assert_eq!(err.to_string(), "resize to 375x667 refused by host");

        let err = NetworkError::Offline {
            url: "/data/a.json".into(),
        };
        assert_eq!(err.to_string(), "network offline: /data/a.json");

        let err = DeviceError::RestoreRefused(HostError::ResizeRefused {
            width: 1280,
            height: 800,
        });
        assert!(err.to_string().contains("1280x800"));
    }
}
