use std::time::Duration;

use rapidha_frame::FrameConfig;

/// Timing and naming knobs of a [`RapidHaDevice`](crate::RapidHaDevice).
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// How long a join window stays open before the join handler is dropped.
    pub join_window: Duration,
    /// Default timeout of synchronous requests.
    pub sync_timeout: Duration,
    /// Poll interval of synchronous requests while waiting for a response.
    pub sync_poll_interval: Duration,
    /// Reader loop framing settings (idle backoff).
    pub frame: FrameConfig,
    /// Name of the reader thread.
    pub reader_thread_name: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            join_window: Duration::from_secs(60),
            sync_timeout: Duration::from_secs(5),
            sync_poll_interval: Duration::from_millis(50),
            frame: FrameConfig::default(),
            reader_thread_name: "rapidha-reader".to_string(),
        }
    }
}
