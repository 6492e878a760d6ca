use std::time::Duration;

use rapidha_device::DeviceConfig;
use rapidha_transport::SerialConfig;

use crate::exit::{CliError, CliResult, USAGE};

/// Serial and device settings assembled from command-line flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub serial: SerialConfig,
    pub device: DeviceConfig,
}

impl RunConfig {
    pub fn new(baud_rate: u32, join_window: &str, sync_timeout: &str) -> CliResult<Self> {
        let serial = SerialConfig {
            baud_rate,
            ..SerialConfig::default()
        };
        let device = DeviceConfig {
            join_window: parse_duration(join_window)?,
            sync_timeout: parse_duration(sync_timeout)?,
            ..DeviceConfig::default()
        };
        Ok(Self { serial, device })
    }
}

/// Parse `500ms`, `5s` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
