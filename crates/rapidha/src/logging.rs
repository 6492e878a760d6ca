use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Environment variable holding filter directives that replace `--log-level`.
pub const LOG_ENV: &str = "RAPIDHA_LOG";

/// Crates whose events follow `--log-level`; everything else logs at warn.
const DRIVER_TARGETS: [&str; 5] = [
    "rapidha",
    "rapidha_device",
    "rapidha_frame",
    "rapidha_schema",
    "rapidha_transport",
];

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Filter directives for `level`: driver crates at `level`, dependencies at warn.
pub fn default_directives(level: LogLevel) -> String {
    let mut directives = String::from("warn");
    for target in DRIVER_TARGETS {
        directives.push_str(&format!(",{target}={}", level.as_str()));
    }
    directives
}

/// `RAPIDHA_LOG` when set and valid, otherwise [`default_directives`].
fn filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Install the stderr subscriber. Thread names are kept so reader-thread
/// events can be told apart from shell events.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter(level))
        .with_ansi(false)
        .with_target(false)
        .with_thread_names(true);

    match format {
        LogFormat::Text => {
            let _ = builder.try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_crates_follow_level() {
        let directives = default_directives(LogLevel::Debug);
        assert!(directives.starts_with("warn,"));
        for target in DRIVER_TARGETS {
            assert!(directives.contains(&format!("{target}=debug")), "{directives}");
        }
    }

    #[test]
    fn directives_parse() {
        for level in [LogLevel::Error, LogLevel::Info, LogLevel::Trace] {
            EnvFilter::try_new(default_directives(level)).expect("directives should parse");
        }
    }
}
