mod config;
mod exit;
mod logging;
mod output;
mod shell;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use rapidha_device::RapidHaDevice;
use rapidha_transport::SerialPort;
use tracing::info_span;

use crate::config::RunConfig;
use crate::exit::{device_error, transport_error, CliError, CliResult, INTERNAL};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;
use crate::shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "rapidha", version, about = "Interactive shell for a RapidHA ZigBee module")]
struct Cli {
    /// Serial device the module is attached to (e.g. /dev/ttyUSB0).
    device: PathBuf,

    /// Serial line speed.
    #[arg(long, default_value_t = SerialPort::DEFAULT_BAUD_RATE)]
    baud: u32,

    /// How long `add_device` keeps the network open (e.g. 60s).
    #[arg(long, value_name = "DURATION", default_value = "60s")]
    join_window: String,

    /// Timeout of blocking requests such as `info` (e.g. 5s, 500ms).
    #[arg(long, value_name = "DURATION", default_value = "5s")]
    sync_timeout: String,

    /// Output format for received packets.
    #[arg(long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn run(cli: Cli) -> CliResult<i32> {
    let config = RunConfig::new(cli.baud, &cli.join_window, &cli.sync_timeout)?;
    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);

    let port = SerialPort::open(&cli.device, &config.serial)
        .map_err(|err| transport_error("open failed", err))?;
    let span = info_span!("rapidha", device = %cli.device.display());
    let device = RapidHaDevice::new(Arc::new(port), config.device, span)
        .map_err(|err| device_error("device setup failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let shell = Shell::new(device.clone(), format, running);
    shell.register_printall();
    device.setup_configuration();
    device
        .start_reader()
        .map_err(|err| device_error("reader failed to start", err))?;

    let result = shell.run();
    device.halt().map_err(|err| device_error("halt failed", err))?;
    result
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
