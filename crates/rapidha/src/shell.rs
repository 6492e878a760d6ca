use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rapidha_device::RapidHaDevice;
use rapidha_schema::{CommandArgs, DecodedPacket, Registry};
use tracing::{debug, warn};

use crate::exit::{device_error, io_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_packet, render_packet, render_state, OutputFormat};

/// Name of the catch-all handler printing every packet.
pub const PRINT_ALL: &str = "printall";

const LINE_POLL: Duration = Duration::from_millis(100);

/// One line of shell input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Exit,
    AddDevice,
    Reconfigure,
    Network,
    State,
    LeaveHandler,
    Info,
    /// A catalog command, sent with its default field values.
    Send(String),
    Empty,
    Unknown(String),
}

impl ShellCommand {
    pub fn parse(line: &str, registry: &Registry) -> Self {
        let line = line.trim();
        match line {
            "" => Self::Empty,
            "exit" | "quit" => Self::Exit,
            "add_device" => Self::AddDevice,
            "reconfigure" => Self::Reconfigure,
            "network" => Self::Network,
            "state" => Self::State,
            "leave_handler" => Self::LeaveHandler,
            "info" => Self::Info,
            name if registry.command(name).is_some() => Self::Send(name.to_string()),
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// Whether the shell keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Line-oriented front end over a running device.
pub struct Shell {
    device: RapidHaDevice,
    format: OutputFormat,
    running: Arc<AtomicBool>,
}

impl Shell {
    pub fn new(device: RapidHaDevice, format: OutputFormat, running: Arc<AtomicBool>) -> Self {
        Self {
            device,
            format,
            running,
        }
    }

    /// Register the catch-all handler that prints every packet.
    pub fn register_printall(&self) {
        let format = self.format;
        self.device.dispatcher().register(
            PRINT_ALL,
            move |name: &str, packet: &DecodedPacket| print_packet(name, packet, format),
            |_: &DecodedPacket| true,
        );
    }

    /// Read stdin until `exit`, end of input or the running flag clears.
    pub fn run(&self) -> CliResult<i32> {
        let lines = spawn_stdin_reader()?;
        let stdout = io::stdout();

        while self.running.load(Ordering::SeqCst) {
            let line = match lines.recv_timeout(LINE_POLL) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("stdin closed");
                    break;
                }
            };

            let mut out = stdout.lock();
            match self.execute(&line, &mut out) {
                Ok(Flow::Exit) => break,
                Ok(Flow::Continue) => {}
                Err(err) => {
                    warn!(command = line.trim(), error = %err, "shell command failed");
                    eprintln!("error: {err}");
                }
            }
            let _ = out.flush();
        }

        Ok(SUCCESS)
    }

    /// Run one line of input, writing any reply to `out`.
    pub fn execute(&self, line: &str, out: &mut impl Write) -> CliResult<Flow> {
        let command = ShellCommand::parse(line, self.device.registry());
        let format = self.format;

        match command {
            ShellCommand::Exit => return Ok(Flow::Exit),
            ShellCommand::Empty => {}
            ShellCommand::AddDevice => {
                self.device
                    .add_device(move |name: &str, packet: &DecodedPacket| {
                        print_packet(name, packet, format)
                    })
                    .map_err(|err| device_error("add_device failed", err))?;
                write_line(out, "join window open")?;
            }
            ShellCommand::LeaveHandler => {
                self.device
                    .leave_network_handler(move |name: &str, packet: &DecodedPacket| {
                        print_packet(name, packet, format)
                    });
                write_line(out, "leave handler registered")?;
            }
            ShellCommand::Reconfigure => {
                self.device
                    .reconfigure()
                    .map_err(|err| device_error("reconfigure failed", err))?;
                // Reconfiguring drops every registration.
                self.register_printall();
                write_line(out, "reconfiguring")?;
            }
            ShellCommand::Network => {
                let network = self.device.network_state();
                let reply = match (self.device.network(), network.as_ref()) {
                    (true, Some(packet)) => render_packet("network", packet, format),
                    (true, None) => "network up".to_string(),
                    (false, _) => "network down".to_string(),
                };
                write_line(out, &reply)?;
            }
            ShellCommand::State => {
                let network = self.device.network_state();
                write_line(out, &render_state(self.device.state(), network.as_ref(), format))?;
            }
            ShellCommand::Info => {
                let packet = self
                    .device
                    .sync()
                    .module_info()
                    .map_err(|err| device_error("module_info failed", err))?;
                write_line(out, &render_packet("info", &packet, format))?;
            }
            ShellCommand::Send(name) => {
                let sent = self
                    .device
                    .send_command(&name, &CommandArgs::new())
                    .map_err(|err| device_error(&format!("{name} failed"), err))?;
                debug!(command = sent.name, sequence = sent.sequence, "sent from shell");
            }
            ShellCommand::Unknown(line) => write_line(out, &format!("Unknown command: {line}"))?,
        }

        Ok(Flow::Continue)
    }
}

fn write_line(out: &mut impl Write, line: &str) -> CliResult<()> {
    writeln!(out, "{line}").map_err(|err| io_error("write failed", err))
}

fn spawn_stdin_reader() -> CliResult<Receiver<String>> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("rapidha-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .map_err(|err| CliError::new(INTERNAL, format!("stdin reader failed to start: {err}")))?;
    Ok(rx)
}
