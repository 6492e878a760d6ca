use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rapidha_device::DeviceState;
use rapidha_schema::DecodedPacket;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct PacketOutput<'a> {
    handler: &'a str,
    packet: &'a DecodedPacket,
    timestamp: String,
}

#[derive(Serialize)]
struct StateOutput<'a> {
    state: DeviceState,
    network_up: bool,
    network: Option<&'a DecodedPacket>,
}

/// Render one received packet on stdout.
pub fn print_packet(handler: &str, packet: &DecodedPacket, format: OutputFormat) {
    println!("{}", render_packet(handler, packet, format));
}

pub fn render_packet(handler: &str, packet: &DecodedPacket, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            let out = PacketOutput {
                handler,
                packet,
                timestamp: now_unix_seconds(),
            };
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    format!("{} [{}]", packet.id(), packet.frame_id()),
                    handler.to_string(),
                ]);
            for (name, value) in packet.fields() {
                table.add_row(vec![name.to_string(), hex::encode(value)]);
            }
            table.to_string()
        }
        OutputFormat::Pretty => format!("{handler}: {packet}"),
    }
}

/// Render the controller state and the last network status seen.
pub fn render_state(
    state: DeviceState,
    network: Option<&DecodedPacket>,
    format: OutputFormat,
) -> String {
    let network_up = state == DeviceState::NetworkUp;
    match format {
        OutputFormat::Json => {
            let out = StateOutput {
                state,
                network_up,
                network,
            };
            serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["state".to_string(), state.to_string()])
                .add_row(vec!["network_up".to_string(), network_up.to_string()]);
            if let Some(packet) = network {
                for (name, value) in packet.fields() {
                    table.add_row(vec![name.to_string(), hex::encode(value)]);
                }
            }
            table.to_string()
        }
        OutputFormat::Pretty => match network {
            Some(packet) => format!("state={state} network_up={network_up} {packet}"),
            None => format!("state={state} network_up={network_up}"),
        },
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
