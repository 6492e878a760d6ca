//! Bring-up handshake of a RapidHA module.
//!
//! [`next_step`] is a pure function of the current state, the received packet
//! and the last sequence number sent. The device controller applies its
//! result: it sends the command (if any) and moves to the next state.

use std::fmt;

use bytes::Bytes;
use rapidha_schema::constants::{
    attribute_type, cluster_id, cluster_type, configuration_state, device_id, device_type,
    network_status, running_state, thermostat_attribute, PROFILE_ID,
};
use rapidha_schema::{CommandArgs, DecodedPacket};
use serde::Serialize;

/// Channels 11 to 25 (mask 0x03FFF800, little-endian).
pub const FORM_NETWORK_CHANNEL_MASK: [u8; 4] = [0x00, 0xF8, 0xFF, 0x03];

/// Endpoint the host registers on the module.
pub const HOST_ENDPOINT: u8 = 0x01;

/// Bring-up state of a device controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceState {
    WaitingStartupSync,
    StartupReset,
    SerialAck,
    /// Reachable only by hosts that hold before acknowledging readiness.
    HostStartupReady,
    HostStartupReadyAck,
    ConfigureDeviceType,
    ClearEndpoints,
    /// Reachable only by hosts that register endpoints in a separate step.
    AddEndpointsAndClusters,
    AddAttributes,
    AddAttributesAck,
    StartupSyncComplete,
    NetworkDown,
    NetworkUp,
}

impl DeviceState {
    /// Every state, in handshake order.
    pub const ALL: [Self; 13] = [
        Self::WaitingStartupSync,
        Self::StartupReset,
        Self::SerialAck,
        Self::HostStartupReady,
        Self::HostStartupReadyAck,
        Self::ConfigureDeviceType,
        Self::ClearEndpoints,
        Self::AddEndpointsAndClusters,
        Self::AddAttributes,
        Self::AddAttributesAck,
        Self::StartupSyncComplete,
        Self::NetworkDown,
        Self::NetworkUp,
    ];

    /// States in which `network_status_response` packets are kept as the
    /// current network state.
    pub fn tracks_network_status(self) -> bool {
        matches!(self, Self::StartupSyncComplete | Self::NetworkDown)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WaitingStartupSync => "waiting_startup_sync",
            Self::StartupReset => "startup_reset",
            Self::SerialAck => "serial_ack",
            Self::HostStartupReady => "host_startup_ready",
            Self::HostStartupReadyAck => "host_startup_ready_ack",
            Self::ConfigureDeviceType => "configure_device_type",
            Self::ClearEndpoints => "clear_endpoints",
            Self::AddEndpointsAndClusters => "add_endpoints_and_clusters",
            Self::AddAttributes => "add_attributes",
            Self::AddAttributesAck => "add_attributes_ack",
            Self::StartupSyncComplete => "startup_sync_complete",
            Self::NetworkDown => "network_down",
            Self::NetworkUp => "network_up",
        };
        f.write_str(name)
    }
}

/// Command issued by a bring-up step, with its fixed field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupCommand {
    Reset,
    SerialAck,
    HostStartupReady,
    StartupSync,
    DeviceTypeWrite,
    ClearEndpointConfig,
    AddEndpoint,
    AddAttributeToCluster,
    FormNetwork,
}

impl StartupCommand {
    /// Catalog name of the command.
    pub fn name(self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::SerialAck => "serial_ack",
            Self::HostStartupReady => "host_startup_ready",
            Self::StartupSync => "startup_sync",
            Self::DeviceTypeWrite => "device_type_write",
            Self::ClearEndpointConfig => "clear_endpoint_config",
            Self::AddEndpoint => "add_endpoint",
            Self::AddAttributeToCluster => "add_attribute_to_cluster",
            Self::FormNetwork => "form_network",
        }
    }

    pub fn args(self) -> CommandArgs {
        match self {
            Self::DeviceTypeWrite => CommandArgs::new()
                .with("type", vec![device_type::FFD])
                .with("sleepy", vec![device_type::NON_SLEEPY]),
            Self::AddEndpoint => CommandArgs::new()
                .with("endpoint", vec![HOST_ENDPOINT])
                .with("profile_id", PROFILE_ID.to_vec())
                .with("device_id", device_id::COMBINED_INTERFACE.to_vec())
                .with("device_version", vec![0x01])
                .with("server_clusters", vec![0x03])
                .with("cluster_data", endpoint_clusters()),
            Self::AddAttributeToCluster => {
                let mut attributes = thermostat_attribute::OCCUPIED_COOLING_SET_POINT.to_vec();
                attributes.extend_from_slice(&[attribute_type::INT16, 0x03]);
                CommandArgs::new()
                    .with("endpoint", vec![HOST_ENDPOINT])
                    .with("cluster_id", cluster_id::THERMOSTAT.to_vec())
                    .with("is_server", vec![cluster_type::CLIENT])
                    .with("attribute_count", vec![0x01])
                    .with("attributes", attributes)
            }
            Self::FormNetwork => CommandArgs::new()
                .with("channel_mask", FORM_NETWORK_CHANNEL_MASK.to_vec())
                .with("auto_options", vec![0x03])
                .with("short_pan", vec![0x00, 0x00])
                .with("expanded_pan", vec![0x00; 8]),
            Self::Reset
            | Self::SerialAck
            | Self::HostStartupReady
            | Self::StartupSync
            | Self::ClearEndpointConfig => CommandArgs::new(),
        }
    }
}

/// Server clusters basic, identify and OTA; then client clusters basic,
/// identify and thermostat.
fn endpoint_clusters() -> Bytes {
    let mut data = Vec::with_capacity(13);
    for cluster in [cluster_id::BASIC, cluster_id::IDENTIFY, cluster_id::OTA_UPGRADE] {
        data.extend_from_slice(&cluster);
    }
    data.push(0x03);
    for cluster in [cluster_id::BASIC, cluster_id::IDENTIFY, cluster_id::THERMOSTAT] {
        data.extend_from_slice(&cluster);
    }
    Bytes::from(data)
}

/// Result of one bring-up transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub send: Option<StartupCommand>,
    pub next: DeviceState,
}

impl Step {
    fn send(command: StartupCommand, next: DeviceState) -> Option<Self> {
        Some(Self {
            send: Some(command),
            next,
        })
    }

    fn enter(next: DeviceState) -> Option<Self> {
        Some(Self { send: None, next })
    }
}

/// Compute the transition for `packet` in `state`.
///
/// `last_sequence` is the frame id of the most recent command sent; a packet
/// echoing it acknowledges that command. Returns `None` when the packet does
/// not move the handshake forward.
pub fn next_step(state: DeviceState, packet: &DecodedPacket, last_sequence: u8) -> Option<Step> {
    use DeviceState as S;
    use StartupCommand as C;

    let echo = packet.frame_id() == last_sequence;

    match state {
        S::WaitingStartupSync if packet.is("startup_sync") => Step::send(C::Reset, S::StartupReset),
        S::StartupReset if packet.is("startup_sync") => Step::send(C::SerialAck, S::SerialAck),
        S::SerialAck if echo => Step::send(C::HostStartupReady, S::HostStartupReadyAck),
        S::HostStartupReady | S::HostStartupReadyAck if packet.is("startup_sync") => {
            if packet.get_u8("running_state")? != running_state::STARTING {
                return Step::send(C::StartupSync, S::StartupSyncComplete);
            }
            match packet.get_u8("config_state")? {
                configuration_state::CONFIGURED => {
                    Step::send(C::StartupSync, S::StartupSyncComplete)
                }
                configuration_state::NEEDS_ENDPOINT_CONFIG => {
                    Step::send(C::ClearEndpointConfig, S::ClearEndpoints)
                }
                _ => Step::send(C::DeviceTypeWrite, S::ConfigureDeviceType),
            }
        }
        S::ConfigureDeviceType if echo => Step::send(C::ClearEndpointConfig, S::ClearEndpoints),
        S::ClearEndpoints | S::AddEndpointsAndClusters if echo => {
            Step::send(C::AddEndpoint, S::AddAttributes)
        }
        S::AddAttributes if echo => Step::send(C::AddAttributeToCluster, S::AddAttributesAck),
        S::AddAttributesAck if packet.is("status_response") => {
            Step::send(C::StartupSync, S::StartupSyncComplete)
        }
        S::StartupSyncComplete if packet.is("network_status_response") => {
            match packet.get_u8("network_status")? {
                network_status::DOWN => Step::send(C::FormNetwork, S::NetworkDown),
                network_status::UP => Step::enter(S::NetworkUp),
                _ => None,
            }
        }
        S::NetworkDown if packet.is("network_status_response") => {
            match packet.get_u8("network_status")? {
                network_status::UP => Step::enter(S::NetworkUp),
                _ => None,
            }
        }
        _ => None,
    }
}
