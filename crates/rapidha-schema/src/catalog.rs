//! Static command and response tables of the RapidHA serial API.

use crate::field::{CommandSpec, FieldSpec, ResponseSpec};

macro_rules! command {
    ($name:literal, [$hi:literal, $lo:literal] $(, $field:expr)* $(,)?) => {
        CommandSpec {
            name: $name,
            fields: &[FieldSpec::fixed("id", 2).with_default(&[$hi, $lo]) $(, $field)*],
        }
    };
}

macro_rules! response {
    ([$hi:literal, $lo:literal], $name:literal $(, $field:expr)* $(,)?) => {
        ResponseSpec {
            id: [$hi, $lo],
            name: $name,
            fields: &[$($field),*],
        }
    };
}

const fn fixed(name: &'static str, len: usize) -> FieldSpec {
    FieldSpec::fixed(name, len)
}

const fn rest(name: &'static str) -> FieldSpec {
    FieldSpec::remainder(name)
}

/// Commands the host may send, keyed by name.
pub static COMMANDS: &[CommandSpec] = &[
    // Module management
    command!("reset", [0x55, 0x00]),
    command!("module_info", [0x55, 0x03]),
    command!("bootloader_version", [0x55, 0x04]),
    command!("application_version_count", [0x55, 0x06]),
    command!(
        "application_version",
        [0x55, 0x08],
        fixed("version", 1).with_default(&[0x00]),
    ),
    command!("host_startup_ready", [0x55, 0x20]),
    command!("startup_sync", [0x55, 0x22]),
    command!("serial_ack", [0x55, 0x30], fixed("on", 1).with_default(&[0x01])),
    command!("get_serial_ack", [0x55, 0x31]),
    command!("restore_defaults", [0x55, 0x10]),
    // Endpoint configuration
    command!(
        "device_type_write",
        [0x03, 0x00],
        fixed("type", 1),
        fixed("sleepy", 1),
    ),
    command!("endpoint_list", [0x03, 0x11]),
    command!("clear_endpoint_config", [0x03, 0x30]),
    command!(
        "add_endpoint",
        [0x03, 0x10],
        fixed("endpoint", 1),
        fixed("profile_id", 2),
        fixed("device_id", 2),
        fixed("device_version", 1),
        fixed("server_clusters", 1),
        rest("cluster_data"),
    ),
    command!(
        "add_attribute_to_cluster",
        [0x03, 0x20],
        fixed("endpoint", 1),
        fixed("cluster_id", 2),
        fixed("is_server", 1),
        fixed("attribute_count", 1),
        rest("attributes"),
    ),
    // Network
    command!(
        "join_network",
        [0x01, 0x00],
        fixed("channel_mask", 4),
        fixed("auto_options", 1),
        fixed("short_pan", 2),
        fixed("expanded_pan", 8),
    ),
    command!(
        "form_network",
        [0x01, 0x01],
        fixed("channel_mask", 4),
        fixed("auto_options", 1),
        fixed("short_pan", 2),
        fixed("expanded_pan", 8),
    ),
    command!(
        "permit_join",
        [0x01, 0x03],
        fixed("duration", 1).with_default(&[0x3C]),
    ),
    command!("leave_network", [0x01, 0x04]),
    command!("rejoin_network", [0x01, 0x05]),
    command!("network_status", [0x01, 0x08]),
    command!(
        "network_auto_join",
        [0x01, 0x11],
        fixed("scan_count", 1),
        fixed("delay", 1),
    ),
    command!(
        "network_reset_auto_join",
        [0x01, 0x12],
        fixed("scan_count", 1),
        fixed("delay", 1),
    ),
    // ZCL
    command!(
        "send_zcl_unicast",
        [0x05, 0x00],
        fixed("dest_node", 2),
        fixed("dest_endpoint", 2),
        fixed("local_endpoint", 1),
        fixed("cluster", 2),
        fixed("response_options", 1),
        fixed("encryption_level", 1),
        fixed("frame_control", 1),
        fixed("manufacturer_code", 2),
        fixed("transaction_seq", 1),
        fixed("command", 1),
        fixed("payload_length", 1),
        rest("payload"),
    ),
    command!(
        "send_zcl_multicast",
        [0x05, 0x01],
        fixed("dest_endpoint", 2),
        fixed("local_endpoint", 1),
        fixed("radius", 1),
        fixed("non_member_radius", 1),
        fixed("response_options", 1),
        fixed("frame_control", 1),
        fixed("manufacturer_code", 2),
        fixed("transaction_seq", 1),
        fixed("command", 1),
        fixed("payload_length", 1),
        rest("payload"),
    ),
    command!(
        "send_zcl_broadcast",
        [0x05, 0x02],
        fixed("broadcast_address", 1),
        fixed("dest_endpoint", 2),
        fixed("local_endpoint", 1),
        fixed("cluster", 2),
        fixed("response_options", 1),
        fixed("frame_control", 1),
        fixed("manufacturer_code", 2),
        fixed("transaction_seq", 1),
        fixed("command", 1),
        fixed("payload_length", 1),
        rest("payload"),
    ),
    command!(
        "aps_zcl_ack",
        [0x05, 0x10],
        fixed("status", 1),
        fixed("transaction_seq", 1),
    ),
    command!(
        "read_zcl_attribute",
        [0x05, 0x30],
        fixed("node", 2),
        fixed("endpoint", 1),
        fixed("cluster", 2),
        fixed("is_server", 1),
        fixed("attrib_count", 1),
        rest("attrib_ids"),
    ),
    command!(
        "write_zcl_attribute",
        [0x05, 0x32],
        fixed("node", 2),
        fixed("endpoint", 1),
        fixed("cluster", 2),
        fixed("is_server", 1),
        fixed("attrib_count", 1),
        rest("attrib_value"),
    ),
    // OTA upgrade server
    command!(
        "ota_image_notification",
        [0xB0, 0x00],
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("endpoint", 1),
        fixed("payload_type", 1),
        fixed("query_jitter", 1).with_default(&[0x32]),
        fixed("manufacturer_code", 2),
        fixed("image_type", 2).with_default(&[0x00, 0x00]),
        fixed("file_version", 4),
    ),
    command!(
        "ota_next_image_response",
        [0xB0, 0x02],
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("endpoint", 1),
        fixed("status", 1),
        fixed("manufacturer_code", 2),
        fixed("image_type", 2).with_default(&[0x00, 0x00]),
        fixed("file_version", 4),
        fixed("image_size", 4),
    ),
    command!(
        "ota_image_block_success",
        [0xB0, 0x05],
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("endpoint", 1),
        fixed("status", 1).with_default(&[0x00]),
        fixed("manufacturer_code", 2),
        fixed("image_type", 2).with_default(&[0x00, 0x00]),
        fixed("file_version", 4),
        fixed("file_offset", 4),
        fixed("data_size", 1),
        rest("data"),
    ),
    command!(
        "ota_image_block_wait",
        [0xB0, 0x05],
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("endpoint", 1),
        fixed("status", 1).with_default(&[0x97]),
        fixed("time", 4),
        fixed("request_time", 4),
        fixed("checksum_lsb", 1),
        fixed("checksum_msb", 1),
    ),
    command!(
        "ota_image_block_abort",
        [0xB0, 0x05],
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("endpoint", 1),
        fixed("status", 1).with_default(&[0x95]),
    ),
    command!(
        "ota_upgrade_end",
        [0xB0, 0x07],
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("endpoint", 1),
        fixed("manufacturer_code", 2),
        fixed("image_type", 2).with_default(&[0x00, 0x00]),
        fixed("file_version", 4),
        fixed("time", 4),
        fixed("upgrade_time", 4),
    ),
];

/// Responses the module may send, keyed by id.
pub static RESPONSES: &[ResponseSpec] = &[
    response!(
        [0x55, 0x21],
        "startup_sync",
        fixed("running_state", 1),
        fixed("config_state", 1),
    ),
    response!(
        [0x55, 0x03],
        "module_info_response",
        fixed("major_firmware_version", 1),
        fixed("minor_firmware_version", 1),
        fixed("build_firmware_version", 1),
        fixed("application_information", 2),
        fixed("eui64", 8),
        fixed("hardware_type", 1),
        fixed("bootloader_type", 1),
    ),
    response!(
        [0x55, 0x05],
        "bootloader_version_response",
        fixed("ember_version", 4),
        fixed("mmb_version", 4),
    ),
    response!(
        [0x55, 0x07],
        "application_version_count_response",
        fixed("version_count", 1),
    ),
    response!(
        [0x55, 0x09],
        "application_version_response",
        fixed("version_count", 1),
        fixed("version_type", 1),
        rest("version"),
    ),
    response!([0x55, 0x32], "serial_ack_response", fixed("serial_config", 1)),
    response!([0x55, 0x80], "status_response", fixed("status", 1)),
    response!([0x55, 0xE0], "error", fixed("error", 1), fixed("sub_error", 1)),
    response!(
        [0x03, 0x12],
        "endpoint_list_response",
        fixed("endpoints", 1),
        rest("data"),
    ),
    response!(
        [0x01, 0x09],
        "network_status_response",
        fixed("network_status", 1),
        fixed("zigbee_device", 1),
        fixed("channel", 1),
        fixed("node", 2),
        fixed("short_pan", 2),
        fixed("extended_pan", 8),
        fixed("permit_join_time", 1),
    ),
    response!(
        [0x01, 0x10],
        "network_device_trust_response",
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("event", 1),
        fixed("parent", 2),
    ),
    // Unicast, multicast and broadcast sends share one status response.
    response!(
        [0x05, 0x03],
        "send_zcl_response",
        fixed("status", 1),
        fixed("transaction_seq", 1),
    ),
    response!(
        [0x05, 0x31],
        "read_zcl_attribute_response",
        fixed("node", 2),
        fixed("endpoint", 1),
        fixed("cluster", 2),
        fixed("is_server", 1),
        fixed("attribute", 2),
        fixed("zcl_status", 1),
        fixed("attrib_type", 1),
        rest("attrib_value"),
    ),
    response!(
        [0x05, 0x33],
        "write_zcl_attribute_response",
        fixed("node", 2),
        fixed("endpoint", 1),
        fixed("cluster", 2),
        fixed("is_server", 1),
        fixed("status", 1),
        fixed("attrib_count", 1),
        rest("attrib_records"),
    ),
    response!(
        [0xB0, 0x01],
        "ota_query_next_image_request",
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("endpoint", 1),
        fixed("field_control", 1),
        fixed("manufacturer_code", 2),
        fixed("image_type", 2),
        fixed("file_version", 4),
        rest("hardware_version"),
    ),
    response!(
        [0xB0, 0x03],
        "ota_image_block_request",
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("endpoint", 1),
        fixed("field_control", 1),
        fixed("manufacturer_code", 2),
        fixed("image_type", 2),
        fixed("file_version", 4),
        fixed("file_offset", 4),
        fixed("max_data_size", 1),
    ),
    response!(
        [0xB0, 0x06],
        "ota_upgrade_end_request",
        fixed("node", 2),
        fixed("eui64", 8),
        fixed("endpoint", 1),
        fixed("status", 1),
        fixed("manufacturer_code", 2),
        fixed("image_type", 2),
        fixed("file_version", 4),
    ),
];
