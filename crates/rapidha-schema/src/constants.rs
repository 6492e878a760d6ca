//! ZigBee Home Automation constants used by the RapidHA serial API.
//!
//! Multi-byte values are stored in wire order (little-endian), ready to be
//! passed as command field values.

/// Home Automation profile id (0x0104).
pub const PROFILE_ID: [u8; 2] = [0x04, 0x01];

/// Values of the `config_state` field of `startup_sync`.
pub mod configuration_state {
    pub const FACTORY_DEFAULT: u8 = 0x00;
    pub const NEEDS_ENDPOINT_CONFIG: u8 = 0x01;
    pub const CONFIGURED: u8 = 0x02;
}

/// Values of the `running_state` field of `startup_sync`.
pub mod running_state {
    /// Module waits for the host to configure it.
    pub const STARTING: u8 = 0x00;
    pub const RUNNING: u8 = 0x01;
}

/// Values of the `network_status` field of `network_status_response`.
pub mod network_status {
    pub const DOWN: u8 = 0x00;
    pub const UP: u8 = 0x01;
}

/// Values of the `event` field of `network_device_trust_response`.
pub mod trust_event {
    pub const DEVICE_LEFT: u8 = 0x03;
}

pub mod device_type {
    pub const FFD: u8 = 0x00;
    pub const RFD: u8 = 0x01;

    pub const NON_SLEEPY: u8 = 0x00;
    pub const SLEEPY: u8 = 0x01;
}

pub mod cluster_type {
    pub const CLIENT: u8 = 0x00;
    pub const SERVER: u8 = 0x01;
}

/// HA device ids.
pub mod device_id {
    pub const ON_OFF_SWITCH: [u8; 2] = [0x00, 0x00];
    pub const LEVEL_CONTROL_SWITCH: [u8; 2] = [0x01, 0x00];
    pub const ON_OFF_OUTPUT: [u8; 2] = [0x02, 0x00];
    pub const LEVEL_CONTROLLABLE_OUTPUT: [u8; 2] = [0x03, 0x00];
    pub const SCENE_SELECTOR: [u8; 2] = [0x04, 0x00];
    pub const CONFIGURATION_TOOL: [u8; 2] = [0x05, 0x00];
    pub const REMOTE_CONTROL: [u8; 2] = [0x06, 0x00];
    pub const COMBINED_INTERFACE: [u8; 2] = [0x07, 0x00];
    pub const RANGE_EXTENDER: [u8; 2] = [0x08, 0x00];
    pub const MAINS_POWER_OUTLET: [u8; 2] = [0x09, 0x00];

    pub const HVAC_HEATING_COOLING_UNIT: [u8; 2] = [0x03, 0x00];
    pub const HVAC_THERMOSTAT: [u8; 2] = [0x03, 0x01];
    pub const HVAC_TEMPERATURE_SENSOR: [u8; 2] = [0x03, 0x02];
    pub const HVAC_PUMP: [u8; 2] = [0x03, 0x03];
    pub const HVAC_PUMP_CONTROLLER: [u8; 2] = [0x03, 0x04];
    pub const HVAC_PRESSURE_SENSOR: [u8; 2] = [0x03, 0x05];
    pub const HVAC_FLOW_SENSOR: [u8; 2] = [0x03, 0x06];
}

pub mod cluster_id {
    pub const BASIC: [u8; 2] = [0x00, 0x00];
    pub const IDENTIFY: [u8; 2] = [0x03, 0x00];
    pub const GROUPS: [u8; 2] = [0x04, 0x00];
    pub const SCENES: [u8; 2] = [0x05, 0x00];
    pub const ON_OFF: [u8; 2] = [0x06, 0x00];
    pub const LEVEL_CONTROL: [u8; 2] = [0x09, 0x00];
    pub const TIME: [u8; 2] = [0x0A, 0x00];
    pub const OTA_UPGRADE: [u8; 2] = [0x19, 0x00];
    pub const DOOR_LOCK: [u8; 2] = [0x01, 0x01];
    pub const THERMOSTAT: [u8; 2] = [0x01, 0x02];
    pub const FAN_CONTROL: [u8; 2] = [0x02, 0x02];
    pub const THERMOSTAT_UI: [u8; 2] = [0x04, 0x02];
}

/// Thermostat cluster attribute ids.
pub mod thermostat_attribute {
    pub const LOCAL_TEMPERATURE: [u8; 2] = [0x00, 0x00];
    pub const ABS_MIN_HEAT_SET_POINT_LIMIT: [u8; 2] = [0x03, 0x00];
    pub const ABS_MAX_HEAT_SET_POINT_LIMIT: [u8; 2] = [0x04, 0x00];
    pub const ABS_MIN_COOL_SET_POINT_LIMIT: [u8; 2] = [0x05, 0x00];
    pub const ABS_MAX_COOL_SET_POINT_LIMIT: [u8; 2] = [0x06, 0x00];
    pub const HVAC_SYSTEM_TYPE_CONFIGURATION: [u8; 2] = [0x09, 0x00];
    pub const LOCAL_TEMPERATURE_CALIBRATION: [u8; 2] = [0x10, 0x00];
    pub const OCCUPIED_COOLING_SET_POINT: [u8; 2] = [0x11, 0x00];
    pub const OCCUPIED_HEATING_SET_POINT: [u8; 2] = [0x12, 0x00];
    pub const MIN_HEAT_SET_POINT_LIMIT: [u8; 2] = [0x15, 0x00];
    pub const MAX_HEAT_SET_POINT_LIMIT: [u8; 2] = [0x16, 0x00];
    pub const MIN_COOL_SET_POINT_LIMIT: [u8; 2] = [0x17, 0x00];
    pub const MAX_COOL_SET_POINT_LIMIT: [u8; 2] = [0x18, 0x00];
    pub const MIN_SET_POINT_DEADBAND: [u8; 2] = [0x19, 0x00];
    pub const CONTROL_SEQUENCE_OF_OPERATION: [u8; 2] = [0x1B, 0x00];
    pub const SYSTEM_MODE: [u8; 2] = [0x1C, 0x00];
    pub const THERMOSTAT_RUNNING_MODE: [u8; 2] = [0x1E, 0x00];
    pub const SET_POINT_HOLD: [u8; 2] = [0x23, 0x00];
    pub const THERMOSTAT_RUNNING_STATE: [u8; 2] = [0x29, 0x00];
}

/// Fan control cluster.
pub mod fan_mode {
    pub const ATTRIBUTE: [u8; 2] = [0x00, 0x00];

    pub const OFF: u8 = 0x00;
    pub const LOW: u8 = 0x01;
    pub const MEDIUM: u8 = 0x02;
    pub const HIGH: u8 = 0x03;
    pub const ON: u8 = 0x04;
    pub const AUTO: u8 = 0x05;
}

/// Thermostat `system_mode` values.
pub mod system_mode {
    pub const OFF: u8 = 0x00;
    pub const AUTO: u8 = 0x01;
    pub const COOL: u8 = 0x03;
    pub const HEAT: u8 = 0x04;
    pub const EMERGENCY_HEAT: u8 = 0x05;
    pub const PRE_COOL: u8 = 0x06;
    pub const FAN_ONLY: u8 = 0x07;
    pub const DRY: u8 = 0x08;
    pub const SLEEP: u8 = 0x09;
}

/// ZCL attribute data type tags.
pub mod attribute_type {
    pub const NULL: u8 = 0x00;
    pub const BOOL: u8 = 0x10;
    pub const ENUM8: u8 = 0x30;
    pub const ENUM16: u8 = 0x31;

    pub const DATA8: u8 = 0x08;
    pub const DATA16: u8 = 0x09;
    pub const DATA24: u8 = 0x0A;
    pub const DATA32: u8 = 0x0B;
    pub const DATA64: u8 = 0x0F;

    pub const BITMAP8: u8 = 0x18;
    pub const BITMAP16: u8 = 0x19;
    pub const BITMAP24: u8 = 0x1A;
    pub const BITMAP32: u8 = 0x1B;
    pub const BITMAP64: u8 = 0x1F;

    pub const UINT8: u8 = 0x20;
    pub const UINT16: u8 = 0x21;
    pub const UINT24: u8 = 0x22;
    pub const UINT32: u8 = 0x23;
    pub const UINT40: u8 = 0x24;
    pub const UINT48: u8 = 0x25;
    pub const UINT56: u8 = 0x26;
    pub const UINT64: u8 = 0x27;

    pub const INT8: u8 = 0x28;
    pub const INT16: u8 = 0x29;
    pub const INT24: u8 = 0x2A;
    pub const INT32: u8 = 0x2B;
    pub const INT40: u8 = 0x2C;
    pub const INT48: u8 = 0x2D;
    pub const INT56: u8 = 0x2E;
    pub const INT64: u8 = 0x2F;
}

/// Status values of the OTA image block response.
pub mod ota_status {
    pub const SUCCESS: u8 = 0x00;
    pub const ABORT: u8 = 0x95;
    pub const WAIT_FOR_DATA: u8 = 0x97;
}
