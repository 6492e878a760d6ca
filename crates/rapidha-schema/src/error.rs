/// Errors raised while building the registry, encoding commands or decoding responses.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// No command with this name is registered.
    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    /// A command or response table entry violates the schema rules.
    #[error("malformed schema for '{name}': {reason}")]
    MalformedSchema { name: String, reason: String },

    /// Two response entries claim the same id.
    #[error("response id {id:#06x} registered for both '{first}' and '{second}'")]
    DuplicateResponseId {
        id: u16,
        first: &'static str,
        second: &'static str,
    },

    /// A fixed-length field without default was not supplied.
    #[error("command '{command}': field '{field}' of length {length} was not provided")]
    MissingField {
        command: &'static str,
        field: &'static str,
        length: usize,
    },

    /// A supplied value does not match its fixed field length.
    #[error("command '{command}': field '{field}' must be {expected} bytes, got {actual}")]
    FieldLengthMismatch {
        command: &'static str,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// No response is registered for this id.
    #[error("unrecognized response id {0:#06x}")]
    UnrecognizedResponse(u16),

    /// The id belongs to a command: the module echoed host traffic instead of answering.
    #[error(
        "incoming frame with id {id:#06x} looks like a '{command}' command frame; is the module in API mode?"
    )]
    UnexpectedCommandEcho { id: u16, command: &'static str },

    /// The response ended before a fixed-length field was complete.
    #[error("response '{response}' shorter than expected ({actual} bytes, need {expected})")]
    TruncatedResponse {
        response: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Bytes remain after every declared field was decoded.
    #[error("response '{response}' longer than expected ({actual} bytes, decoded {consumed})")]
    OverlongResponse {
        response: &'static str,
        consumed: usize,
        actual: usize,
    },

    /// An attribute value does not have the width its type tag declares.
    #[error("attribute type {type_tag:#04x} needs {expected} bytes, got {actual}")]
    ScalarLengthMismatch {
        type_tag: u8,
        expected: usize,
        actual: usize,
    },
}

pub type Result<T> = std::result::Result<T, SchemaError>;
