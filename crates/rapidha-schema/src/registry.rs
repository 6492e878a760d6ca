use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU8, Ordering};

use bytes::{BufMut, Bytes, BytesMut};
use rapidha_frame::checksum;
use tracing::{trace, warn};

use crate::catalog::{COMMANDS, RESPONSES};
use crate::error::{Result, SchemaError};
use crate::field::{CommandSpec, FieldLength, FieldSpec, ResponseSpec};
use crate::packet::DecodedPacket;

/// Offset of the first field byte in a frame's data (id, sequence, length).
const FIELDS_OFFSET: usize = 4;

/// Trailing bytes tolerated after the last declared response field.
const TRAILING_SLACK: usize = 2;

/// Named field values for [`Registry::encode_command`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArgs {
    values: BTreeMap<String, Bytes>,
}

impl CommandArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`CommandArgs::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Bytes>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Bytes>) {
        self.values.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Bytes> {
        self.values.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A command ready to be framed: id, sequence, length, fields and checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    pub name: &'static str,
    /// Sequence number (frame id) assigned to this command.
    pub sequence: u8,
    pub bytes: Bytes,
}

/// Command and response layouts, validated once at construction.
///
/// The registry also owns the outgoing sequence counter, so every command
/// encoded through one registry gets the next frame id.
#[derive(Debug)]
pub struct Registry {
    commands: &'static [CommandSpec],
    by_name: HashMap<&'static str, usize>,
    responses: HashMap<[u8; 2], &'static ResponseSpec>,
    sequence: AtomicU8,
}

impl Registry {
    /// Build a registry from command and response tables.
    pub fn new(
        commands: &'static [CommandSpec],
        responses: &'static [ResponseSpec],
    ) -> Result<Self> {
        let mut by_name = HashMap::with_capacity(commands.len());
        for (index, command) in commands.iter().enumerate() {
            validate_command(command)?;
            if by_name.insert(command.name, index).is_some() {
                return Err(malformed(command.name, "command name registered twice"));
            }
        }

        let mut by_id: HashMap<[u8; 2], &'static ResponseSpec> =
            HashMap::with_capacity(responses.len());
        for response in responses {
            validate_fields(response.name, response.fields)?;
            if let Some(first) = by_id.insert(response.id, response) {
                return Err(SchemaError::DuplicateResponseId {
                    id: u16::from_be_bytes(response.id),
                    first: first.name,
                    second: response.name,
                });
            }
        }

        Ok(Self {
            commands,
            by_name,
            responses: by_id,
            sequence: AtomicU8::new(0),
        })
    }

    /// Registry over the built-in RapidHA catalog.
    pub fn standard() -> Result<Self> {
        Self::new(COMMANDS, RESPONSES)
    }

    pub fn command(&self, name: &str) -> Option<&'static CommandSpec> {
        let commands = self.commands;
        self.by_name.get(name).map(|&index| &commands[index])
    }

    pub fn response(&self, id: [u8; 2]) -> Option<&'static ResponseSpec> {
        self.responses.get(&id).copied()
    }

    /// Command names in catalog order.
    pub fn command_names(&self) -> impl Iterator<Item = &'static str> {
        self.commands.iter().map(|command| command.name)
    }

    /// Sequence number used by the most recently encoded command (0 before any).
    pub fn last_sequence(&self) -> u8 {
        self.sequence.load(Ordering::SeqCst)
    }

    /// Encode a named command with the given field values.
    ///
    /// Missing fields fall back to their default; variable-length fields
    /// without value are omitted. The sequence counter only advances once
    /// every field has been accepted.
    pub fn encode_command(&self, name: &str, args: &CommandArgs) -> Result<EncodedCommand> {
        let spec = self
            .command(name)
            .ok_or_else(|| SchemaError::UnknownCommand(name.to_string()))?;
        let id = spec
            .id()
            .ok_or_else(|| malformed(spec.name, "first field must be a 2-byte 'id' with a default"))?;

        let mut fields = BytesMut::new();
        for field in &spec.fields[1..] {
            let value = match args.get(field.name) {
                Some(value) => value.as_ref(),
                None => match field.default {
                    Some(default) => default,
                    None => match field.length {
                        FieldLength::Fixed(length) => {
                            return Err(SchemaError::MissingField {
                                command: spec.name,
                                field: field.name,
                                length,
                            })
                        }
                        FieldLength::Remainder | FieldLength::NullTerminated => continue,
                    },
                },
            };

            match field.length {
                FieldLength::Fixed(expected) if value.len() != expected => {
                    return Err(SchemaError::FieldLengthMismatch {
                        command: spec.name,
                        field: field.name,
                        expected,
                        actual: value.len(),
                    });
                }
                FieldLength::NullTerminated => {
                    fields.put_slice(value);
                    fields.put_u8(0);
                }
                FieldLength::Fixed(_) | FieldLength::Remainder => fields.put_slice(value),
            }
        }

        if fields.len() > usize::from(u8::MAX) {
            warn!(
                command = spec.name,
                len = fields.len(),
                "field bytes exceed 255, length byte truncated"
            );
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst).wrapping_add(1);

        let mut bytes = BytesMut::with_capacity(FIELDS_OFFSET + fields.len() + 2);
        bytes.put_slice(&id);
        bytes.put_u8(sequence);
        bytes.put_u8((fields.len() & 0xFF) as u8);
        bytes.put_slice(&fields);
        let sum = checksum(&bytes);
        bytes.put_u16_le(sum);

        trace!(command = spec.name, sequence, len = bytes.len(), "encoded command");
        Ok(EncodedCommand {
            name: spec.name,
            sequence,
            bytes: bytes.freeze(),
        })
    }

    /// Decode the data of a received frame (id, sequence, length, fields).
    pub fn decode_response(&self, data: &[u8]) -> Result<DecodedPacket> {
        if data.len() < 2 {
            return Err(SchemaError::TruncatedResponse {
                response: "frame header",
                expected: FIELDS_OFFSET,
                actual: data.len(),
            });
        }

        let id = [data[0], data[1]];
        let Some(spec) = self.response(id) else {
            let id_value = u16::from_be_bytes(id);
            return Err(match self.commands.iter().find(|command| command.id() == Some(id)) {
                Some(command) => SchemaError::UnexpectedCommandEcho {
                    id: id_value,
                    command: command.name,
                },
                None => SchemaError::UnrecognizedResponse(id_value),
            });
        };

        if data.len() < FIELDS_OFFSET {
            return Err(SchemaError::TruncatedResponse {
                response: spec.name,
                expected: FIELDS_OFFSET,
                actual: data.len(),
            });
        }

        let mut packet = DecodedPacket::new(spec.name, data[2]);
        let mut index = FIELDS_OFFSET;
        for field in spec.fields {
            match field.length {
                FieldLength::NullTerminated => {
                    let rest = &data[index..];
                    match rest.iter().position(|&byte| byte == 0) {
                        Some(end) => {
                            packet.push_field(field.name, Bytes::copy_from_slice(&rest[..end]));
                            index += end + 1;
                        }
                        None => {
                            packet.push_field(field.name, Bytes::copy_from_slice(rest));
                            index = data.len();
                        }
                    }
                }
                FieldLength::Fixed(length) => {
                    let end = index + length;
                    if end > data.len() {
                        return Err(SchemaError::TruncatedResponse {
                            response: spec.name,
                            expected: end,
                            actual: data.len(),
                        });
                    }
                    packet.push_field(field.name, Bytes::copy_from_slice(&data[index..end]));
                    index = end;
                }
                FieldLength::Remainder => {
                    if index < data.len() {
                        packet.push_field(field.name, Bytes::copy_from_slice(&data[index..]));
                        index = data.len();
                    }
                    break;
                }
            }
        }

        if index + TRAILING_SLACK < data.len() {
            return Err(SchemaError::OverlongResponse {
                response: spec.name,
                consumed: index,
                actual: data.len(),
            });
        }
        if index < data.len() {
            trace!(
                response = spec.name,
                extra = data.len() - index,
                "ignoring trailing response bytes"
            );
        }

        Ok(packet)
    }
}

fn malformed(name: &str, reason: &str) -> SchemaError {
    SchemaError::MalformedSchema {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_command(command: &CommandSpec) -> Result<()> {
    if command.id().is_none() {
        return Err(malformed(
            command.name,
            "first field must be a 2-byte 'id' with a default",
        ));
    }
    validate_fields(command.name, command.fields)
}

fn validate_fields(name: &str, fields: &[FieldSpec]) -> Result<()> {
    for (index, field) in fields.iter().enumerate() {
        if field.length == FieldLength::Remainder && index + 1 != fields.len() {
            return Err(malformed(
                name,
                &format!("remainder field '{}' must be last", field.name),
            ));
        }
        if let (Some(len), Some(default)) = (field.fixed_len(), field.default) {
            if default.len() != len {
                return Err(malformed(
                    name,
                    &format!("default of '{}' is not {len} bytes", field.name),
                ));
            }
        }
    }
    Ok(())
}
