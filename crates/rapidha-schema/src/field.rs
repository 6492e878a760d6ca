/// How many bytes a field occupies on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLength {
    /// Exactly this many bytes.
    Fixed(usize),
    /// Every remaining byte of the packet. Only valid as the last field.
    Remainder,
    /// Bytes up to (and consuming) a zero terminator.
    NullTerminated,
}

/// One field of a command or response layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub length: FieldLength,
    /// Value used when an encoded command does not supply the field.
    pub default: Option<&'static [u8]>,
}

impl FieldSpec {
    pub const fn fixed(name: &'static str, len: usize) -> Self {
        Self {
            name,
            length: FieldLength::Fixed(len),
            default: None,
        }
    }

    pub const fn remainder(name: &'static str) -> Self {
        Self {
            name,
            length: FieldLength::Remainder,
            default: None,
        }
    }

    pub const fn null_terminated(name: &'static str) -> Self {
        Self {
            name,
            length: FieldLength::NullTerminated,
            default: None,
        }
    }

    pub const fn with_default(mut self, default: &'static [u8]) -> Self {
        self.default = Some(default);
        self
    }

    /// The fixed byte count, if this field has one.
    pub fn fixed_len(&self) -> Option<usize> {
        match self.length {
            FieldLength::Fixed(len) => Some(len),
            FieldLength::Remainder | FieldLength::NullTerminated => None,
        }
    }
}

/// Layout of an outgoing command. The first field is always the 2-byte `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

impl CommandSpec {
    /// The command id taken from the default of the leading `id` field.
    pub fn id(&self) -> Option<[u8; 2]> {
        let first = self.fields.first()?;
        if first.name != "id" || first.length != FieldLength::Fixed(2) {
            return None;
        }
        match first.default {
            Some(&[hi, lo]) => Some([hi, lo]),
            _ => None,
        }
    }
}

/// Layout of an incoming response, keyed by its 2-byte id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseSpec {
    pub id: [u8; 2],
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}
