//! Decoded packet boundary
//!
//! The tap subsystem never decodes anything itself. The decode engine hands
//! it a `DecodedPacket`: something listener filters can query by protocol
//! field name once decoding has finished, and that can be told up front
//! which fields those filters are going to read.

#[cfg(test)]
#[path = "packet_test.rs"]
mod tests;

/// Value of a decoded protocol field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Bool(bool),
    UInt(u64),
    Int(i64),
    Str(&'a str),
    Bytes(&'a [u8]),
}

/// A packet as seen by tap filters and listeners
pub trait DecodedPacket {
    /// Number of the frame in the capture
    fn frame_number(&self) -> u64;

    /// Value of a field, if the packet carries it
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Ask the decoder to keep `name` when it decodes this packet
    ///
    /// Called before decoding for every field a listener filter reads.
    /// Decoders that always keep every field can ignore it.
    fn prime_field(&mut self, _name: &str) {}
}

/// Owned field storage for [`PacketFields`]
#[derive(Debug, Clone, PartialEq, Eq)]
enum StoredValue {
    Bool(bool),
    UInt(u64),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
}

impl StoredValue {
    fn as_value(&self) -> FieldValue<'_> {
        match self {
            Self::Bool(v) => FieldValue::Bool(*v),
            Self::UInt(v) => FieldValue::UInt(*v),
            Self::Int(v) => FieldValue::Int(*v),
            Self::Str(v) => FieldValue::Str(v),
            Self::Bytes(v) => FieldValue::Bytes(v),
        }
    }
}

/// Flat list of named fields implementing [`DecodedPacket`]
///
/// Suits decoders that produce a handful of fields per packet, and tests.
/// Primed field names are recorded so callers can see what filters asked for.
///
/// ```
/// use sift_tap::{DecodedPacket, FieldValue, PacketFields};
///
/// let packet = PacketFields::new(1)
///     .with_uint("frame.len", 150)
///     .with_str("ip.src", "10.0.0.1");
///
/// assert_eq!(packet.field("frame.len"), Some(FieldValue::UInt(150)));
/// assert_eq!(packet.field("tcp.port"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PacketFields {
    frame_number: u64,
    fields: Vec<(String, StoredValue)>,
    primed: Vec<String>,
}

impl PacketFields {
    /// Create a packet with no fields
    pub fn new(frame_number: u64) -> Self {
        Self {
            frame_number,
            ..Default::default()
        }
    }

    fn with(mut self, name: impl Into<String>, value: StoredValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    /// Add a boolean field (protocol presence markers, flags)
    pub fn with_bool(self, name: impl Into<String>, value: bool) -> Self {
        self.with(name, StoredValue::Bool(value))
    }

    /// Add an unsigned integer field
    pub fn with_uint(self, name: impl Into<String>, value: u64) -> Self {
        self.with(name, StoredValue::UInt(value))
    }

    /// Add a signed integer field
    pub fn with_int(self, name: impl Into<String>, value: i64) -> Self {
        self.with(name, StoredValue::Int(value))
    }

    /// Add a string field
    pub fn with_str(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, StoredValue::Str(value.into()))
    }

    /// Add a raw bytes field
    pub fn with_bytes(self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.with(name, StoredValue::Bytes(value.into()))
    }

    /// Field names primed so far, in priming order, without duplicates
    pub fn primed(&self) -> &[String] {
        &self.primed
    }
}

impl DecodedPacket for PacketFields {
    fn frame_number(&self) -> u64 {
        self.frame_number
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_value())
    }

    fn prime_field(&mut self, name: &str) {
        if !self.primed.iter().any(|p| p == name) {
            self.primed.push(name.to_string());
        }
    }
}
