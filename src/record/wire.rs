/*!
 * Wire Codec
 * Versioned binary framing for record exchange
 *
 * # Format
 * - Header: format version (u8), field count (u16 LE)
 * - Per field: name length (u16 LE), name bytes, payload tag (u8),
 *   payload length (u32 LE), payload bytes
 *
 * Scalar payloads travel as ASCII decimal text; text and binary payloads
 * travel verbatim. Unpacking drops the whole message into one fresh
 * context through the serializer allocator callbacks, so a message that
 * fails to parse midway is released in a single step with nothing pooled.
 */

use super::bytes::FieldBytes;
use super::value::{Field, Payload, ValueList, ValueRef};
use crate::arena::context::Context;
use crate::arena::shim::SerializerAllocator;
use crate::arena::types::ArenaError;
use log::debug;
use thiserror::Error;

/// Format version for forward/backward compatibility
pub const WIRE_VERSION: u8 = 1;

/// Payload tags
pub(crate) mod tag {
    pub const NULL: u8 = 0;
    pub const BOOL: u8 = 1;
    pub const INT64: u8 = 2;
    pub const UINT64: u8 = 3;
    pub const DECIMAL: u8 = 4;
    pub const TEXT: u8 = 5;
    pub const BINARY: u8 = 6;
}

/// Result type for wire operations
pub type WireResult<T> = Result<T, WireError>;

/// Wire codec errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("Truncated message: expected {expected} more bytes, {actual} available")]
    Truncated { expected: usize, actual: usize },

    #[error("Invalid format version: expected {expected}, got {actual}")]
    InvalidVersion { expected: u8, actual: u8 },

    #[error("Invalid payload tag: {0}")]
    InvalidTag(u8),

    #[error("Field is not valid UTF-8")]
    InvalidUtf8,

    #[error("Malformed scalar payload for tag {0}")]
    InvalidScalar(u8),

    #[error("Message field count {0} exceeds wire limit")]
    FieldLimit(usize),

    #[error("Field of {0} bytes exceeds wire limit")]
    FieldTooLarge(usize),

    #[error(transparent)]
    Alloc(#[from] ArenaError),
}

/// Cursor over an incoming message
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> WireResult<&'a [u8]> {
        let available = self.buf.len() - self.pos;
        if n > available {
            return Err(WireError::Truncated {
                expected: n,
                actual: available,
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u8(&mut self) -> WireResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16_le(&mut self) -> WireResult<u16> {
        let bytes = self.take(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u32_le(&mut self) -> WireResult<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

/// A decoded message holding every field in one context
///
/// Embeds the same context back-pointer convention as record types; the
/// conversion to a record list is shallow and transfers the context with
/// the message.
pub struct WireMessage {
    ctx: Context,
    fields: Vec<Field>,
}

// SAFETY: field bytes alias blocks owned by `ctx`, which moves with the
// message; the single-owner handoff contract covers the aliasing pointers.
unsafe impl Send for WireMessage {}

impl WireMessage {
    /// Decode a message into a fresh context
    ///
    /// Any parse failure releases the context in a single step; no pool
    /// entry is created for the aborted message.
    pub fn unpack(bytes: &[u8]) -> WireResult<Self> {
        let ctx = Context::new(bytes.len())?;
        match unpack_fields(&ctx, bytes) {
            Ok(fields) => Ok(Self { ctx, fields }),
            Err(err) => {
                debug!("message unpack failed: {err}; discarding context");
                ctx.discard();
                Err(err)
            }
        }
    }

    #[inline]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, index: usize) -> Option<(&str, ValueRef<'_>)> {
        self.fields
            .get(index)
            .map(|field| (field.name.as_str(), field.data.as_ref()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueRef<'_>)> {
        self.fields
            .iter()
            .map(|field| (field.name.as_str(), field.data.as_ref()))
    }

    #[inline]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Shallow conversion into a record list
    ///
    /// Zero-copy: the context and every field move; the attachment count is
    /// unchanged.
    pub fn into_values(self) -> ValueList {
        ValueList::from_parts(self.ctx, self.fields)
    }
}

impl std::fmt::Debug for WireMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WireMessage")
            .field("fields", &self.field_count())
            .field("managed", &self.ctx.is_managed())
            .finish()
    }
}

fn unpack_fields(ctx: &Context, bytes: &[u8]) -> WireResult<Vec<Field>> {
    let allocator = ctx.as_serializer_allocator();
    let mut reader = Reader::new(bytes);

    let version = reader.u8()?;
    if version != WIRE_VERSION {
        return Err(WireError::InvalidVersion {
            expected: WIRE_VERSION,
            actual: version,
        });
    }
    let count = reader.u16_le()? as usize;

    let mut fields = Vec::with_capacity(count);
    for _ in 0..count {
        let name_len = reader.u16_le()? as usize;
        let name_bytes = reader.take(name_len)?;
        std::str::from_utf8(name_bytes).map_err(|_| WireError::InvalidUtf8)?;

        let payload_tag = reader.u8()?;
        let payload_len = reader.u32_le()? as usize;
        let payload = reader.take(payload_len)?;

        let data = decode_payload(ctx, &allocator, payload_tag, payload)?;
        let name = capture_field(ctx, &allocator, name_bytes)?;
        fields.push(Field { name, data });
    }
    Ok(fields)
}

/// Land bytes in the context through the serializer callbacks, or take an
/// owned copy for the system-allocator fallback
fn capture_field(
    ctx: &Context,
    allocator: &SerializerAllocator,
    bytes: &[u8],
) -> WireResult<FieldBytes> {
    if bytes.is_empty() {
        return Ok(FieldBytes::Empty);
    }
    if ctx.is_managed() {
        let ptr = allocator
            .copy_in(bytes)
            .ok_or(ArenaError::OutOfMemory {
                requested: bytes.len(),
            })?;
        Ok(FieldBytes::from_arena(ptr, bytes.len()))
    } else {
        Ok(FieldBytes::owned(bytes))
    }
}

fn decode_payload(
    ctx: &Context,
    allocator: &SerializerAllocator,
    payload_tag: u8,
    payload: &[u8],
) -> WireResult<Payload> {
    match payload_tag {
        tag::NULL => Ok(Payload::Null),
        tag::BOOL => match payload {
            b"true" => Ok(Payload::Bool(true)),
            b"false" => Ok(Payload::Bool(false)),
            _ => Err(WireError::InvalidScalar(payload_tag)),
        },
        tag::INT64 => parse_scalar(payload_tag, payload).map(Payload::Int64),
        tag::UINT64 => parse_scalar(payload_tag, payload).map(Payload::Uint64),
        tag::DECIMAL => parse_scalar(payload_tag, payload).map(Payload::Decimal),
        tag::TEXT => {
            std::str::from_utf8(payload).map_err(|_| WireError::InvalidUtf8)?;
            Ok(Payload::Text(capture_field(ctx, allocator, payload)?))
        }
        tag::BINARY => Ok(Payload::Binary(capture_field(ctx, allocator, payload)?)),
        other => Err(WireError::InvalidTag(other)),
    }
}

fn parse_scalar<T: std::str::FromStr>(payload_tag: u8, payload: &[u8]) -> WireResult<T> {
    std::str::from_utf8(payload)
        .map_err(|_| WireError::InvalidUtf8)?
        .parse::<T>()
        .map_err(|_| WireError::InvalidScalar(payload_tag))
}
