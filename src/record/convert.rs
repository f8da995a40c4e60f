/*!
 * Record/Wire Conversion
 *
 * Packs records into the wire framing and back. Conversion to the message
 * form is bracketed by a snapshot scope on the record's context: scalar
 * payloads are rendered to text through the context as transient shallow
 * copies and discarded when the scope closes, so packing leaves the
 * context's cursor exactly where it found it. Text and binary payloads are
 * encoded straight from the record's bytes without copying.
 */

use super::bytes::FieldBytes;
use super::value::{Value, ValueList, ValueRef};
use super::wire::{tag, WireError, WireMessage, WireResult, WIRE_VERSION};
use crate::arena::context::Context;
use std::fmt::Write;

/// Stack buffer for scalar renderings; large enough for every scalar
/// `Display` form
struct ScalarBuf {
    buf: [u8; 64],
    len: usize,
}

impl ScalarBuf {
    fn render<T: std::fmt::Display>(v: T) -> Self {
        let mut out = Self {
            buf: [0; 64],
            len: 0,
        };
        let ok = write!(out, "{v}").is_ok();
        debug_assert!(ok, "scalar rendering exceeded buffer");
        out
    }

    fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl Write for ScalarBuf {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        let bytes = s.as_bytes();
        if self.len + bytes.len() > self.buf.len() {
            return Err(std::fmt::Error);
        }
        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }
}

/// Pack a record list into wire bytes
pub fn to_wire(list: &ValueList) -> WireResult<Vec<u8>> {
    let ctx = list.context();
    // Transient scalar renderings are discarded with the scope.
    let _scope = ctx.scope();
    encode_message(ctx, list.len(), list.iter())
}

/// Pack a single record value into wire bytes
pub fn value_to_wire(value: &Value) -> WireResult<Vec<u8>> {
    let ctx = value.context();
    let _scope = ctx.scope();
    encode_message(ctx, 1, std::iter::once((value.name(), value.data())))
}

/// Unpack wire bytes into a record list (shallow, context transfers)
pub fn from_wire(bytes: &[u8]) -> WireResult<ValueList> {
    Ok(WireMessage::unpack(bytes)?.into_values())
}

fn encode_message<'a>(
    ctx: &Context,
    count: usize,
    fields: impl Iterator<Item = (&'a str, ValueRef<'a>)>,
) -> WireResult<Vec<u8>> {
    if count > u16::MAX as usize {
        return Err(WireError::FieldLimit(count));
    }
    let mut out = Vec::with_capacity(16 + count * 32);
    out.push(WIRE_VERSION);
    out.extend_from_slice(&(count as u16).to_le_bytes());
    for (name, data) in fields {
        encode_field(ctx, &mut out, name, data)?;
    }
    Ok(out)
}

fn encode_field(
    ctx: &Context,
    out: &mut Vec<u8>,
    name: &str,
    data: ValueRef<'_>,
) -> WireResult<()> {
    if name.len() > u16::MAX as usize {
        return Err(WireError::FieldTooLarge(name.len()));
    }
    out.extend_from_slice(&(name.len() as u16).to_le_bytes());
    out.extend_from_slice(name.as_bytes());

    match data {
        ValueRef::Null => write_payload(out, tag::NULL, &[]),
        ValueRef::Bool(v) => {
            let text: &[u8] = if v { b"true" } else { b"false" };
            write_payload(out, tag::BOOL, text)
        }
        ValueRef::Int64(v) => write_scalar(ctx, out, tag::INT64, ScalarBuf::render(v)),
        ValueRef::Uint64(v) => write_scalar(ctx, out, tag::UINT64, ScalarBuf::render(v)),
        ValueRef::Decimal(v) => write_scalar(ctx, out, tag::DECIMAL, ScalarBuf::render(v)),
        ValueRef::Text(s) => write_payload(out, tag::TEXT, s.as_bytes()),
        ValueRef::Binary(b) => write_payload(out, tag::BINARY, b),
    }
}

/// Render a scalar through the context as a transient shallow copy
///
/// The rendering lands in the record's context (the caller's snapshot
/// scope reclaims it) and is encoded from there, so the message form never
/// allocates on the general heap for a managed record.
fn write_scalar(
    ctx: &Context,
    out: &mut Vec<u8>,
    payload_tag: u8,
    rendered: ScalarBuf,
) -> WireResult<()> {
    let transient = FieldBytes::capture(ctx, rendered.as_bytes())?;
    write_payload(out, payload_tag, transient.as_bytes())
}

fn write_payload(out: &mut Vec<u8>, payload_tag: u8, payload: &[u8]) -> WireResult<()> {
    if payload.len() > u32::MAX as usize {
        return Err(WireError::FieldTooLarge(payload.len()));
    }
    out.push(payload_tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    Ok(())
}
