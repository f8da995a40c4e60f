/*!
 * Field Storage
 * Owned-bytes fields that either alias a context's blocks or fall back to
 * the system allocator
 */

use crate::arena::context::Context;
use crate::arena::types::ArenaResult;
use std::ptr::NonNull;

/// Byte storage for a record field
///
/// The `Arena` variant aliases storage owned by the record's context; it
/// carries no lifetime because the embedding record keeps an attachment on
/// that context for as long as the field lives. The `Owned` variant is the
/// null-back-pointer fallback released by `Drop`.
#[derive(Debug)]
pub(crate) enum FieldBytes {
    Empty,
    Arena { ptr: NonNull<u8>, len: usize },
    Owned(Box<[u8]>),
}

impl FieldBytes {
    pub fn from_arena(ptr: NonNull<u8>, len: usize) -> Self {
        if len == 0 {
            Self::Empty
        } else {
            Self::Arena { ptr, len }
        }
    }

    pub fn owned(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            Self::Empty
        } else {
            Self::Owned(bytes.into())
        }
    }

    /// Copy `bytes` into `ctx` when managed, else take an owned copy
    pub fn capture(ctx: &Context, bytes: &[u8]) -> ArenaResult<Self> {
        if bytes.is_empty() {
            return Ok(Self::Empty);
        }
        if ctx.is_managed() {
            let ptr = ctx.copy_slice(bytes)?;
            Ok(Self::Arena {
                ptr,
                len: bytes.len(),
            })
        } else {
            Ok(Self::Owned(bytes.into()))
        }
    }

    /// Alias the same storage
    ///
    /// Arena-backed fields share the pointer (the shallow-copy case); owned
    /// fields are re-copied so each owner frees its own bytes.
    pub fn alias(&self) -> Self {
        match self {
            Self::Empty => Self::Empty,
            Self::Arena { ptr, len } => Self::Arena {
                ptr: *ptr,
                len: *len,
            },
            Self::Owned(bytes) => Self::Owned(bytes.clone()),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Empty => &[],
            // SAFETY: the pointee is a live reservation of len bytes in a
            // context the embedding record keeps attached
            Self::Arena { ptr, len } => unsafe {
                std::slice::from_raw_parts(ptr.as_ptr(), *len)
            },
            Self::Owned(bytes) => bytes,
        }
    }

    /// View as a string slice
    ///
    /// Only fields captured from `&str` input are viewed this way; the
    /// bytes were validated at capture.
    pub fn as_str(&self) -> &str {
        // SAFETY: construction sites for name/text fields only accept
        // validated UTF-8
        unsafe { std::str::from_utf8_unchecked(self.as_bytes()) }
    }

}
