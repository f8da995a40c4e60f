/*!
 * Record Values
 *
 * Typed record values and record lists, the constructor/destructor surface
 * the engine exposes to schema code. A value owns its bytes through its
 * context; dropping the last record attached to a context is what releases
 * (or pools) the storage.
 *
 * A list counts as a single object against its context regardless of
 * element count: elements are plain entries stored inside the list, so an
 * individual element cannot be freed on its own.
 */

use super::bytes::FieldBytes;
use crate::arena::context::Context;
use crate::arena::types::ArenaResult;
use crate::core::limits::{LIST_ELEM_ESTIMATE, VALUE_BASE_ESTIMATE};

/// Borrowed value payload used to construct and read records
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueRef<'a> {
    Null,
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Decimal(f64),
    Text(&'a str),
    Binary(&'a [u8]),
}

impl ValueRef<'_> {
    /// Bytes of owned payload a record built from this value will copy
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Binary(b) => b.len(),
            _ => 0,
        }
    }
}

/// Stored value payload
#[derive(Debug)]
pub(crate) enum Payload {
    Null,
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Decimal(f64),
    Text(FieldBytes),
    Binary(FieldBytes),
}

impl Payload {
    pub fn capture(ctx: &Context, data: ValueRef<'_>) -> ArenaResult<Self> {
        Ok(match data {
            ValueRef::Null => Self::Null,
            ValueRef::Bool(v) => Self::Bool(v),
            ValueRef::Int64(v) => Self::Int64(v),
            ValueRef::Uint64(v) => Self::Uint64(v),
            ValueRef::Decimal(v) => Self::Decimal(v),
            ValueRef::Text(s) => Self::Text(FieldBytes::capture(ctx, s.as_bytes())?),
            ValueRef::Binary(b) => Self::Binary(FieldBytes::capture(ctx, b)?),
        })
    }

    pub fn alias(&self) -> Self {
        match self {
            Self::Null => Self::Null,
            Self::Bool(v) => Self::Bool(*v),
            Self::Int64(v) => Self::Int64(*v),
            Self::Uint64(v) => Self::Uint64(*v),
            Self::Decimal(v) => Self::Decimal(*v),
            Self::Text(bytes) => Self::Text(bytes.alias()),
            Self::Binary(bytes) => Self::Binary(bytes.alias()),
        }
    }

    pub fn as_ref(&self) -> ValueRef<'_> {
        match self {
            Self::Null => ValueRef::Null,
            Self::Bool(v) => ValueRef::Bool(*v),
            Self::Int64(v) => ValueRef::Int64(*v),
            Self::Uint64(v) => ValueRef::Uint64(*v),
            Self::Decimal(v) => ValueRef::Decimal(*v),
            Self::Text(bytes) => ValueRef::Text(bytes.as_str()),
            Self::Binary(bytes) => ValueRef::Binary(bytes.as_bytes()),
        }
    }
}

/// Named field: record name plus payload
pub(crate) struct Field {
    pub name: FieldBytes,
    pub data: Payload,
}

impl Field {
    pub fn capture(ctx: &Context, name: &str, data: ValueRef<'_>) -> ArenaResult<Self> {
        Ok(Self {
            name: FieldBytes::capture(ctx, name.as_bytes())?,
            data: Payload::capture(ctx, data)?,
        })
    }

    pub fn alias(&self) -> Self {
        Self {
            name: self.name.alias(),
            data: self.data.alias(),
        }
    }
}

/// Context size estimate for a record built without a caller context
fn estimate(name: &str, data: ValueRef<'_>) -> usize {
    VALUE_BASE_ESTIMATE + name.len() + data.payload_len()
}

/// A single named record value
///
/// Embeds a context handle; an unmanaged handle means the fields own their
/// bytes on the system allocator and `Drop` frees them individually.
pub struct Value {
    ctx: Context,
    field: Field,
}

// SAFETY: field bytes alias blocks owned by `ctx`, which moves with the
// value; the single-owner handoff contract covers the aliasing pointers.
unsafe impl Send for Value {}

impl Value {
    /// Construct a value with its own context, sized by estimate
    pub fn new(name: &str, data: ValueRef<'_>) -> ArenaResult<Self> {
        let ctx = Context::new(estimate(name, data))?;
        let field = Field::capture(&ctx, name, data)?;
        Ok(Self { ctx, field })
    }

    /// Construct a value attached to an existing context
    pub fn new_in(ctx: &Context, name: &str, data: ValueRef<'_>) -> ArenaResult<Self> {
        let field = Field::capture(ctx, name, data)?;
        Ok(Self {
            ctx: ctx.clone(),
            field,
        })
    }

    /// Construct a value on the system allocator (no context)
    pub fn unmanaged(name: &str, data: ValueRef<'_>) -> Self {
        let ctx = Context::unmanaged();
        let field = Field {
            name: FieldBytes::owned(name.as_bytes()),
            data: match data {
                ValueRef::Text(s) => Payload::Text(FieldBytes::owned(s.as_bytes())),
                ValueRef::Binary(b) => Payload::Binary(FieldBytes::owned(b)),
                ValueRef::Null => Payload::Null,
                ValueRef::Bool(v) => Payload::Bool(v),
                ValueRef::Int64(v) => Payload::Int64(v),
                ValueRef::Uint64(v) => Payload::Uint64(v),
                ValueRef::Decimal(v) => Payload::Decimal(v),
            },
        };
        Self { ctx, field }
    }

    /// Shallow copy: aliases this value's bytes and takes its own
    /// attachment on the context
    pub fn shallow_copy(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            field: self.field.alias(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        self.field.name.as_str()
    }

    #[inline]
    pub fn data(&self) -> ValueRef<'_> {
        self.field.data.as_ref()
    }

    #[inline]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    #[inline]
    pub fn is_managed(&self) -> bool {
        self.ctx.is_managed()
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value")
            .field("name", &self.name())
            .field("data", &self.data())
            .field("managed", &self.is_managed())
            .finish()
    }
}

/// An ordered list of named values sharing one context
///
/// The list is the top-level object: it holds exactly one attachment no
/// matter how many elements it carries.
pub struct ValueList {
    ctx: Context,
    entries: Vec<Field>,
}

// SAFETY: entry bytes alias blocks owned by `ctx`, which moves with the
// list; the single-owner handoff contract covers the aliasing pointers.
unsafe impl Send for ValueList {}

impl ValueList {
    /// Construct an empty list with its own context sized for `expected`
    /// elements
    pub fn with_capacity(expected: usize) -> ArenaResult<Self> {
        let hint = VALUE_BASE_ESTIMATE + expected.saturating_mul(LIST_ELEM_ESTIMATE);
        Ok(Self {
            ctx: Context::new(hint)?,
            entries: Vec::with_capacity(expected),
        })
    }

    /// Construct an empty list attached to an existing context
    pub fn new_in(ctx: &Context) -> Self {
        Self {
            ctx: ctx.clone(),
            entries: Vec::new(),
        }
    }

    /// Construct an empty list on the system allocator (no context)
    pub fn unmanaged() -> Self {
        Self {
            ctx: Context::unmanaged(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn from_parts(ctx: Context, entries: Vec<Field>) -> Self {
        Self { ctx, entries }
    }

    /// Append a named value; its bytes land in the list's context
    pub fn push(&mut self, name: &str, data: ValueRef<'_>) -> ArenaResult<()> {
        let field = Field::capture(&self.ctx, name, data)?;
        self.entries.push(field);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(&str, ValueRef<'_>)> {
        self.entries
            .get(index)
            .map(|field| (field.name.as_str(), field.data.as_ref()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ValueRef<'_>)> {
        self.entries
            .iter()
            .map(|field| (field.name.as_str(), field.data.as_ref()))
    }

    #[inline]
    pub fn context(&self) -> &Context {
        &self.ctx
    }

    #[inline]
    pub fn is_managed(&self) -> bool {
        self.ctx.is_managed()
    }
}

impl std::fmt::Debug for ValueList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueList")
            .field("len", &self.len())
            .field("managed", &self.is_managed())
            .finish()
    }
}
