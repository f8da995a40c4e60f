/*!
 * Record Module
 * Record values, wire codec, and record/message conversion
 */

mod bytes;
pub mod convert;
pub mod value;
pub mod wire;

// Re-export for convenience
pub use convert::{from_wire, to_wire, value_to_wire};
pub use value::{Value, ValueList, ValueRef};
pub use wire::{WireError, WireMessage, WireResult, WIRE_VERSION};
