/*!
 * Wire Codec Tests
 * Pack/unpack round trips and malformed-input handling
 */

use pretty_assertions::assert_eq;
use record_arena::record::{from_wire, to_wire};
use record_arena::{ValueList, ValueRef, WireError, WireMessage};

fn sample_list() -> ValueList {
    let mut list = ValueList::with_capacity(7).unwrap();
    list.push("null-node", ValueRef::Null).unwrap();
    list.push("flag", ValueRef::Bool(true)).unwrap();
    list.push("count", ValueRef::Int64(-1234)).unwrap();
    list.push("total", ValueRef::Uint64(u64::MAX)).unwrap();
    list.push("ratio", ValueRef::Decimal(2.5)).unwrap();
    list.push("label", ValueRef::Text("datastore")).unwrap();
    list.push("blob", ValueRef::Binary(b"\x00\xff\x7f")).unwrap();
    list
}

#[test]
fn test_round_trip_preserves_fields() {
    let list = sample_list();
    let bytes = to_wire(&list).unwrap();
    let decoded = from_wire(&bytes).unwrap();

    assert_eq!(decoded.len(), list.len());
    for (expected, actual) in list.iter().zip(decoded.iter()) {
        assert_eq!(expected, actual);
    }
}

#[test]
fn test_double_round_trip() {
    let bytes = to_wire(&sample_list()).unwrap();
    let once = from_wire(&bytes).unwrap();
    let again = from_wire(&to_wire(&once).unwrap()).unwrap();
    assert_eq!(again.len(), once.len());
    for (expected, actual) in once.iter().zip(again.iter()) {
        assert_eq!(expected, actual);
    }
}

#[test]
fn test_unpack_transfers_context_shallowly() {
    let bytes = to_wire(&sample_list()).unwrap();
    let message = WireMessage::unpack(&bytes).unwrap();
    assert_eq!(message.context().obj_count(), 1);
    assert_eq!(message.field_count(), 7);

    let list = message.into_values();
    assert_eq!(list.context().obj_count(), 1);
    assert_eq!(list.get(5), Some(("label", ValueRef::Text("datastore"))));
}

#[test]
fn test_truncated_message_rejected() {
    let bytes = to_wire(&sample_list()).unwrap();
    let err = WireMessage::unpack(&bytes[..bytes.len() / 2]).unwrap_err();
    assert!(matches!(err, WireError::Truncated { .. }));
}

#[cfg(feature = "arena")]
mod managed {
    use super::*;
    use pretty_assertions::assert_eq;
    use record_arena::arena::pool;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_malformed_unpack_creates_no_pool_entry() {
        pool::drain();
        let mut bytes = to_wire(&sample_list()).unwrap();
        // Corrupt the last field's payload tag after many small fields
        // have already been copied into the context
        let tail = bytes.len() - 8;
        bytes[tail] = 0xEE;

        let err = WireMessage::unpack(&bytes).unwrap_err();
        assert_eq!(err, WireError::InvalidTag(0xEE));

        // The aborted message's context went straight back to the system
        assert_eq!(pool::thread_stats().idle, 0);
    }

    #[test]
    #[serial]
    fn test_unpack_lands_fields_in_one_context() {
        pool::drain();
        let bytes = to_wire(&sample_list()).unwrap();
        let message = WireMessage::unpack(&bytes).unwrap();

        // The whole message fits one fresh block
        assert_eq!(message.context().block_count(), 1);
        assert!(message.context().used() > 0);
        drop(message);
        pool::drain();
    }
}
