/*!
 * Snapshot Tests
 * Cursor capture, restore, and scope semantics
 */

use pretty_assertions::assert_eq;
use record_arena::core::limits::MIN_BLOCK_SIZE;
use record_arena::Context;

#[test]
fn test_restore_drops_trailing_blocks() {
    let ctx = Context::new(MIN_BLOCK_SIZE).unwrap();
    ctx.alloc(100).unwrap();
    let snap = ctx.snapshot().unwrap();

    ctx.alloc(100).unwrap();
    // Force a second block
    ctx.alloc(MIN_BLOCK_SIZE * 2).unwrap();
    assert_eq!(ctx.block_count(), 2);

    ctx.restore(&snap).unwrap();
    assert_eq!(ctx.block_count(), 1);
    assert_eq!(ctx.used(), 100);
    assert_eq!(ctx.capacity(), MIN_BLOCK_SIZE);
    ctx.discard();
}

#[test]
fn test_restore_reuses_dropped_bytes() {
    let ctx = Context::new(MIN_BLOCK_SIZE).unwrap();
    ctx.alloc(100).unwrap();
    let snap = ctx.snapshot().unwrap();

    let transient = ctx.alloc(100).unwrap();
    ctx.restore(&snap).unwrap();

    // The next reservation lands exactly where the discarded one did
    let reused = ctx.alloc(100).unwrap();
    assert_eq!(reused.as_ptr(), transient.as_ptr());
    ctx.discard();
}

#[test]
fn test_round_trip_is_indistinguishable() {
    let ctx = Context::new(MIN_BLOCK_SIZE).unwrap();
    ctx.alloc(300).unwrap();
    let before = ctx.stats();

    let snap = ctx.snapshot().unwrap();
    for _ in 0..50 {
        ctx.alloc(512).unwrap();
    }
    ctx.restore(&snap).unwrap();

    let after = ctx.stats();
    assert_eq!(before.blocks, after.blocks);
    assert_eq!(before.used, after.used);
    assert_eq!(before.capacity, after.capacity);
    assert_eq!(before.obj_count, after.obj_count);
    ctx.discard();
}

#[test]
fn test_nested_snapshots_rewind_in_order() {
    let ctx = Context::new(MIN_BLOCK_SIZE).unwrap();
    ctx.alloc(64).unwrap();
    let outer = ctx.snapshot().unwrap();

    ctx.alloc(64).unwrap();
    let inner = ctx.snapshot().unwrap();
    ctx.alloc(64).unwrap();

    ctx.restore(&inner).unwrap();
    assert_eq!(ctx.used(), 128);
    ctx.restore(&outer).unwrap();
    assert_eq!(ctx.used(), 64);
    ctx.discard();
}

#[test]
fn test_scope_restores_on_panic_path() {
    let ctx = Context::new(MIN_BLOCK_SIZE).unwrap();
    ctx.alloc(128).unwrap();
    let used = ctx.used();

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _scope = ctx.scope();
        ctx.alloc(1024).unwrap();
        panic!("conversion failed");
    }));
    assert!(result.is_err());
    assert_eq!(ctx.used(), used);
    ctx.discard();
}

#[test]
fn test_high_water_survives_restore() {
    let ctx = Context::new(MIN_BLOCK_SIZE).unwrap();
    let snap = ctx.snapshot().unwrap();
    ctx.alloc(2048).unwrap();
    ctx.restore(&snap).unwrap();

    assert_eq!(ctx.used(), 0);
    // The realized peak keeps counting the restored transient
    assert_eq!(ctx.high_water(), 2048);
    ctx.discard();
}
