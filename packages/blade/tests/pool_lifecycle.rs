//! Process-wide pool lifecycle: created lazily once, torn down explicitly
//!
//! Runs as a single test so the global pool's state is observed in order.

use blade_hashing::{Blade, BladeConfig, BladeError, PoolGuard, WorkerPool};

#[test]
fn test_global_pool_lifecycle() -> blade_hashing::Result<()> {
    // Small inputs on the default config never create the pool
    let auto = Blade::new(BladeConfig::new());
    let small = vec![9u8; 4096];
    let expected = auto.digest(&small)?;
    assert!(!WorkerPool::global_initialized());

    let guard = PoolGuard::new();

    // First parallel call creates it; later calls reuse the same instance
    let forced = Blade::new(BladeConfig::new().force_parallel(true));
    assert_eq!(forced.digest(&small)?, expected);
    assert!(WorkerPool::global_initialized());

    let first = WorkerPool::global()?;
    let second = WorkerPool::global()?;
    assert!(std::ptr::eq(first, second));
    assert!(first.size() >= 1);
    assert!(!first.is_shut_down());

    // Dropping the guard joins every worker exactly once
    drop(guard);
    assert!(first.is_shut_down());
    blade_hashing::shutdown_global();
    assert!(first.is_shut_down());

    // The pool path now fails cleanly; the serial path still works
    assert_eq!(forced.digest(&small), Err(BladeError::PoolShutDown));
    let serial = Blade::new(BladeConfig::new().block_parallel(true));
    assert_eq!(serial.digest(&small)?, expected);

    // Above the threshold the automatic policy falls back to serial
    assert_eq!(first.live_workers(), 0);
    let large = vec![3u8; 200 * 1024];
    assert_eq!(auto.digest(&large)?, serial.digest(&large)?);
    Ok(())
}
