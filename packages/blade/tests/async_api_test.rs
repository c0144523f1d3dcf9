//! Fluent async API over the digest engine

use blade_hashing::{Blade, BladeConfig, BladeError, WorkerPool};
use std::sync::Arc;

#[tokio::test]
async fn test_compute_matches_sync_digest() {
    let data = vec![0x42u8; 1000];
    let result = Blade::hash().compute(data.clone()).await;
    let digest = result.expect("Blade digest should succeed");
    assert_eq!(
        digest,
        blade_hashing::digest(&data).expect("sync digest should succeed")
    );
    assert_eq!(digest.len(), 64);
}

#[tokio::test]
async fn test_compute_with_handler() {
    let hex = Blade::hash()
        .block_parallel()
        .on_result(|result| match result {
            Ok(digest) => digest.to_hex(),
            Err(e) => format!("error: {e}"),
        })
        .compute(&[0u8; 128][..])
        .await;
    assert_eq!(
        hex,
        "d15e2a92a38d438e2e1c73eaef2020b75831878446b8033db02dc390e6396c45\
         2f744cc69ebeae27b343f85f54f557c550ab24a896dcd76d89f33d513d9b2bf3"
    );
}

#[tokio::test]
async fn test_compute_reports_errors() {
    let result = Blade::hash().compute(vec![1u8; 100]).await;
    assert_eq!(result, Err(BladeError::InvalidInputSize(100)));
}

#[tokio::test]
async fn test_private_pool_and_config() {
    let pool = Arc::new(WorkerPool::new(2).expect("pool should start"));
    let data = vec![7u8; 8192];

    let pooled = Blade::hash()
        .with_config(BladeConfig::new().force_parallel(true))
        .with_pool(Arc::clone(&pool))
        .compute(data.clone())
        .await
        .expect("pooled digest should succeed");
    let serial = Blade::hash()
        .block_parallel()
        .compute(data)
        .await
        .expect("serial digest should succeed");
    assert_eq!(pooled, serial);
}

#[test]
fn test_direct_builder_creation() {
    let builder = Blade::hash().force_parallel();
    let _ = builder.clone();
}
