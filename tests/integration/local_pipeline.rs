//! Full local pipeline integration tests.
//!
//! Connects splinter-chunk + splinter-store + splinter-meta + the engine
//! over a real filesystem backend: round trips, restart persistence, and
//! on-disk damage detection.

use splinter_engine::EngineError;
use splinter_integration_tests::{test_data, TestVault};

#[tokio::test]
async fn test_roundtrip_varying_sizes() {
    let vault = TestVault::new(4096);

    for size in [0usize, 1, 4095, 4096, 4097, 10_000, 100_000] {
        let data = test_data(size);
        let record = vault.engine.ingest("varying.bin", &data).await.unwrap();
        assert_eq!(record.total_size, size as u64);
        assert_eq!(record.fragment_count as usize, size.div_ceil(4096));

        let got = vault.engine.retrieve(record.file_id).await.unwrap();
        assert_eq!(got, data, "round trip mismatch at size {size}");
    }
}

#[tokio::test]
async fn test_files_survive_restart() {
    let vault = TestVault::new(1024);
    let data = test_data(10_000);
    let record = vault.engine.ingest("durable.bin", &data).await.unwrap();

    let vault = vault.reopen();

    let listed = vault.engine.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0], record);
    assert_eq!(vault.engine.retrieve(record.file_id).await.unwrap(), data);
}

#[tokio::test]
async fn test_on_disk_corruption_detected() {
    let vault = TestVault::new(4096);
    let record = vault
        .engine
        .ingest("damaged.bin", &test_data(10_000))
        .await
        .unwrap();

    // Flip bytes in fragment 2 directly on disk.
    let path = vault.fragment_path(record.file_id, 2);
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[10] ^= 0xFF;
    std::fs::write(&path, &bytes).unwrap();

    let err = vault.engine.retrieve(record.file_id).await.unwrap_err();
    match err {
        EngineError::Reconstruction { missing, corrupt } => {
            assert!(missing.is_empty());
            assert_eq!(corrupt, [2]);
        }
        other => panic!("expected Reconstruction error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_on_disk_truncation_detected() {
    let vault = TestVault::new(4096);
    let record = vault
        .engine
        .ingest("short.bin", &test_data(10_000))
        .await
        .unwrap();

    let path = vault.fragment_path(record.file_id, 0);
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let err = vault.engine.retrieve(record.file_id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Reconstruction { ref corrupt, .. } if *corrupt == [0]
    ));
}

#[tokio::test]
async fn test_on_disk_deletion_detected() {
    let vault = TestVault::new(4096);
    let record = vault
        .engine
        .ingest("lost.bin", &test_data(10_000))
        .await
        .unwrap();

    std::fs::remove_file(vault.fragment_path(record.file_id, 1)).unwrap();

    let err = vault.engine.retrieve(record.file_id).await.unwrap_err();
    match err {
        EngineError::Reconstruction { missing, corrupt } => {
            assert_eq!(missing, [1]);
            assert!(corrupt.is_empty());
        }
        other => panic!("expected Reconstruction error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_remove_cleans_fragment_files() {
    let vault = TestVault::new(1024);
    let record = vault
        .engine
        .ingest("swept.bin", &test_data(5000))
        .await
        .unwrap();

    let fragment = vault.fragment_path(record.file_id, 0);
    assert!(fragment.exists());

    vault.engine.remove(record.file_id).await.unwrap();

    assert!(!fragment.exists(), "fragment files must be deleted");
    assert!(vault.engine.list().await.unwrap().is_empty());
}
