//! Integration stress test: many files of varying sizes through one vault.

use splinter_integration_tests::{test_data_seeded, TestVault};

#[tokio::test]
async fn test_fifty_files_varying_sizes() {
    let vault = TestVault::new(4096);

    let mut files = Vec::new();
    for i in 0..50usize {
        let size = 1 + i * 997; // 1 byte to ~49 KB, never chunk-aligned
        let data = test_data_seeded(size, i as u32 + 1);
        let record = vault
            .engine
            .ingest(&format!("obj-{i:03}.bin"), &data)
            .await
            .unwrap();
        files.push((record.file_id, data));
    }

    assert_eq!(vault.engine.list().await.unwrap().len(), 50);

    for (file_id, expected) in &files {
        let got = vault.engine.retrieve(*file_id).await.unwrap();
        assert_eq!(&got, expected, "mismatch for {file_id}");
    }

    // Remove every other file; the rest must stay intact.
    for (file_id, _) in files.iter().step_by(2) {
        vault.engine.remove(*file_id).await.unwrap();
    }
    for (i, (file_id, expected)) in files.iter().enumerate() {
        if i % 2 == 0 {
            assert!(vault.engine.retrieve(*file_id).await.is_err());
        } else {
            assert_eq!(&vault.engine.retrieve(*file_id).await.unwrap(), expected);
        }
    }
}
