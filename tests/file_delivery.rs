//! File delivery atomicity under concurrent readers.

use keyline::delivery::{DeliveryAdapter, DeliveryTarget, FileDelivery};
use keyline::secrets::Secret;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A reader polling the target during repeated rotations must only ever see
/// one payload in full, never a mix or a truncation.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reader_never_sees_torn_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rotating-secret");
    let target = DeliveryTarget::File { path: path.clone(), mode: 0o600 };
    let adapter = FileDelivery::new();

    let payload_a = vec![b'a'; 16 * 1024];
    let payload_b = vec![b'b'; 16 * 1024];

    adapter.apply(&target, &Secret::new("rotating-secret", "v0", payload_a.clone())).await.unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let reader = {
        let stop = Arc::clone(&stop);
        let path = path.clone();
        tokio::task::spawn_blocking(move || {
            let mut reads = 0u32;
            while !stop.load(Ordering::Relaxed) {
                let content = std::fs::read(&path).expect("target file must always exist");
                let all_a = content.iter().all(|&b| b == b'a');
                let all_b = content.iter().all(|&b| b == b'b');
                assert!(
                    (all_a || all_b) && content.len() == 16 * 1024,
                    "observed torn content after {} reads",
                    reads
                );
                reads += 1;
            }
            reads
        })
    };

    for i in 0..100 {
        let payload = if i % 2 == 0 { payload_b.clone() } else { payload_a.clone() };
        let version = format!("v{}", i + 1);
        adapter
            .apply(&target, &Secret::new("rotating-secret", version.as_str(), payload))
            .await
            .unwrap();
    }

    stop.store(true, Ordering::Relaxed);
    let reads = reader.await.unwrap();
    assert!(reads > 0, "reader never observed the file");
}

/// Rotations never leave stray temp files behind.
#[tokio::test]
async fn no_temp_files_left_behind() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("secret");
    let target = DeliveryTarget::File { path, mode: 0o600 };
    let adapter = FileDelivery::new();

    for i in 0..10 {
        let version = format!("v{}", i);
        adapter.apply(&target, &Secret::new("secret", version.as_str(), "payload")).await.unwrap();
    }

    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["secret".to_string()]);
}
