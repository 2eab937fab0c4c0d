use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use registry_reader::registry::FileKv;
use registry_reader::registry::KvRegistry;
use registry_reader::registry::MemKv;
use registry_reader::EventKind;
use registry_reader::MetadataEntry;
use registry_reader::ObserveMode;

use crate::commons::*;
use crate::enable_logger;

#[tokio::test]
async fn test_watch_follows_endpoint_and_service_changes() {
    enable_logger();
    let (url, mut batches) = start_fake_adaptor();

    let kv = Arc::new(MemKv::new());
    put_service(&kv, &service("payments", &[("profile", "gold")]));
    put_endpoint(&kv, &endpoint("payments", "payments-1", "10.0.0.1", 8080));

    let registry = Arc::new(KvRegistry::new(kv.clone(), PREFIX));
    let (cancel, reader) = start_reader(registry, ObserveMode::Watch, &url, false);

    let initial = receive_events(&mut batches, 1).await;
    assert_eq!(initial[0].kind, EventKind::Create);
    assert_eq!(initial[0].identity(), ("10.0.0.1", 8080));

    put_endpoint(&kv, &endpoint("payments", "payments-2", "10.0.0.2", 8080));
    let added = receive_events(&mut batches, 1).await;
    assert_eq!(added[0].kind, EventKind::Create);
    assert_eq!(added[0].name(), "payments-2");

    // Metadata outside the required keys is not reported
    put_service(&kv, &service("payments", &[("profile", "gold"), ("owner", "x")]));
    // The service losing the key removes every instance
    put_service(&kv, &service("payments", &[("owner", "x")]));

    let removed = sorted_by_name(receive_events(&mut batches, 2).await);
    assert!(removed.iter().all(|e| e.kind == EventKind::Delete));
    assert!(removed
        .iter()
        .all(|e| e.service.metadata == vec![MetadataEntry::new("profile", "gold")]));
    assert_eq!(removed[0].name(), "payments-1");
    assert_eq!(removed[1].name(), "payments-2");

    cancel.cancel();
    reader.await.unwrap().unwrap();
}

/// Swaps the registry file in one step so the watcher never reads it half
/// written
fn replace_file(
    path: &Path,
    content: &str,
) {
    let staged = path.with_extension("staged");
    std::fs::write(&staged, content).unwrap();
    std::fs::rename(&staged, path).unwrap();
}

const INITIAL_DOCUMENT: &str = r#"
/service-registry/namespaces/ns/services/payments:
  name: payments
  nsName: ns
  metadata:
    profile: gold
/service-registry/namespaces/ns/services/payments/endpoints/payments-1:
  name: payments-1
  servName: payments
  nsName: ns
  address: 10.0.0.1
  port: 8080
"#;

const EDITED_DOCUMENT: &str = r#"
/service-registry/namespaces/ns/services/payments:
  name: payments
  nsName: ns
  metadata:
    profile: silver
/service-registry/namespaces/ns/services/payments/endpoints/payments-1:
  name: payments-1
  servName: payments
  nsName: ns
  address: 10.0.0.1
  port: 8080
"#;

#[tokio::test]
async fn test_watch_over_a_registry_file() {
    enable_logger();
    let (url, mut batches) = start_fake_adaptor();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.yaml");
    std::fs::write(&path, INITIAL_DOCUMENT).unwrap();

    let kv = Arc::new(FileKv::new(&path, Duration::from_millis(50)));
    let registry = Arc::new(KvRegistry::new(kv, PREFIX));
    let (cancel, reader) = start_reader(registry, ObserveMode::Watch, &url, false);

    let initial = receive_events(&mut batches, 1).await;
    assert_eq!(initial[0].kind, EventKind::Create);
    assert_eq!(
        initial[0].service.metadata,
        vec![MetadataEntry::new("profile", "gold")]
    );

    replace_file(&path, EDITED_DOCUMENT);

    let updated = receive_events(&mut batches, 1).await;
    assert_eq!(updated[0].kind, EventKind::Update);
    assert_eq!(
        updated[0].service.metadata,
        vec![MetadataEntry::new("profile", "silver")]
    );

    cancel.cancel();
    reader.await.unwrap().unwrap();
}

const NAMESPACE_ONLY_DOCUMENT: &str = r#"
/service-registry/namespaces/ns:
  name: ns
"#;

#[tokio::test]
async fn test_watch_reports_service_and_endpoints_removed_in_one_edit() {
    enable_logger();
    let (url, mut batches) = start_fake_adaptor();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.yaml");
    std::fs::write(&path, INITIAL_DOCUMENT).unwrap();

    let kv = Arc::new(FileKv::new(&path, Duration::from_millis(50)));
    let registry = Arc::new(KvRegistry::new(kv, PREFIX));
    let (cancel, reader) = start_reader(registry, ObserveMode::Watch, &url, false);

    let initial = receive_events(&mut batches, 1).await;
    assert_eq!(initial[0].kind, EventKind::Create);

    replace_file(&path, NAMESPACE_ONLY_DOCUMENT);

    let removed = receive_events(&mut batches, 1).await;
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].kind, EventKind::Delete);
    assert_eq!(removed[0].name(), "payments-1");
    assert_eq!(
        removed[0].service.metadata,
        vec![MetadataEntry::new("profile", "gold")]
    );

    cancel.cancel();
    reader.await.unwrap().unwrap();
}
