use std::sync::Arc;
use std::time::Duration;

use registry_reader::registry::KvRegistry;
use registry_reader::registry::MemKv;
use registry_reader::EventKind;
use registry_reader::MetadataEntry;
use registry_reader::ObserveMode;

use crate::commons::*;
use crate::enable_logger;

#[tokio::test]
async fn test_poll_reports_initial_state_then_changes() {
    enable_logger();
    let (url, mut batches) = start_fake_adaptor();

    let kv = Arc::new(MemKv::new());
    put_service(&kv, &service("payments", &[("profile", "gold"), ("owner", "team-a")]));
    put_service(&kv, &service("internal", &[("owner", "team-b")]));
    put_endpoint(&kv, &endpoint("payments", "payments-1", "10.0.0.1", 8080));
    put_endpoint(&kv, &endpoint("payments", "payments-2", "10.0.0.2", 8080));
    put_endpoint(&kv, &endpoint("internal", "internal-1", "10.0.1.1", 80));

    let registry = Arc::new(KvRegistry::new(kv.clone(), PREFIX));
    let (cancel, reader) = start_reader(registry, ObserveMode::Poll, &url, false);

    let created = sorted_by_name(receive_events(&mut batches, 2).await);
    assert!(created.iter().all(|e| e.kind == EventKind::Create));
    assert_eq!(created[0].name(), "payments-1");
    assert_eq!(created[1].identity(), ("10.0.0.2", 8080));
    assert_eq!(
        created[0].service.metadata,
        vec![MetadataEntry::new("profile", "gold")]
    );

    put_endpoint(&kv, &endpoint("payments", "payments-2", "10.0.0.3", 8080));
    kv.delete(&registry_reader::endpoint_path(PREFIX, "ns", "payments", "payments-1"));

    let changed = sorted_by_name(receive_events(&mut batches, 2).await);
    assert_eq!(changed[0].kind, EventKind::Delete);
    assert_eq!(changed[0].name(), "payments-1");
    assert_eq!(changed[1].kind, EventKind::Update);
    assert_eq!(changed[1].identity(), ("10.0.0.3", 8080));

    cancel.cancel();
    reader.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_dry_run_never_reaches_the_adaptor() {
    enable_logger();
    let (url, mut batches) = start_fake_adaptor();

    let kv = Arc::new(MemKv::new());
    put_service(&kv, &service("payments", &[("profile", "gold")]));
    put_endpoint(&kv, &endpoint("payments", "payments-1", "10.0.0.1", 8080));

    let registry = Arc::new(KvRegistry::new(kv, PREFIX));
    let (cancel, reader) = start_reader(registry, ObserveMode::Poll, &url, true);

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(batches.try_recv().is_err());

    cancel.cancel();
    reader.await.unwrap().unwrap();
}
