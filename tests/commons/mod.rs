use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use registry_reader::dispatcher::Dispatcher;
use registry_reader::dispatcher::HttpAdaptor;
use registry_reader::orchestrator::Orchestrator;
use registry_reader::registry::MemKv;
use registry_reader::registry::ServiceRegistry;
use registry_reader::Endpoint;
use registry_reader::Event;
use registry_reader::ObserveMode;
use registry_reader::RegistryConfig;
use registry_reader::RegistryKey;
use registry_reader::Result;
use registry_reader::Service;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use warp::Filter;

pub const PREFIX: &str = "/service-registry";

/// Longest wait for a batch to reach the fake adaptor
pub const BATCH_TIMEOUT: Duration = Duration::from_secs(10);

pub fn service(
    name: &str,
    metadata: &[(&str, &str)],
) -> Service {
    Service {
        name: name.to_string(),
        ns_name: "ns".to_string(),
        metadata: metadata
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

pub fn endpoint(
    serv_name: &str,
    name: &str,
    address: &str,
    port: u16,
) -> Endpoint {
    Endpoint {
        name: name.to_string(),
        serv_name: serv_name.to_string(),
        ns_name: "ns".to_string(),
        address: address.to_string(),
        port,
        metadata: HashMap::new(),
    }
}

pub fn put_service(
    kv: &MemKv,
    srv: &Service,
) {
    kv.put_record(PREFIX, &RegistryKey::Service(srv.key()), srv).unwrap();
}

pub fn put_endpoint(
    kv: &MemKv,
    endp: &Endpoint,
) {
    kv.put_record(PREFIX, &RegistryKey::Endpoint(endp.key()), endp).unwrap();
}

pub fn registry_config(mode: ObserveMode) -> RegistryConfig {
    RegistryConfig {
        required_keys: vec!["profile".to_string()],
        mode,
        poll_interval_in_ms: 1000,
        poll_timeout_in_ms: 1000,
        ..Default::default()
    }
}

/// Adaptor stand-in listening on an ephemeral port; every posted batch is
/// forwarded to the returned receiver.
pub fn start_fake_adaptor() -> (String, mpsc::UnboundedReceiver<Vec<Event>>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let route = warp::post()
        .and(warp::path!("cnwan" / "events"))
        .and(warp::body::json())
        .map(move |batch: Vec<Event>| {
            let _ = tx.send(batch);
            warp::reply()
        });

    let (addr, server): (SocketAddr, _) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);

    (format!("http://{addr}/cnwan"), rx)
}

/// Starts a reader delivering to `adaptor_url`
pub fn start_reader<R: ServiceRegistry>(
    registry: Arc<R>,
    mode: ObserveMode,
    adaptor_url: &str,
    dry_run: bool,
) -> (CancellationToken, JoinHandle<Result<()>>) {
    let adaptor = Arc::new(HttpAdaptor::new(adaptor_url, Duration::from_secs(5)).unwrap());
    let dispatcher = Arc::new(Dispatcher::new(adaptor, dry_run));
    let orchestrator = Orchestrator::new(registry, dispatcher, &registry_config(mode)).unwrap();

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move { orchestrator.run(token).await });

    (cancel, handle)
}

/// Collects delivered events until `count` arrived, in delivery order
pub async fn receive_events(
    rx: &mut mpsc::UnboundedReceiver<Vec<Event>>,
    count: usize,
) -> Vec<Event> {
    let mut events = Vec::new();
    while events.len() < count {
        let batch = timeout(BATCH_TIMEOUT, rx.recv())
            .await
            .expect("no batch delivered in time")
            .expect("fake adaptor stopped");
        events.extend(batch);
    }
    events
}

pub fn sorted_by_name(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| a.name().cmp(b.name()));
    events
}
