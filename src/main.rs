use std::sync::Arc;

use registry_reader::dispatcher::Dispatcher;
use registry_reader::dispatcher::HttpAdaptor;
use registry_reader::metrics;
use registry_reader::orchestrator::Orchestrator;
use registry_reader::registry::FileKv;
use registry_reader::registry::KvRegistry;
use registry_reader::utils::spawn_task;
use registry_reader::Error;
use registry_reader::LogConfig;
use registry_reader::ReaderConfig;
use registry_reader::Result;
use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> Result<()> {
    let config = ReaderConfig::new()?.validate()?;

    // Initializing Logs
    let _guard = init_observability(&config.log)?;

    let cancel = CancellationToken::new();

    if config.monitoring.prometheus_enabled {
        spawn_task(
            "metrics",
            metrics::start_server(config.monitoring.prometheus_port, cancel.clone()),
        );
    }

    let file_path = config
        .registry
        .file_path
        .clone()
        .ok_or_else(|| Error::InvalidConfig("registry.file_path is required".into()))?;
    let kv = Arc::new(FileKv::new(&file_path, config.registry.file_refresh_interval()));
    let registry = Arc::new(KvRegistry::new(kv, &config.registry.prefix));

    let adaptor = Arc::new(HttpAdaptor::new(&config.adaptor.url, config.adaptor.timeout())?);
    let dispatcher = Arc::new(Dispatcher::new(adaptor, config.adaptor.dry_run));
    let orchestrator = Orchestrator::new(registry, dispatcher, &config.registry)?;

    info!(
        registry = %file_path.display(),
        adaptor = %config.adaptor.url,
        "registry reader started. Waiting for CTRL+C signal..."
    );

    spawn_task("shutdown", graceful_shutdown(cancel.clone()));

    orchestrator.run(cancel).await?;

    info!("good bye!");
    Ok(())
}

async fn graceful_shutdown(cancel: CancellationToken) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt()).map_err(|e| Error::Fatal(e.to_string()))?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(|e| Error::Fatal(e.to_string()))?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
        _ = cancel.cancelled() => return Ok(()),
    }

    cancel.cancel();
    Ok(())
}

fn env_filter(log: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log.default_level()))
}

pub fn init_observability(log: &LogConfig) -> Result<Option<WorkerGuard>> {
    let stdout_layer = tracing_subscriber::fmt::layer().with_filter(env_filter(log));

    let (file_layer, guard) = match &log.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|e| {
                Error::Fatal(format!("cannot create log dir {}: {e}", dir.display()))
            })?;
            let (non_blocking, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, "reader.log"));
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_filter(env_filter(log));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
