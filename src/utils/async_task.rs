use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::error;

use crate::RegistryError;
use crate::Result;

/// Runs a registry call, turning an elapsed deadline into
/// [`RegistryError::Timeout`].
pub(crate) async fn registry_call_with_timeout<F, T>(
    task: F,
    timeout_duration: Duration,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(timeout_duration, task).await {
        Ok(result) => result,
        Err(_) => Err(RegistryError::Timeout(timeout_duration).into()),
    }
}

/// Spawns a named task whose error is logged rather than lost
pub fn spawn_task<Fut>(
    name: &str,
    task: Fut,
) -> JoinHandle<()>
where
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let name = name.to_string();
    tokio::spawn(async move {
        if let Err(e) = task.await {
            error!(task = %name, error = %e, "task stopped with an error");
        }
    })
}
