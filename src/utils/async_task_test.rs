use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::Error;
use crate::RegistryError;

#[tokio::test(start_paused = true)]
async fn test_registry_call_with_timeout_success() {
    let result = registry_call_with_timeout(async { Ok::<_, Error>(7) }, Duration::from_secs(1)).await;
    assert_eq!(result.unwrap(), 7);
}

#[tokio::test(start_paused = true)]
async fn test_registry_call_with_timeout_keeps_inner_error() {
    let result = registry_call_with_timeout(
        async { Err::<(), _>(Error::Registry(RegistryError::Backend("down".into()))) },
        Duration::from_secs(1),
    )
    .await;
    assert!(matches!(result, Err(Error::Registry(RegistryError::Backend(_)))));
}

#[tokio::test(start_paused = true)]
async fn test_registry_call_with_timeout_elapses() {
    let result = registry_call_with_timeout(
        async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, Error>(())
        },
        Duration::from_secs(1),
    )
    .await;
    assert!(matches!(
        result,
        Err(Error::Registry(RegistryError::Timeout(d))) if d == Duration::from_secs(1)
    ));
}

#[tokio::test]
async fn test_spawn_task_runs_to_completion_even_on_error() {
    let ran = Arc::new(AtomicBool::new(false));
    let flag = ran.clone();

    let handle = spawn_task("failing", async move {
        flag.store(true, Ordering::SeqCst);
        Err(Error::Fatal("boom".into()))
    });

    assert!(handle.await.is_ok());
    assert!(ran.load(Ordering::SeqCst));
}
