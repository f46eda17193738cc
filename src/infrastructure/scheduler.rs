//! Delayed one-shot actions, detached from the dispatch path

use std::time::Duration;

/// Run `action` once after `delay`.
///
/// Uses the current tokio runtime when one is available, else a plain thread.
/// There is no cancellation handle.
pub fn run_after<F>(delay: Duration, action: F)
where
    F: FnOnce() + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                tokio::time::sleep(delay).await;
                // The action may call a blocking client
                if let Err(e) = tokio::task::spawn_blocking(action).await {
                    tracing::error!("Delayed action panicked: {}", e);
                }
            });
        }
        Err(_) => {
            std::thread::spawn(move || {
                std::thread::sleep(delay);
                action();
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_runs_without_runtime() {
        let (tx, rx) = mpsc::channel();
        run_after(Duration::from_millis(10), move || {
            let _ = tx.send(42);
        });
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 42);
    }

    #[tokio::test]
    async fn test_runs_on_runtime() {
        let (tx, rx) = tokio::sync::oneshot::channel();
        run_after(Duration::from_millis(10), move || {
            let _ = tx.send("done");
        });
        let got = tokio::time::timeout(Duration::from_secs(2), rx).await.unwrap().unwrap();
        assert_eq!(got, "done");
    }
}
