use std::fmt::Display;
use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What a view shows for one fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> FetchState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            FetchState::Loaded(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            FetchState::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Owns one in-flight fetch and the state it publishes.
///
/// Dropping the handle aborts the fetch; a cancelled fetch never publishes.
pub struct FetchHandle<T> {
    state: watch::Receiver<FetchState<T>>,
    task: JoinHandle<()>,
}

pub fn spawn_fetch<T, E, F>(fetch: F) -> FetchHandle<T>
where
    T: Send + Sync + 'static,
    E: Display + Send + 'static,
    F: Future<Output = Result<T, E>> + Send + 'static,
{
    let (tx, rx) = watch::channel(FetchState::Loading);
    let task = tokio::spawn(async move {
        let next = match fetch.await {
            Ok(data) => FetchState::Loaded(data),
            Err(err) => {
                tracing::warn!(error = %err, "Fetch failed");
                FetchState::Failed(err.to_string())
            }
        };
        // The receiver lives as long as the handle, which aborts this task on drop.
        let _ = tx.send(next);
    });

    FetchHandle { state: rx, task }
}

impl<T: Clone> FetchHandle<T> {
    /// Waits until the fetch either loads or fails.
    pub async fn settled(&mut self) -> FetchState<T> {
        match self.state.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => FetchState::Failed("fetch ended without a result".to_string()),
        }
    }
}

impl<T> Drop for FetchHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
