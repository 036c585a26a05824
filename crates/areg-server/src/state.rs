use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::http::{HeaderMap, HeaderName};
use tokio::sync::Mutex;
use tracing::debug;

use areg_registry::{CallContext, Registry};
use areg_types::Sequence;

use crate::auth::CallerResolver;
use crate::error::{ServerError, ServerResult};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub resolver: Arc<dyn CallerResolver>,
    pub sequence_header: HeaderName,
    pub snapshot_path: Option<PathBuf>,
    /// Leave view and download counters for the periodic flush instead of
    /// writing a snapshot per read.
    pub defer_counters: bool,
    counters_dirty: Arc<AtomicBool>,
    persist_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(
        registry: Arc<Registry>,
        resolver: Arc<dyn CallerResolver>,
        sequence_header: &str,
        snapshot_path: Option<PathBuf>,
        defer_counters: bool,
    ) -> ServerResult<Self> {
        let sequence_header = HeaderName::try_from(sequence_header.to_ascii_lowercase())
            .map_err(|e| ServerError::Config(format!("sequence header '{sequence_header}': {e}")))?;
        Ok(Self {
            registry,
            resolver,
            sequence_header,
            snapshot_path,
            defer_counters,
            counters_dirty: Arc::new(AtomicBool::new(false)),
            persist_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Caller and sequence for one request.
    ///
    /// Without a sequence header the registry stamps the operation itself.
    pub async fn context(&self, headers: &HeaderMap) -> ServerResult<CallContext> {
        let caller = self.resolver.resolve(headers).await?;
        let Some(value) = headers.get(&self.sequence_header) else {
            return Ok(CallContext::unsequenced(caller));
        };
        let seq = value
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Sequence::new)
            .ok_or_else(|| ServerError::BadRequest(format!("{} must be an unsigned integer", self.sequence_header)))?;
        Ok(CallContext::new(caller, seq))
    }

    /// Write the current state to the snapshot file, if one is configured.
    pub async fn persist(&self) -> ServerResult<()> {
        let Some(path) = self.snapshot_path.clone() else {
            return Ok(());
        };
        let _guard = self.persist_lock.lock().await;
        self.counters_dirty.store(false, Ordering::SeqCst);
        let snapshot = self.registry.snapshot()?;
        tokio::task::spawn_blocking(move || snapshot.write_to(&path))
            .await
            .map_err(|e| ServerError::Internal(format!("persist task: {e}")))??;
        Ok(())
    }

    /// Persist after a change that only moved usage counters.
    pub async fn persist_counters(&self) -> ServerResult<()> {
        if self.defer_counters {
            self.counters_dirty.store(true, Ordering::SeqCst);
            Ok(())
        } else {
            self.persist().await
        }
    }

    /// Write a snapshot if counter changes are pending. Returns whether it wrote.
    pub async fn flush_counters(&self) -> ServerResult<bool> {
        if !self.counters_dirty.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.persist().await?;
        debug!("flushed usage counters");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::HeaderCallerResolver;
    use areg_types::Principal;

    fn state(defer_counters: bool, path: Option<PathBuf>) -> AppState {
        AppState::new(
            Arc::new(Registry::default()),
            Arc::new(HeaderCallerResolver::new("x-areg-caller").unwrap()),
            "X-Areg-Sequence",
            path,
            defer_counters,
        )
        .unwrap()
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, value.parse().unwrap());
        }
        map
    }

    #[tokio::test]
    async fn missing_sequence_header_defers_to_registry() {
        let ctx = state(true, None).context(&headers(&[("x-areg-caller", "alice")])).await.unwrap();
        assert_eq!(ctx.caller, Principal::named("alice"));
        assert_eq!(ctx.sequence(), None);
    }

    #[tokio::test]
    async fn sequence_header_is_used_verbatim() {
        let ctx = state(true, None)
            .context(&headers(&[("x-areg-caller", "alice"), ("x-areg-sequence", " 17 ")]))
            .await
            .unwrap();
        assert_eq!(ctx.sequence(), Some(Sequence::new(17)));
    }

    #[tokio::test]
    async fn deferred_counters_flush_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let app = state(true, Some(path.clone()));

        app.persist_counters().await.unwrap();
        assert!(!path.exists());
        assert!(app.flush_counters().await.unwrap());
        assert!(path.exists());
        assert!(!app.flush_counters().await.unwrap());
    }

    #[tokio::test]
    async fn immediate_counters_write_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let app = state(false, Some(path.clone()));

        app.persist_counters().await.unwrap();
        assert!(path.exists());
        assert!(!app.flush_counters().await.unwrap());
    }
}
