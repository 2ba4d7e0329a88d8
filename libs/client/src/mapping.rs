//! Cached column mapping with single-flight refresh.
//!
//! The widget holds the last mapping the host reported. A refresh runs
//! when nothing was ever fetched or an inbound notification flags a
//! mapping change; concurrent refresh requests share one in-flight fetch
//! instead of issuing a second round trip, so a burst of notifications
//! (record change and table change citing the same mapping edit) costs
//! one host call.

use crate::host::HostEndpoints;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use types::ColumnMapping;

type MappingFetch = Shared<BoxFuture<'static, Option<ColumnMapping>>>;

#[derive(Default)]
struct CacheState {
    /// Outer `None`: never fetched. Inner `None`: host offers nothing.
    value: Option<Option<ColumnMapping>>,
    /// The one permitted in-flight fetch.
    inflight: Option<MappingFetch>,
}

/// Process-wide mapping cache; single writer, shared readers.
pub struct MappingCache {
    host: Arc<dyn HostEndpoints>,
    state: Arc<Mutex<CacheState>>,
}

impl MappingCache {
    pub fn new(host: Arc<dyn HostEndpoints>) -> Self {
        Self {
            host,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Current mapping, refreshing first when `mappings_change` is set or
    /// nothing was ever fetched. The returned mapping is a deep,
    /// independent copy; callers may mutate it freely.
    pub async fn get_if_changed(&self, mappings_change: bool) -> Option<ColumnMapping> {
        let fetch = {
            let mut state = self.state.lock().await;
            let refresh_needed = mappings_change || state.value.is_none();
            if !refresh_needed {
                return state.value.clone().flatten();
            }
            match &state.inflight {
                Some(fetch) => fetch.clone(),
                None => {
                    let host = Arc::clone(&self.host);
                    let shared_state = Arc::clone(&self.state);
                    let fetch = async move {
                        let fetched = host.mappings().await;
                        let mut state = shared_state.lock().await;
                        state.inflight = None;
                        match fetched {
                            Ok(mapping) => {
                                state.value = Some(mapping.clone());
                                mapping
                            }
                            Err(e) => {
                                // Keep whatever was known before the
                                // failed refresh.
                                warn!("column mapping refresh failed: {}", e);
                                state.value.clone().flatten()
                            }
                        }
                    }
                    .boxed()
                    .shared();
                    state.inflight = Some(fetch.clone());
                    fetch
                }
            }
        };
        fetch.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ClientError, Result};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use types::{MappedColumns, Record, RowId, TableRecords, WidgetConfig};

    struct SlowMappingHost {
        calls: AtomicUsize,
        release: Notify,
        fail: AtomicBool,
    }

    impl SlowMappingHost {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                release: Notify::new(),
                fail: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl HostEndpoints for SlowMappingHost {
        async fn fetch_selected_record(&self, _row_id: RowId) -> Result<Record> {
            unimplemented!("not exercised")
        }

        async fn fetch_selected_table(&self) -> Result<TableRecords> {
            unimplemented!("not exercised")
        }

        async fn mappings(&self) -> Result<Option<ColumnMapping>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::host_call("mappings", "host unreachable"));
            }
            let mut mapping = ColumnMapping::new();
            mapping.insert("title", MappedColumns::Column("A".to_string()));
            Ok(Some(mapping))
        }

        async fn configure(&self, _config: WidgetConfig) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_fetch() {
        let host = SlowMappingHost::new();
        let cache = Arc::new(MappingCache::new(host.clone()));

        let first = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_if_changed(true).await })
        };
        let second = {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_if_changed(true).await })
        };

        // Let both callers reach the cache before the host answers.
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        host.release.notify_waiters();

        let first = first.await.unwrap();
        let second = second.await.unwrap();

        assert_eq!(host.calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[tokio::test]
    async fn test_cached_value_returned_without_flag() {
        let host = SlowMappingHost::new();
        let cache = MappingCache::new(host.clone());

        let fetch = cache.get_if_changed(false);
        host.release.notify_one();
        let initial = fetch.await;
        assert!(initial.is_some());
        assert_eq!(host.calls.load(Ordering::SeqCst), 1);

        // No flag, cache populated: no further host call.
        let cached = cache.get_if_changed(false).await;
        assert_eq!(cached, initial);
        assert_eq!(host.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_value() {
        let host = SlowMappingHost::new();
        let cache = MappingCache::new(host.clone());

        let fetch = cache.get_if_changed(true);
        host.release.notify_one();
        let initial = fetch.await;
        assert!(initial.is_some());

        host.fail.store(true, Ordering::SeqCst);
        let fetch = cache.get_if_changed(true);
        host.release.notify_one();
        let after_failure = fetch.await;

        assert_eq!(after_failure, initial);
        assert_eq!(host.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_returned_copy_is_independent() {
        let host = SlowMappingHost::new();
        let cache = MappingCache::new(host.clone());

        let fetch = cache.get_if_changed(true);
        host.release.notify_one();
        let mut copy = fetch.await.unwrap();
        copy.insert("title", MappedColumns::Column("mutated".to_string()));

        let fresh = cache.get_if_changed(false).await.unwrap();
        assert_eq!(
            fresh.get("title"),
            Some(&MappedColumns::Column("A".to_string()))
        );
    }
}
