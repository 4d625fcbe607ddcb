//! Watch cache
//!
//! An eventually-consistent local mirror of one resource type, fed by a
//! `kube::runtime` reflector. The handle (`WatchCache`) is cheap to clone and
//! read from anywhere; the `CacheRunner` owns the watch and must be driven
//! until shutdown.

use crate::error::CacheError;
use futures::StreamExt;
use kube::Resource;
use kube::api::Api;
use kube::runtime::reflector::{self, ObjectRef, Store, store::Writer};
use kube::runtime::{WatchStreamExt, watcher};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Read side of a watch cache.
#[derive(Clone)]
pub struct WatchCache<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    store: Store<K>,
    synced: Arc<AtomicBool>,
}

/// Write side of a watch cache: owns the watch stream.
pub struct CacheRunner<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    api: Api<K>,
    config: watcher::Config,
    writer: Writer<K>,
    synced: Arc<AtomicBool>,
}

/// Create a cache over `api` and the runner that keeps it populated.
pub fn watch_cache<K>(api: Api<K>, config: watcher::Config) -> (WatchCache<K>, CacheRunner<K>)
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    let (store, writer) = reflector::store();
    let synced = Arc::new(AtomicBool::new(false));
    (
        WatchCache {
            store,
            synced: synced.clone(),
        },
        CacheRunner {
            api,
            config,
            writer,
            synced,
        },
    )
}

impl<K> WatchCache<K>
where
    K: Resource<DynamicType = ()> + Clone + 'static,
{
    /// Build an already-synced cache holding `objects`.
    pub fn from_objects(objects: impl IntoIterator<Item = K>) -> Self {
        let (store, mut writer) = reflector::store();
        writer.apply_watcher_event(&watcher::Event::Init);
        for obj in objects {
            writer.apply_watcher_event(&watcher::Event::InitApply(obj));
        }
        writer.apply_watcher_event(&watcher::Event::InitDone);

        Self {
            store,
            synced: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn get_namespaced(&self, namespace: &str, name: &str) -> Option<Arc<K>> {
        self.store.get(&ObjectRef::new(name).within(namespace))
    }

    /// Lookup for cluster-scoped resources.
    pub fn get(&self, name: &str) -> Option<Arc<K>> {
        self.store.get(&ObjectRef::new(name))
    }

    pub fn list_namespaced(&self, namespace: &str) -> Vec<Arc<K>> {
        self.store
            .state()
            .into_iter()
            .filter(|obj| obj.meta().namespace.as_deref() == Some(namespace))
            .collect()
    }

    /// First cached object matching `predicate`, in no particular order.
    pub fn find<P>(&self, predicate: P) -> Option<Arc<K>>
    where
        P: Fn(&K) -> bool,
    {
        self.store.find(predicate)
    }

    /// Whether the initial list has been fully applied.
    pub fn has_synced(&self) -> bool {
        self.synced.load(Ordering::Acquire)
    }

    /// Block until the initial list has been applied.
    pub async fn wait_for_sync(&self) -> Result<(), CacheError> {
        self.store
            .wait_until_ready()
            .await
            .map_err(|_| CacheError::WriterDropped)
    }
}

impl<K> CacheRunner<K>
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    /// Drive the watch until `shutdown` resolves.
    ///
    /// Transient watch errors are retried with the default backoff; the
    /// runner only returns an error if the stream itself ends.
    pub async fn run<F>(self, shutdown: F) -> Result<(), CacheError>
    where
        F: Future<Output = ()>,
    {
        let kind = K::kind(&()).to_string();
        let synced = self.synced;
        let stream = reflector::reflector(self.writer, watcher(self.api, self.config)).default_backoff();
        let mut stream = std::pin::pin!(stream);
        let mut shutdown = std::pin::pin!(shutdown);

        info!("Starting watch cache for {}", kind);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Watch cache for {} shutting down", kind);
                    return Ok(());
                }
                event = stream.next() => match event {
                    Some(Ok(watcher::Event::InitDone)) => {
                        if !synced.swap(true, Ordering::AcqRel) {
                            info!("Watch cache for {} synced", kind);
                        }
                    }
                    Some(Ok(watcher::Event::Apply(obj))) => {
                        debug!("{} {:?} updated in cache", kind, obj.meta().name);
                    }
                    Some(Ok(watcher::Event::Delete(obj))) => {
                        debug!("{} {:?} removed from cache", kind, obj.meta().name);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("Watch error for {} (retrying): {}", kind, e);
                    }
                    None => {
                        return Err(CacheError::Watch(format!("{} watch stream ended", kind)));
                    }
                },
            }
        }
    }
}
