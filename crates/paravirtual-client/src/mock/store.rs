//! Generic in-memory object store for the mock client

use crate::error::ClientError;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct ObjectStore<K> {
    objects: Arc<Mutex<BTreeMap<(String, String), K>>>,
    next_version: Arc<Mutex<u64>>,
}

impl<K> Default for ObjectStore<K> {
    fn default() -> Self {
        Self {
            objects: Arc::new(Mutex::new(BTreeMap::new())),
            next_version: Arc::new(Mutex::new(1)),
        }
    }
}

impl<K> ObjectStore<K>
where
    K: Resource<DynamicType = ()> + Clone,
{
    fn bump(&self) -> String {
        let mut version = self.next_version.lock().unwrap();
        let current = *version;
        *version += 1;
        current.to_string()
    }

    fn key(obj: &K) -> Result<(String, String), ClientError> {
        let namespace = obj
            .namespace()
            .ok_or_else(|| ClientError::InvalidRequest("object has no namespace".to_string()))?;
        let name = obj
            .meta()
            .name
            .clone()
            .ok_or_else(|| ClientError::InvalidRequest("object has no name".to_string()))?;
        Ok((namespace, name))
    }

    /// Insert or overwrite without version checks (test setup)
    pub(crate) fn seed(&self, mut obj: K) {
        let namespace = obj.namespace().unwrap_or_default();
        let name = obj.name_any();
        obj.meta_mut().resource_version = Some(self.bump());
        self.objects.lock().unwrap().insert((namespace, name), obj);
    }

    pub(crate) fn peek(&self, namespace: &str, name: &str) -> Option<K> {
        self.objects
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub(crate) fn get(&self, namespace: &str, name: &str) -> Result<K, ClientError> {
        self.peek(namespace, name).ok_or_else(|| {
            ClientError::NotFound(format!("{} {}/{} not found", K::kind(&()), namespace, name))
        })
    }

    pub(crate) fn list(&self, namespace: &str, label_selector: Option<&str>) -> Vec<K> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .map(|(_, obj)| obj)
            .filter(|obj| label_selector.is_none_or(|selector| matches_selector(*obj, selector)))
            .cloned()
            .collect()
    }

    pub(crate) fn create(&self, obj: &K) -> Result<K, ClientError> {
        let key = Self::key(obj)?;
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&key) {
            return Err(ClientError::Conflict(format!(
                "{} {}/{} already exists",
                K::kind(&()),
                key.0,
                key.1
            )));
        }

        let mut created = obj.clone();
        let version = self.bump();
        created.meta_mut().uid = Some(format!("uid-{}", version));
        created.meta_mut().resource_version = Some(version);
        objects.insert(key, created.clone());
        Ok(created)
    }

    /// Replace; a `resourceVersion` that differs from the stored one conflicts,
    /// an absent one is an unconditional write.
    pub(crate) fn update(&self, obj: &K) -> Result<K, ClientError> {
        let key = Self::key(obj)?;
        let mut objects = self.objects.lock().unwrap();
        let stored = objects.get(&key).ok_or_else(|| {
            ClientError::NotFound(format!("{} {}/{} not found", K::kind(&()), key.0, key.1))
        })?;

        if let Some(version) = &obj.meta().resource_version
            && stored.meta().resource_version.as_ref() != Some(version)
        {
            return Err(ClientError::Conflict(format!(
                "{} {}/{} was modified (have {}, stored {:?})",
                K::kind(&()),
                key.0,
                key.1,
                version,
                stored.meta().resource_version
            )));
        }

        let mut updated = obj.clone();
        updated.meta_mut().uid = stored.meta().uid.clone();
        updated.meta_mut().resource_version = Some(self.bump());
        objects.insert(key, updated.clone());
        Ok(updated)
    }

    pub(crate) fn delete(&self, namespace: &str, name: &str) -> Result<(), ClientError> {
        self.objects
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| {
                ClientError::NotFound(format!("{} {}/{} not found", K::kind(&()), namespace, name))
            })
    }
}

/// Equality-based selector: `k=v`, `k==v`, `k!=v` and bare `k` (exists),
/// comma separated.
fn matches_selector<K: Resource>(obj: &K, selector: &str) -> bool {
    let labels = obj.labels();
    selector
        .split(',')
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .all(|term| {
            if let Some((key, value)) = term.split_once("!=") {
                labels.get(key.trim()).map(String::as_str) != Some(value.trim())
            } else if let Some((key, value)) = term.split_once("==").or_else(|| term.split_once('=')) {
                labels.get(key.trim()).map(String::as_str) == Some(value.trim())
            } else {
                labels.contains_key(term)
            }
        })
}
