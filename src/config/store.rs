//! Live resource table with atomic hot-swap.
//!
//! The active [`Snapshot`] sits behind an [`ArcSwap`]: readers take a cheap
//! `Arc` clone and keep a consistent view for as long as they hold it, while
//! a reload builds a complete replacement off to the side and publishes it
//! with a single pointer store. Reloads are serialized by `reload_lock`;
//! readers never touch that lock.

use arc_swap::ArcSwap;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::loader::{ConfigError, RawResources, ResourceSource};
use crate::observability::metrics;

/// Key in the raw source holding the default-subject pointer.
const DEFAULT_KEY: &str = "default";
/// Sub-key under [`DEFAULT_KEY`] naming the default subject.
const DEFAULT_USER_KEY: &str = "user";

/// Attribute name → value for one resource. Empty values never make it in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    values: BTreeMap<String, String>,
}

impl AttributeSet {
    /// Build from raw deserialized values, dropping nulls and empty strings.
    pub fn from_raw(raw: BTreeMap<String, Option<String>>) -> Self {
        raw.into_iter()
            .filter_map(|(name, value)| value.map(|v| (name, v)))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let values = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v)| !v.is_empty())
            .collect();
        Self { values }
    }
}

/// Immutable, point-in-time view of the resource table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    resources: HashMap<String, AttributeSet>,
    default_subject: Option<String>,
}

impl Snapshot {
    pub fn new(resources: HashMap<String, AttributeSet>, default_subject: Option<String>) -> Self {
        Self {
            resources,
            default_subject: default_subject.filter(|s| !s.is_empty()),
        }
    }

    /// Build a snapshot from the raw source mapping.
    ///
    /// A `default` entry carrying a `user` key is lifted into the default
    /// subject and removed from the table. A `default` entry without `user`
    /// stays an ordinary resource.
    pub fn from_raw(mut raw: RawResources) -> Self {
        let has_default_user = raw
            .get(DEFAULT_KEY)
            .is_some_and(|entry| entry.contains_key(DEFAULT_USER_KEY));

        let default_subject = if has_default_user {
            raw.remove(DEFAULT_KEY)
                .and_then(|mut entry| entry.remove(DEFAULT_USER_KEY))
                .flatten()
        } else {
            None
        };

        let resources = raw
            .into_iter()
            .map(|(id, attrs)| (id, AttributeSet::from_raw(attrs)))
            .collect();

        Self::new(resources, default_subject)
    }

    pub fn lookup(&self, id: &str) -> Option<&AttributeSet> {
        self.resources.get(id)
    }

    pub fn default_subject(&self) -> Option<&str> {
        self.default_subject.as_deref()
    }

    /// Number of resources (the default entry excluded).
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Resource identifiers in sorted order.
    pub fn resource_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.resources.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Owner of the active snapshot.
pub struct ConfigStore {
    source: Box<dyn ResourceSource>,
    current: ArcSwap<Snapshot>,
    reload_lock: Mutex<()>,
}

impl ConfigStore {
    /// Read the source and build a fresh snapshot. Touches no store.
    pub fn load(source: &dyn ResourceSource) -> Result<Snapshot, ConfigError> {
        source.fetch().map(Snapshot::from_raw)
    }

    /// Perform the initial load. Errors here mean there is nothing to serve.
    pub fn open(source: impl ResourceSource + 'static) -> Result<Self, ConfigError> {
        let snapshot = Self::load(&source)?;
        tracing::info!(
            source = %source.describe(),
            resources = snapshot.len(),
            default_subject = snapshot.default_subject().unwrap_or(""),
            "Resource table loaded"
        );
        metrics::record_resource_count(snapshot.len());
        Ok(Self::with_snapshot(source, snapshot))
    }

    /// Start from an already-built snapshot; later reloads use `source`.
    pub fn with_snapshot(source: impl ResourceSource + 'static, snapshot: Snapshot) -> Self {
        Self {
            source: Box::new(source),
            current: ArcSwap::from_pointee(snapshot),
            reload_lock: Mutex::new(()),
        }
    }

    /// The active snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn source(&self) -> &dyn ResourceSource {
        self.source.as_ref()
    }

    /// Reload from the source and publish the result.
    ///
    /// On failure the previous snapshot stays active and the error is
    /// returned after being logged. Concurrent callers queue up behind each
    /// other; readers are never blocked.
    pub fn reload(&self) -> Result<Arc<Snapshot>, ConfigError> {
        let _guard = self
            .reload_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        match Self::load(self.source.as_ref()) {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.current.store(Arc::clone(&snapshot));
                tracing::info!(
                    source = %self.source.describe(),
                    resources = snapshot.len(),
                    "Resource table reloaded"
                );
                metrics::record_reload(true);
                metrics::record_resource_count(snapshot.len());
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    source = %self.source.describe(),
                    error = %e,
                    "Failed to reload resource table. Keeping current snapshot."
                );
                metrics::record_reload(false);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("source", &self.source.describe())
            .field("resources", &self.current.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::StaticSource;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn raw(entries: &[(&str, &[(&str, Option<&str>)])]) -> RawResources {
        entries
            .iter()
            .map(|(id, attrs)| {
                let attrs = attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
                    .collect();
                (id.to_string(), attrs)
            })
            .collect()
    }

    /// Serves a scripted sequence of results, repeating the last one.
    struct ScriptedSource {
        steps: Vec<Option<RawResources>>,
        calls: AtomicUsize,
    }

    impl ResourceSource for ScriptedSource {
        fn describe(&self) -> String {
            "scripted".to_string()
        }

        fn fetch(&self) -> Result<RawResources, ConfigError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            let step = &self.steps[call.min(self.steps.len() - 1)];
            step.clone().ok_or_else(|| ConfigError::NotFound {
                origin: self.describe(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            })
        }
    }

    #[test]
    fn test_attribute_set_drops_empty_and_null() {
        let attrs = AttributeSet::from_raw(BTreeMap::from([
            ("profile".to_string(), Some("https://example.com/alice".to_string())),
            ("avatar".to_string(), Some(String::new())),
            ("github".to_string(), None),
        ]));

        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("profile"), Some("https://example.com/alice"));
        assert_eq!(attrs.get("avatar"), None);
        assert_eq!(attrs.get("github"), None);
    }

    #[test]
    fn test_default_entry_extracted() {
        let snapshot = Snapshot::from_raw(raw(&[
            ("alice", &[("profile", Some("https://example.com/alice"))]),
            ("default", &[("user", Some("alice"))]),
        ]));

        assert_eq!(snapshot.default_subject(), Some("alice"));
        assert!(snapshot.lookup("default").is_none());
        assert_eq!(snapshot.resource_ids(), vec!["alice"]);
    }

    #[test]
    fn test_default_without_user_is_a_resource() {
        let snapshot = Snapshot::from_raw(raw(&[(
            "default",
            &[("profile", Some("https://example.com/"))],
        )]));

        assert_eq!(snapshot.default_subject(), None);
        assert!(snapshot.lookup("default").is_some());
    }

    #[test]
    fn test_empty_default_user_is_absent() {
        let snapshot = Snapshot::from_raw(raw(&[("default", &[("user", Some(""))])]));
        assert_eq!(snapshot.default_subject(), None);
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_open_fails_on_missing_source() {
        let source = ScriptedSource {
            steps: vec![None],
            calls: AtomicUsize::new(0),
        };
        assert!(matches!(
            ConfigStore::open(source),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let source = ScriptedSource {
            steps: vec![
                Some(raw(&[("alice", &[("profile", Some("https://a.example/"))])])),
                Some(raw(&[("bob", &[("profile", Some("https://b.example/"))])])),
            ],
            calls: AtomicUsize::new(0),
        };
        let store = ConfigStore::open(source).unwrap();
        let before = store.current();
        assert!(before.lookup("alice").is_some());

        store.reload().unwrap();
        let after = store.current();
        assert!(after.lookup("alice").is_none());
        assert!(after.lookup("bob").is_some());

        // Readers holding the old snapshot keep a consistent view.
        assert!(before.lookup("alice").is_some());
        assert!(before.lookup("bob").is_none());
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let source = ScriptedSource {
            steps: vec![
                Some(raw(&[("alice", &[("profile", Some("https://a.example/"))])])),
                None,
            ],
            calls: AtomicUsize::new(0),
        };
        let store = ConfigStore::open(source).unwrap();
        let before = store.current();

        assert!(store.reload().is_err());
        assert!(Arc::ptr_eq(&before, &store.current()));
        assert_eq!(
            store.current().lookup("alice").and_then(|a| a.get("profile")),
            Some("https://a.example/")
        );
    }

    #[test]
    fn test_readers_never_see_mixed_snapshot() {
        let keys_a: Vec<String> = (0..50).map(|i| format!("a{i}")).collect();
        let keys_b: Vec<String> = (0..50).map(|i| format!("b{i}")).collect();
        let table = |keys: &[String]| -> RawResources {
            keys.iter()
                .map(|k| {
                    (
                        k.clone(),
                        BTreeMap::from([("profile".to_string(), Some(format!("https://{k}/")))]),
                    )
                })
                .collect()
        };

        let steps: Vec<Option<RawResources>> = (0..200)
            .map(|i| Some(if i % 2 == 0 { table(&keys_a) } else { table(&keys_b) }))
            .collect();
        let store = Arc::new(
            ConfigStore::open(ScriptedSource {
                steps,
                calls: AtomicUsize::new(0),
            })
            .unwrap(),
        );

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                let keys_a = keys_a.clone();
                let keys_b = keys_b.clone();
                thread::spawn(move || {
                    for _ in 0..2_000 {
                        let snapshot = store.current();
                        let all_a = keys_a.iter().all(|k| snapshot.lookup(k).is_some());
                        let all_b = keys_b.iter().all(|k| snapshot.lookup(k).is_some());
                        assert_eq!(snapshot.len(), 50);
                        assert!(all_a ^ all_b, "observed a mixed snapshot");
                    }
                })
            })
            .collect();

        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..199 {
                    store.reload().unwrap();
                }
            })
        };

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_static_source_reload_is_stable() {
        let store = ConfigStore::open(StaticSource::new(raw(&[(
            "alice",
            &[("avatar", Some("https://a.example/a.png"))],
        )])))
        .unwrap();
        let reloaded = store.reload().unwrap();
        assert_eq!(*reloaded, *store.current());
        assert_eq!(store.source().describe(), "static");
    }
}
