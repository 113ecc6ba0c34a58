use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analysis::{AnalysisKind, AnalysisResult};
use crate::events::{Event, EventKind, EventWriter};

/// Durable string-keyed JSON store.
///
/// The whole store is one JSON object on disk. Writes re-read the file and
/// merge only the keys dirtied by this instance, so independent instances
/// pointed at the same path do not clobber each other's entries.
#[derive(Debug, Clone)]
pub struct KvStore {
    path: PathBuf,
    payload: Option<Map<String, Value>>,
    dirty_keys: Vec<String>,
    removed_keys: Vec<String>,
}

impl KvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            payload: None,
            dirty_keys: Vec::new(),
            removed_keys: Vec::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<Value> {
        self.reload().get(key).cloned()
    }

    pub fn set(&mut self, key: &str, value: Value) -> anyhow::Result<()> {
        let payload = self.reload();
        if payload.get(key) == Some(&value) {
            return Ok(());
        }
        payload.insert(key.to_string(), value);
        mark(&mut self.dirty_keys, key);
        self.removed_keys.retain(|removed| removed != key);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> anyhow::Result<()> {
        let payload = self.reload();
        if payload.remove(key).is_none() {
            return Ok(());
        }
        mark(&mut self.removed_keys, key);
        self.dirty_keys.retain(|dirty| dirty != key);
        self.flush()
    }

    fn flush(&mut self) -> anyhow::Result<()> {
        let Some(payload) = &self.payload else {
            return Ok(());
        };
        let mut on_disk = read_json_object(&self.path).unwrap_or_default();
        for key in &self.dirty_keys {
            if let Some(value) = payload.get(key) {
                on_disk.insert(key.clone(), value.clone());
            }
        }
        for key in &self.removed_keys {
            on_disk.remove(key);
        }
        write_json_object(&self.path, &on_disk)?;
        self.payload = Some(on_disk);
        self.dirty_keys.clear();
        self.removed_keys.clear();
        Ok(())
    }

    // A corrupt or missing file reads as an empty store.
    fn reload(&mut self) -> &mut Map<String, Value> {
        self.payload = Some(read_json_object(&self.path).unwrap_or_default());
        self.payload.as_mut().expect("store payload initialized")
    }
}

fn mark(keys: &mut Vec<String>, key: &str) {
    if !keys.iter().any(|existing| existing == key) {
        keys.push(key.to_string());
    }
}

fn read_json_object(path: &Path) -> Option<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).ok()?;
    let parsed: Value = serde_json::from_str(&raw).ok()?;
    parsed.as_object().cloned()
}

fn write_json_object(path: &Path, payload: &Map<String, Value>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(
        path,
        serde_json::to_string_pretty(&Value::Object(payload.clone()))?,
    )?;
    Ok(())
}

/// One live entry per `(owner, kind)`; a new write replaces the old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedEntry {
    pub owner_id: String,
    pub kind: AnalysisKind,
    pub payload: AnalysisResult,
    pub written_at: String,
}

/// Best-effort per-owner result cache.
///
/// Storage faults are emitted as `cache_error` events and otherwise absorbed:
/// a failed read is a miss, a failed write a no-op.
#[derive(Debug, Clone)]
pub struct ResultCache {
    store: KvStore,
    events: Option<EventWriter>,
}

impl ResultCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: KvStore::new(path),
            events: None,
        }
    }

    pub fn with_events(path: impl Into<PathBuf>, events: EventWriter) -> Self {
        Self {
            store: KvStore::new(path),
            events: Some(events),
        }
    }

    pub fn put(&mut self, owner_id: &str, result: &AnalysisResult) {
        let entry = CachedEntry {
            owner_id: owner_id.to_string(),
            kind: result.kind(),
            payload: result.clone(),
            written_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
        };
        let key = cache_key(owner_id, entry.kind);
        let outcome = serde_json::to_value(&entry)
            .map_err(anyhow::Error::from)
            .and_then(|value| self.store.set(&key, value));
        if let Err(err) = outcome {
            self.log_fault("put", &key, &err);
        }
    }

    pub fn get(&mut self, owner_id: &str, kind: AnalysisKind) -> Option<CachedEntry> {
        let value = self.store.get(&cache_key(owner_id, kind))?;
        serde_json::from_value(value).ok()
    }

    fn log_fault(&self, op: &str, key: &str, err: &anyhow::Error) {
        if let Some(events) = &self.events {
            let _ = events.record(
                Event::new(EventKind::CacheError)
                    .field("op", op)
                    .field("key", key)
                    .error(format!("{err:#}")),
            );
        }
    }
}

fn cache_key(owner_id: &str, kind: AnalysisKind) -> String {
    format!("analysis:{owner_id}:{}", kind.as_str())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::analysis::{BodyShape, BodyShapeResult, SkinConditionResult};

    use super::*;

    fn condition_result(label: &str) -> AnalysisResult {
        AnalysisResult::SkinCondition(SkinConditionResult {
            label: label.to_string(),
            confidence: 70,
            description: "d".to_string(),
        })
    }

    #[test]
    fn kv_store_set_then_get() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut store = KvStore::new(temp.path().join("store.json"));
        store.set("session_token", json!("tok-1"))?;
        assert_eq!(store.get("session_token"), Some(json!("tok-1")));
        assert_eq!(store.get("missing"), None);
        Ok(())
    }

    #[test]
    fn kv_store_merges_with_concurrent_writer() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut store_a = KvStore::new(&path);
        let mut store_b = KvStore::new(&path);

        store_a.set("a", json!(1))?;
        store_b.set("b", json!(2))?;
        store_a.set("c", json!(3))?;

        let mut reloaded = KvStore::new(path);
        assert_eq!(reloaded.get("a"), Some(json!(1)));
        assert_eq!(reloaded.get("b"), Some(json!(2)));
        assert_eq!(reloaded.get("c"), Some(json!(3)));
        Ok(())
    }

    #[test]
    fn kv_store_remove_persists() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut store = KvStore::new(&path);
        store.set("current_user", json!({"username": "ada"}))?;
        store.remove("current_user")?;

        let mut reloaded = KvStore::new(path);
        assert_eq!(reloaded.get("current_user"), None);
        Ok(())
    }

    #[test]
    fn kv_store_treats_corrupt_file_as_empty() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        std::fs::write(&path, b"not json at all")?;

        let mut store = KvStore::new(&path);
        assert_eq!(store.get("anything"), None);
        store.set("key", json!("value"))?;
        assert_eq!(store.get("key"), Some(json!("value")));
        Ok(())
    }

    #[test]
    fn cache_put_then_get_round_trips() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut cache = ResultCache::new(temp.path().join("store.json"));

        assert!(cache.get("ada", AnalysisKind::SkinCondition).is_none());
        cache.put("ada", &condition_result("Normal"));
        let entry = cache.get("ada", AnalysisKind::SkinCondition).unwrap();
        assert_eq!(entry.owner_id, "ada");
        assert_eq!(entry.kind, AnalysisKind::SkinCondition);
        assert_eq!(entry.payload, condition_result("Normal"));
        Ok(())
    }

    #[test]
    fn cache_second_put_supersedes_first() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut cache = ResultCache::new(temp.path().join("store.json"));

        cache.put("ada", &condition_result("Normal"));
        cache.put("ada", &condition_result("Dry"));
        let entry = cache.get("ada", AnalysisKind::SkinCondition).unwrap();
        assert_eq!(entry.payload, condition_result("Dry"));
        Ok(())
    }

    #[test]
    fn cache_keys_are_scoped_per_owner_and_kind() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut cache = ResultCache::new(temp.path().join("store.json"));

        cache.put("ada", &condition_result("Normal"));
        cache.put(
            "ada",
            &AnalysisResult::BodyShape(BodyShapeResult {
                shape: BodyShape::Pear,
                description: "d".to_string(),
                tips: "t".to_string(),
            }),
        );

        assert!(cache.get("grace", AnalysisKind::SkinCondition).is_none());
        assert!(cache.get("ada", AnalysisKind::SkinCondition).is_some());
        assert!(cache.get("ada", AnalysisKind::BodyShape).is_some());
        Ok(())
    }

    #[test]
    fn cache_write_fault_is_absorbed_and_logged() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let events_path = temp.path().join("events.jsonl");
        let events = EventWriter::new(&events_path, "s");
        // A directory at the store path makes every write fail.
        let store_path = temp.path().join("store.json");
        std::fs::create_dir_all(&store_path)?;

        let mut cache = ResultCache::with_events(&store_path, events);
        cache.put("ada", &condition_result("Normal"));
        assert!(cache.get("ada", AnalysisKind::SkinCondition).is_none());

        let log = std::fs::read_to_string(&events_path)?;
        assert!(log.contains("cache_error"));
        Ok(())
    }
}
