use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::analysis::AnalysisKind;

/// Everything the orchestration layer reports about itself. The discriminant
/// is the `type` field of the logged line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    AnalysisStarted,
    AnalysisCompleted,
    RemoteFailed,
    FallbackEngaged,
    CacheHit,
    CacheError,
    SessionError,
    JobSubmitted,
    JobCompleted,
    JobFailed,
    JobTimeout,
    Login,
    Logout,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::AnalysisStarted => "analysis_started",
            EventKind::AnalysisCompleted => "analysis_completed",
            EventKind::RemoteFailed => "remote_failed",
            EventKind::FallbackEngaged => "fallback_engaged",
            EventKind::CacheHit => "cache_hit",
            EventKind::CacheError => "cache_error",
            EventKind::SessionError => "session_error",
            EventKind::JobSubmitted => "job_submitted",
            EventKind::JobCompleted => "job_completed",
            EventKind::JobFailed => "job_failed",
            EventKind::JobTimeout => "job_timeout",
            EventKind::Login => "login",
            EventKind::Logout => "logout",
        }
    }
}

/// One log line under construction. The builder names the fields the
/// orchestration layer actually logs; free-form keys go through [`field`].
///
/// [`field`]: Event::field
#[derive(Debug, Clone)]
pub struct Event {
    kind: EventKind,
    fields: Map<String, Value>,
}

impl Event {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            fields: Map::new(),
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    /// Tags the line with the analysis kind it concerns.
    pub fn analysis(self, kind: AnalysisKind) -> Self {
        self.field("kind", kind.as_str())
    }

    /// Guest runs log an explicit null owner.
    pub fn owner(self, owner: Option<&str>) -> Self {
        match owner {
            Some(owner) => self.field("owner", owner),
            None => self.field("owner", Value::Null),
        }
    }

    pub fn error(self, message: impl Into<String>) -> Self {
        self.field("error", message.into())
    }

    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

/// Append-only JSONL log of orchestration events.
///
/// One compact object per line: `type`, `session_id` and `ts` first, then the
/// event's own fields. Clones share the file and the session id.
#[derive(Debug, Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

#[derive(Debug)]
struct EventWriterInner {
    path: PathBuf,
    session_id: String,
    lock: Mutex<()>,
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, session_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(EventWriterInner {
                path: path.into(),
                session_id: session_id.into(),
                lock: Mutex::new(()),
            }),
        }
    }

    /// Writer with a fresh random session id.
    pub fn for_session(path: impl Into<PathBuf>) -> Self {
        Self::new(path, uuid::Uuid::new_v4().to_string())
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn session_id(&self) -> &str {
        &self.inner.session_id
    }

    pub fn record(&self, event: Event) -> anyhow::Result<Value> {
        let mut line = Map::new();
        line.insert(
            "type".to_string(),
            Value::String(event.kind.as_str().to_string()),
        );
        line.insert(
            "session_id".to_string(),
            Value::String(self.inner.session_id.clone()),
        );
        line.insert("ts".to_string(), Value::String(now_utc_iso()));
        line.extend(event.fields);

        if let Some(parent) = self.inner.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let serialized = serde_json::to_string(&line)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.inner.path)?;
        file.write_all(serialized.as_bytes())?;
        file.write_all(b"\n")?;

        Ok(Value::Object(line))
    }
}

fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::DateTime;

    use super::*;

    #[test]
    fn record_writes_parseable_jsonl() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::new(&path, "session-7");

        let event = Event::new(EventKind::AnalysisStarted)
            .analysis(AnalysisKind::SkinTone)
            .owner(Some("ada"));
        let recorded = writer.record(event)?;

        let content = fs::read_to_string(&path)?;
        let parsed: Value = serde_json::from_str(content.lines().next().unwrap_or(""))?;
        assert_eq!(parsed, recorded);
        assert_eq!(parsed["type"], Value::String("analysis_started".to_string()));
        assert_eq!(parsed["session_id"], Value::String("session-7".to_string()));
        assert_eq!(parsed["kind"], Value::String("skin_tone".to_string()));
        assert_eq!(parsed["owner"], Value::String("ada".to_string()));
        DateTime::parse_from_rfc3339(parsed["ts"].as_str().unwrap_or(""))?;
        Ok(())
    }

    #[test]
    fn record_appends_one_line_per_event() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("events.jsonl");
        let writer = EventWriter::for_session(&path);

        writer.record(Event::new(EventKind::AnalysisStarted))?;
        writer.record(Event::new(EventKind::FallbackEngaged))?;
        writer.record(Event::new(EventKind::AnalysisCompleted))?;

        let content = fs::read_to_string(&path)?;
        let types: Vec<String> = content
            .lines()
            .map(|line| {
                let row: Value = serde_json::from_str(line).unwrap_or_default();
                row["type"].as_str().unwrap_or("").to_string()
            })
            .collect();
        assert_eq!(
            types,
            vec!["analysis_started", "fallback_engaged", "analysis_completed"]
        );
        Ok(())
    }

    #[test]
    fn guest_owner_is_logged_as_null() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::new(temp.path().join("events.jsonl"), "s");
        let recorded = writer.record(Event::new(EventKind::AnalysisCompleted).owner(None))?;
        assert_eq!(recorded["owner"], Value::Null);
        Ok(())
    }

    #[test]
    fn error_and_numeric_fields_round_trip() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let writer = EventWriter::new(temp.path().join("events.jsonl"), "s");
        let recorded = writer.record(
            Event::new(EventKind::JobCompleted)
                .field("attempts", 3u32)
                .error("none"),
        )?;
        assert_eq!(recorded["type"], Value::String("job_completed".to_string()));
        assert_eq!(recorded["attempts"], Value::Number(3.into()));
        assert_eq!(recorded["error"], Value::String("none".to_string()));
        Ok(())
    }
}
