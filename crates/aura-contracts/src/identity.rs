use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::KvStore;

const USER_KEY: &str = "current_user";
const TOKEN_KEY: &str = "session_token";

/// The identity a request runs under. Owned by the calling context and passed
/// explicitly; nothing in the engine holds ambient auth state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub owner_id: String,
    pub display_name: String,
    pub session_token: Option<String>,
}

impl Identity {
    pub fn new(owner_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            display_name: display_name.into(),
            session_token: None,
        }
    }
}

/// Persists the logged-in identity between process runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: KvStore,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            store: KvStore::new(path),
        }
    }

    pub fn save(&mut self, identity: &Identity) -> anyhow::Result<()> {
        self.store
            .set(USER_KEY, serde_json::to_value(identity)?)?;
        match &identity.session_token {
            Some(token) => self.store.set(TOKEN_KEY, Value::String(token.clone())),
            None => self.store.remove(TOKEN_KEY),
        }
    }

    pub fn load(&mut self) -> Option<Identity> {
        let value = self.store.get(USER_KEY)?;
        serde_json::from_value(value).ok()
    }

    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.store.remove(USER_KEY)?;
        self.store.remove(TOKEN_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_round_trips_identity() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let mut sessions = SessionStore::new(temp.path().join("store.json"));

        assert!(sessions.load().is_none());

        let mut identity = Identity::new("ada", "Ada L.");
        identity.session_token = Some("tok-1".to_string());
        sessions.save(&identity)?;
        assert_eq!(sessions.load(), Some(identity));

        sessions.clear()?;
        assert!(sessions.load().is_none());
        Ok(())
    }

    #[test]
    fn session_survives_a_new_store_instance() -> anyhow::Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("store.json");
        let mut writer = SessionStore::new(&path);
        writer.save(&Identity::new("grace", "Grace H."))?;

        let mut reader = SessionStore::new(path);
        let loaded = reader.load().unwrap();
        assert_eq!(loaded.owner_id, "grace");
        assert_eq!(loaded.session_token, None);
        Ok(())
    }
}
