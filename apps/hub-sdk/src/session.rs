//! Persisted client session: user identity plus known community
//! memberships.
//!
//! Memberships survive restarts. They are reloaded at session start and fed
//! to the membership synchronizer so the backend can re-attach the
//! connection to every hub the user already belongs to.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use gamerhub_common::normalize_slug;

use crate::error::SdkError;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    user_id: String,
    username: String,
    communities: Vec<String>,
}

pub struct SessionState {
    user_id: String,
    username: String,
    communities: Mutex<HashSet<String>>,
    path: Option<PathBuf>,
}

impl SessionState {
    /// An in-memory session that is never written to disk.
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            communities: Mutex::new(HashSet::new()),
            path: None,
        }
    }

    /// A session persisted to `path` on every membership change.
    pub fn with_path(
        user_id: impl Into<String>,
        username: impl Into<String>,
        path: PathBuf,
    ) -> Self {
        Self {
            path: Some(path),
            ..Self::new(user_id, username)
        }
    }

    /// Reload a previously persisted session. `Ok(None)` when no session
    /// file exists yet.
    pub fn load(path: &Path) -> Result<Option<Self>, SdkError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let persisted: PersistedSession = serde_json::from_str(&raw)?;

        let communities = persisted
            .communities
            .iter()
            .map(|slug| normalize_slug(slug))
            .filter(|slug| !slug.is_empty())
            .collect();

        Ok(Some(Self {
            user_id: persisted.user_id,
            username: persisted.username,
            communities: Mutex::new(communities),
            path: Some(path.to_path_buf()),
        }))
    }

    /// Default on-disk location for the session file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("gamerhub").join("session.json"))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Known community memberships, normalized and sorted.
    pub fn communities(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.communities.lock().iter().cloned().collect();
        slugs.sort();
        slugs
    }

    /// Record a membership. Returns `true` when it was new; persists the
    /// session when a path is configured. Persistence failures are logged
    /// rather than surfaced; a full disk must not break joining a hub.
    pub fn add_community(&self, slug: &str) -> bool {
        let slug = normalize_slug(slug);
        if slug.is_empty() {
            return false;
        }
        let added = self.communities.lock().insert(slug);
        if added {
            if let Err(error) = self.save() {
                tracing::warn!(%error, "failed to persist session");
            }
        }
        added
    }

    fn save(&self) -> Result<(), SdkError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let persisted = PersistedSession {
            user_id: self.user_id.clone(),
            username: self.username.clone(),
            communities: self.communities(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&persisted)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join("hub-sdk-tests")
            .join(format!("session-{}.json", ulid::Ulid::new()))
    }

    #[test]
    fn memberships_are_normalized_and_sorted() {
        let session = SessionState::new("usr_1", "dana");

        assert!(session.add_community("RPG"));
        assert!(!session.add_community(" rpg "));
        assert!(session.add_community("fps"));
        assert!(!session.add_community("   "));

        assert_eq!(session.communities(), vec!["fps", "rpg"]);
    }

    #[test]
    fn persists_and_reloads() {
        let path = scratch_path();
        let session = SessionState::with_path("usr_1", "dana", path.clone());
        session.add_community("rpg");
        session.add_community("FPS");

        let reloaded = SessionState::load(&path)
            .expect("load session")
            .expect("session exists");
        assert_eq!(reloaded.user_id(), "usr_1");
        assert_eq!(reloaded.username(), "dana");
        assert_eq!(reloaded.communities(), vec!["fps", "rpg"]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn missing_file_loads_as_none() {
        let path = scratch_path();
        assert!(SessionState::load(&path).expect("load").is_none());
    }
}
