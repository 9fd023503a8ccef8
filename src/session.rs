use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::RequiredAction;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no platform data directory available")]
    NoDataDir,
    #[error("failed to write session file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode session file: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable per-game client state. Nothing here is authoritative; it only
/// restores the local seat between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub confirmed_role_id: Option<String>,
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default)]
    active_game_id: Option<Uuid>,
    #[serde(default)]
    api_base_override: Option<String>,
    #[serde(default)]
    games: BTreeMap<Uuid, SessionRecord>,
}

/// Sole mutator of the on-disk session file. Everything else treats session
/// state as read-only.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    file: SessionFile,
}

impl SessionStore {
    pub fn open_default() -> Result<Self, SessionError> {
        let dir = dirs::data_dir()
            .ok_or(SessionError::NoDataDir)?
            .join("mercury-client");
        Ok(Self::open(dir.join("session.json")))
    }

    /// A missing or unreadable file starts empty; session state is not worth
    /// failing startup over.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file = fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self { path, file }
    }

    pub fn active_game_id(&self) -> Option<Uuid> {
        self.file.active_game_id
    }

    pub fn api_base_override(&self) -> Option<&str> {
        self.file.api_base_override.as_deref()
    }

    /// Record for one game; absent records read as empty, never an error.
    pub fn load_for_game(&self, game_id: Uuid) -> SessionRecord {
        self.file.games.get(&game_id).cloned().unwrap_or_default()
    }

    pub fn persist_active_game(&mut self, game_id: Option<Uuid>) -> Result<(), SessionError> {
        self.file.active_game_id = game_id;
        self.save()
    }

    pub fn persist_confirmed_role(
        &mut self,
        game_id: Uuid,
        role_id: Option<String>,
    ) -> Result<(), SessionError> {
        self.file.games.entry(game_id).or_default().confirmed_role_id = role_id;
        self.save()
    }

    pub fn persist_required_action(
        &mut self,
        game_id: Uuid,
        action: Option<RequiredAction>,
    ) -> Result<(), SessionError> {
        self.file.games.entry(game_id).or_default().required_action = action;
        self.save()
    }

    pub fn persist_api_base(&mut self, base_url: Option<String>) -> Result<(), SessionError> {
        self.file.api_base_override = base_url;
        self.save()
    }

    pub fn clear_all(&mut self) -> Result<(), SessionError> {
        self.file = SessionFile::default();
        self.save()
    }

    fn save(&self) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SessionError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.file)?;
        fs::write(&self.path, json).map_err(|source| SessionError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[test]
    fn test_absent_record_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path().join("session.json"));
        assert_eq!(store.active_game_id(), None);
        assert_eq!(store.load_for_game(game(1)), SessionRecord::default());
    }

    #[test]
    fn test_round_trip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = SessionStore::open(&path);
        store.persist_active_game(Some(game(7))).unwrap();
        store
            .persist_confirmed_role(game(7), Some("USA".to_string()))
            .unwrap();
        store
            .persist_required_action(game(7), Some(RequiredAction::HumanDebate))
            .unwrap();

        let reopened = SessionStore::open(&path);
        assert_eq!(reopened.active_game_id(), Some(game(7)));
        let record = reopened.load_for_game(game(7));
        assert_eq!(record.confirmed_role_id.as_deref(), Some("USA"));
        assert_eq!(record.required_action, Some(RequiredAction::HumanDebate));
    }

    #[test]
    fn test_required_action_is_scoped_per_game() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = SessionStore::open(dir.path().join("session.json"));
        store
            .persist_required_action(game(1), Some(RequiredAction::HumanDebate))
            .unwrap();
        store
            .persist_required_action(game(2), Some(RequiredAction::HumanDebate))
            .unwrap();

        // Clearing g1 must not touch g2.
        store.persist_required_action(game(1), None).unwrap();
        assert_eq!(store.load_for_game(game(1)).required_action, None);
        assert_eq!(
            store.load_for_game(game(2)).required_action,
            Some(RequiredAction::HumanDebate)
        );
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let store = SessionStore::open(&path);
        assert_eq!(store.active_game_id(), None);
    }

    #[test]
    fn test_clear_all_wipes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let mut store = SessionStore::open(&path);
        store.persist_active_game(Some(game(3))).unwrap();
        store
            .persist_api_base(Some("http://localhost:9000".to_string()))
            .unwrap();
        store.clear_all().unwrap();

        let reopened = SessionStore::open(&path);
        assert_eq!(reopened.active_game_id(), None);
        assert_eq!(reopened.api_base_override(), None);
        assert_eq!(reopened.load_for_game(game(3)), SessionRecord::default());
    }
}
