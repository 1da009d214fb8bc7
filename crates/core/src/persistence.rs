use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use serde::Serialize;
use serde_json::Value;

use crate::{error::Result, normalize::session_from_payload, types::Session};

/// Name of the durable slot holding the current analysis.
pub const STATE_KEY: &str = "videoAnalysisState";

/// The only state surviving a restart. Chat history is never part of it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub session: Option<Session>,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    #[serde(rename = "videoData")]
    video_data: Option<&'a Session>,
}

impl PersistedState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Some(session),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&Snapshot {
            video_data: self.session.as_ref(),
        })?)
    }

    /// Parse a `{videoData: ...}` snapshot. The payload goes through the same
    /// mapping as analyze responses, so snapshots holding the raw nested
    /// server payload restore too. A snapshot without a video id holds no
    /// session.
    pub fn from_json(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let session = match value.get("videoData") {
            None | Some(Value::Null) => None,
            Some(data) => {
                let session = session_from_payload(data);
                (!session.video_id.is_empty()).then_some(session)
            }
        };
        Ok(Self { session })
    }
}

/// Durable key-value slot for [`PersistedState`]. Writes replace the whole
/// snapshot; the last writer wins.
pub trait StatePort {
    fn save(&self, state: &PersistedState) -> Result<()>;
    fn load(&self) -> Result<Option<PersistedState>>;
    fn clear(&self) -> Result<()>;
}

impl<P: StatePort + ?Sized> StatePort for Arc<P> {
    fn save(&self, state: &PersistedState) -> Result<()> {
        (**self).save(state)
    }

    fn load(&self) -> Result<Option<PersistedState>> {
        (**self).load()
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }
}

/// Get the root data directory for ytbuddy
pub fn get_root_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("ytbuddy")
}

/// Get the path of the persisted state file
pub fn get_state_path(data_dir: &Path) -> PathBuf {
    data_dir.join(format!("{}.json", STATE_KEY))
}

pub struct FileStatePort {
    path: PathBuf,
}

impl FileStatePort {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileStatePort {
    fn default() -> Self {
        Self::new(get_state_path(&get_root_data_dir()))
    }
}

impl StatePort for FileStatePort {
    fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Rename over the old file so readers never see a partial snapshot.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, state.to_json()?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedState>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(PersistedState::from_json(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory slot holding the serialized snapshot.
#[derive(Default)]
pub struct MemoryStatePort {
    slot: Mutex<Option<String>>,
}

impl MemoryStatePort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.slot.lock().expect("MemoryStatePort poisoned").clone()
    }
}

impl StatePort for MemoryStatePort {
    fn save(&self, state: &PersistedState) -> Result<()> {
        let json = state.to_json()?;
        *self.slot.lock().expect("MemoryStatePort poisoned") = Some(json);
        Ok(())
    }

    fn load(&self) -> Result<Option<PersistedState>> {
        let raw = self.raw();
        raw.map(|r| PersistedState::from_json(&r)).transpose()
    }

    fn clear(&self) -> Result<()> {
        *self.slot.lock().expect("MemoryStatePort poisoned") = None;
        Ok(())
    }
}
