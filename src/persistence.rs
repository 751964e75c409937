//! Local document persistence
//!
//! The whole editor state is one camelCase JSON document. Saves write a
//! sibling temp file and rename it over the target so a crash mid-write never
//! leaves a truncated document behind.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};

use crate::constants::card::FIRST_ID;
use crate::constants::config::{APP_DIR, DATA_FILENAME};
use crate::seed::seed_store;
use crate::store::{Card, CardStore, Snapshot};
use crate::types::{CardId, ViewSettings};
use crate::workspace::Workspace;

fn first_id() -> CardId {
    FIRST_ID
}

/// Persisted editor state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub view_settings: ViewSettings,
    #[serde(default = "first_id", alias = "cardIdCounter")]
    pub id_counter: CardId,
    #[serde(with = "time::serde::rfc3339", default = "OffsetDateTime::now_utc")]
    pub last_saved: OffsetDateTime,
}

impl Document {
    pub fn from_workspace(workspace: &Workspace) -> Self {
        let snapshot = workspace.store.export_snapshot();
        Self {
            cards: snapshot.cards,
            view_settings: workspace.settings.clone(),
            id_counter: snapshot.id_counter,
            last_saved: snapshot.timestamp,
        }
    }

    /// Build a workspace; settings are clamped and logo state restarts unloaded
    pub fn into_workspace(self) -> Workspace {
        let mut settings = self.view_settings;
        settings.validate_and_clamp();
        let mut store = CardStore::new();
        store.import_snapshot(Snapshot {
            cards: self.cards,
            id_counter: self.id_counter,
            timestamp: self.last_saved,
        });
        Workspace::new(store, settings)
    }

    /// Replace an existing workspace's cards and settings, keeping whatever selection survives
    pub fn apply_to(self, workspace: &mut Workspace) {
        let mut settings = self.view_settings;
        settings.validate_and_clamp();
        workspace.settings = settings;
        workspace.import_snapshot(Snapshot {
            cards: self.cards,
            id_counter: self.id_counter,
            timestamp: self.last_saved,
        });
    }
}

/// Starting workspace when nothing usable was persisted
pub fn seeded_workspace() -> Workspace {
    let settings = ViewSettings::default();
    let store = seed_store(&settings);
    Workspace::new(store, settings)
}

pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `$XDG_DATA_HOME/card-canvas/canvas.json`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(DATA_FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document; a missing file is `Ok(None)`
    pub fn load(&self) -> Result<Option<Document>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read document: {}", self.path.display()));
            }
        };
        let document = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse document: {}", self.path.display()))?;
        Ok(Some(document))
    }

    /// Load the persisted workspace, falling back to the seed set
    pub fn load_or_seed(&self) -> Workspace {
        match self.load() {
            Ok(Some(document)) => {
                let workspace = document.into_workspace();
                info!(path = %self.path.display(), cards = workspace.store.len(), "Loaded canvas");
                workspace
            }
            Ok(None) => {
                info!(path = %self.path.display(), "No saved canvas, starting from seed");
                seeded_workspace()
            }
            Err(e) => {
                error!(error = ?e, "Saved canvas unreadable, starting from seed");
                seeded_workspace()
            }
        }
    }

    pub fn save(&self, workspace: &Workspace) -> Result<()> {
        self.write(&Document::from_workspace(workspace))
            .inspect_err(|e| error!(path = %self.path.display(), error = ?e, "Failed to save canvas"))
    }

    pub fn write(&self, document: &Document) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create data directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(document).context("Failed to serialize document")?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents).with_context(|| format!("Failed to write {}", tmp.display()))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            warn!(tmp = %tmp.display(), "Rename failed, removing temp file");
            let _ = fs::remove_file(&tmp);
            return Err(e).with_context(|| format!("Failed to replace {}", self.path.display()));
        }

        debug!(path = %self.path.display(), cards = document.cards.len(), "Saved canvas");
        Ok(())
    }
}
