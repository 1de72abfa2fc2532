use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use jobdeck_core::{ActionOverlay, PersistenceError, StorageAdapter};
use jobdeck_logging::{deck_debug, deck_info};

use crate::persist::AtomicFileWriter;

pub const OVERLAY_FILENAME: &str = "action_overlay.json";

/// Persists the overlay as JSON in a state directory that outlives the session.
pub struct FileStorage {
    dir: PathBuf,
    writer: AtomicFileWriter,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            writer: AtomicFileWriter::new(dir.clone()),
            dir,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(OVERLAY_FILENAME)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl StorageAdapter for FileStorage {
    fn load(&self) -> Result<Option<ActionOverlay>, PersistenceError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                deck_debug!("No persisted overlay at {:?}", path);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let overlay = ActionOverlay::from_json(&content)?;
        deck_info!("Loaded persisted overlay v{} from {:?}", overlay.version, path);
        Ok(Some(overlay))
    }

    fn save(&mut self, overlay: &ActionOverlay) -> Result<(), PersistenceError> {
        let content = overlay.to_json()?;
        self.writer.write(OVERLAY_FILENAME, &content)?;
        Ok(())
    }
}
