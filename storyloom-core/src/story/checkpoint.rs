//! JSON checkpoints for resumable story runs

use super::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads and writes phase checkpoints under a work directory
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Load a checkpoint; a missing or unreadable one yields `None`
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        match serde_json::from_str(&content) {
            Ok(value) => {
                debug!(checkpoint = name, "Loaded checkpoint");
                Ok(Some(value))
            }
            Err(e) => {
                warn!(checkpoint = name, error = %e, "Ignoring corrupt checkpoint");
                Ok(None)
            }
        }
    }

    /// Write a checkpoint, replacing any previous one
    pub fn save<T: Serialize>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path(name);
        let tmp = self.dir.join(format!(".{}.json.tmp", name));
        std::fs::write(&tmp, serde_json::to_string_pretty(value)?)?;
        std::fs::rename(&tmp, &path)?;
        debug!(checkpoint = name, "Saved checkpoint");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Phase {
        text: String,
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::open(&dir.path().join("work")).unwrap();

        assert_eq!(store.load::<Phase>("premise").unwrap(), None);

        let phase = Phase {
            text: "A premise".to_string(),
        };
        store.save("premise", &phase).unwrap();
        assert!(store.path("premise").exists());
        assert_eq!(store.load::<Phase>("premise").unwrap(), Some(phase));
    }

    #[test]
    fn test_corrupt_checkpoint_is_ignored() {
        let dir = tempdir().unwrap();
        let store = CheckpointStore::open(dir.path()).unwrap();
        std::fs::write(store.path("outline"), "{ truncated").unwrap();

        assert_eq!(store.load::<Phase>("outline").unwrap(), None);
    }
}
