use serde::Serialize;
use std::path::{Path, PathBuf};

/// Route prefix under which the clip directory is served.
pub const AUDIO_ROUTE: &str = "/audio";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioFiles {
    pub name: String,
    pub description: String,
}

/// Pre-recorded clips named `sign_<NNN>_name.mp3` and `sign_<NNN>_desc.mp3`.
#[derive(Debug, Clone)]
pub struct AudioClips {
    dir: PathBuf,
}

fn name_file(class_id: usize) -> String {
    format!("sign_{:03}_name.mp3", class_id)
}

fn description_file(class_id: usize) -> String {
    format!("sign_{:03}_desc.mp3", class_id)
}

impl AudioClips {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn urls(&self, class_id: usize) -> AudioFiles {
        AudioFiles {
            name: format!("{}/{}", AUDIO_ROUTE, name_file(class_id)),
            description: format!("{}/{}", AUDIO_ROUTE, description_file(class_id)),
        }
    }

    pub fn paths(&self, class_id: usize) -> (PathBuf, PathBuf) {
        (
            self.dir.join(name_file(class_id)),
            self.dir.join(description_file(class_id)),
        )
    }

    /// Both clips exist on disk.
    pub async fn is_available(&self, class_id: usize) -> bool {
        let (name, description) = self.paths(class_id);
        is_file(&name).await && is_file(&description).await
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false)
}
