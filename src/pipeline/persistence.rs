// Where scenes live between sessions. The engine only sees the SceneStore
// trait; the host picks a directory store, tests use the in-memory one.
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

const MINIACID_DIR: &str = ".miniacid";
const SCENE_EXT: &str = "json";

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene '{0}' not found")]
    NotFound(String),
    #[error("invalid scene name '{0}'")]
    InvalidName(String),
    #[error("scene store i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("scene json is malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Raw storage of serialized scenes, keyed by name.
pub trait SceneStore: Send {
    fn read_scene(&self, name: &str) -> Result<String, SceneError>;
    fn write_scene(&mut self, name: &str, json: &str) -> Result<(), SceneError>;
    /// Sorted, without extensions.
    fn list_scenes(&self) -> Result<Vec<String>, SceneError>;
}

// names become file names, so keep them boring
pub fn validate_scene_name(name: &str) -> Result<&str, SceneError> {
    let trimmed = name.trim();
    let ok = !trimmed.is_empty()
        && trimmed.len() <= 32
        && !trimmed.starts_with('.')
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '));
    if ok {
        Ok(trimmed)
    } else {
        Err(SceneError::InvalidName(name.to_string()))
    }
}

/// One JSON file per scene under `<project_dir>/.miniacid/`.
#[derive(Debug, Clone)]
pub struct DirSceneStore {
    root: PathBuf,
}

impl DirSceneStore {
    pub fn new(project_dir: &Path) -> Self {
        Self { root: project_dir.join(MINIACID_DIR) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // <project_dir>/.miniacid/<name>.json
    fn scene_path(&self, name: &str) -> Result<PathBuf, SceneError> {
        let name = validate_scene_name(name)?;
        Ok(self.root.join(format!("{name}.{SCENE_EXT}")))
    }
}

impl SceneStore for DirSceneStore {
    fn read_scene(&self, name: &str) -> Result<String, SceneError> {
        let path = self.scene_path(name)?;
        match std::fs::read_to_string(&path) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SceneError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    // making the directory if it doesn't exist yet
    fn write_scene(&mut self, name: &str, json: &str) -> Result<(), SceneError> {
        let path = self.scene_path(name)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(&path, json)?;
        Ok(())
    }

    fn list_scenes(&self) -> Result<Vec<String>, SceneError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SCENE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_scene_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySceneStore {
    scenes: HashMap<String, String>,
}

impl MemorySceneStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SceneStore for MemorySceneStore {
    fn read_scene(&self, name: &str) -> Result<String, SceneError> {
        let name = validate_scene_name(name)?;
        self.scenes.get(name).cloned().ok_or_else(|| SceneError::NotFound(name.to_string()))
    }

    fn write_scene(&mut self, name: &str, json: &str) -> Result<(), SceneError> {
        let name = validate_scene_name(name)?;
        self.scenes.insert(name.to_string(), json.to_string());
        Ok(())
    }

    fn list_scenes(&self) -> Result<Vec<String>, SceneError> {
        let mut names: Vec<String> = self.scenes.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}
