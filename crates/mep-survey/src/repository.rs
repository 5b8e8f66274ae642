//! Project storage. [`JsonFileRepository`] keeps one pretty-printed JSON
//! file per project; [`InMemoryRepository`] backs tests.

use crate::project::Project;
use mep_core::{MepError, MepResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Storage seam for project records. Read at survey start, written on SAVE.
pub trait ProjectRepository {
    /// Load a project; an unknown id yields a fresh empty project.
    fn load(&self, project_id: &str) -> MepResult<Project>;

    fn save(&mut self, project: &Project) -> MepResult<()>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    projects: HashMap<String, Project>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, project_id: &str) -> Option<&Project> {
        self.projects.get(project_id)
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

impl ProjectRepository for InMemoryRepository {
    fn load(&self, project_id: &str) -> MepResult<Project> {
        Ok(self
            .projects
            .get(project_id)
            .cloned()
            .unwrap_or_else(|| Project::new(project_id)))
    }

    fn save(&mut self, project: &Project) -> MepResult<()> {
        self.projects.insert(project.id.clone(), project.clone());
        Ok(())
    }
}

/// One pretty-printed `<id>.json` file per project under a root directory.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    root: PathBuf,
}

impl JsonFileRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, project_id: &str) -> MepResult<PathBuf> {
        let valid = !project_id.is_empty()
            && project_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !project_id.starts_with('.');
        if !valid {
            return Err(MepError::Store(format!("invalid project id '{project_id}'")));
        }
        Ok(self.root.join(format!("{project_id}.json")))
    }

    /// Ids of all stored projects, sorted.
    pub fn list(&self) -> MepResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}

impl ProjectRepository for JsonFileRepository {
    fn load(&self, project_id: &str) -> MepResult<Project> {
        let path = self.path_for(project_id)?;
        if !path.exists() {
            tracing::debug!(project = project_id, "no stored project; starting fresh");
            return Ok(Project::new(project_id));
        }
        let data = fs::read_to_string(&path)
            .map_err(|e| MepError::Store(format!("reading '{}': {e}", path.display())))?;
        serde_json::from_str(&data)
            .map_err(|e| MepError::Store(format!("parsing '{}': {e}", path.display())))
    }

    fn save(&mut self, project: &Project) -> MepResult<()> {
        let path = self.path_for(&project.id)?;
        fs::create_dir_all(&self.root).map_err(|e| {
            MepError::Store(format!("creating '{}': {e}", self.root.display()))
        })?;
        let json = serde_json::to_string_pretty(project)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| MepError::Store(format!("writing '{}': {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| MepError::Store(format!("writing '{}': {e}", path.display())))?;
        tracing::info!(project = %project.id, path = %path.display(), "project saved");
        Ok(())
    }
}
