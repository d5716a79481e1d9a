//! Stored project configuration: a named client/server repository pair.

use crate::config::{self, ConfigEntity};
use crate::error::{Error, Result};
use crate::paths;
use crate::validation;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(skip)]
    pub id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Overrides the settings default; a repository manifest overrides this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected_branches: Option<Vec<String>>,

    /// Branch or tag that drift is measured against instead of the stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_reference: Option<String>,
}

impl ConfigEntity for Project {
    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn config_dir() -> Result<PathBuf> {
        paths::projects()
    }
    fn not_found_error(id: String, suggestions: Vec<String>) -> Error {
        Error::project_not_found(&id, suggestions)
    }

    fn validate(&self) -> Result<()> {
        for path in [&self.client, &self.server].into_iter().flatten() {
            require_existing(&self.id, path)?;
        }
        if let (Some(client), Some(server)) = (&self.client, &self.server) {
            require_distinct(&self.id, client, server)?;
        }
        if let Some(reference) = &self.drift_reference {
            validation::validate_ref_name("driftReference", reference)?;
        }
        Ok(())
    }
}

/// Both repositories of a project, resolved and checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryPair {
    pub client: PathBuf,
    pub server: PathBuf,
}

impl Project {
    /// Resolve the configured pair, enforcing that both paths are set, exist,
    /// and differ case-insensitively.
    pub fn repository_pair(&self) -> Result<RepositoryPair> {
        let client = self
            .client
            .as_deref()
            .ok_or_else(|| missing_path(&self.id, "client"))?;
        let server = self
            .server
            .as_deref()
            .ok_or_else(|| missing_path(&self.id, "server"))?;

        require_existing(&self.id, client)?;
        require_existing(&self.id, server)?;
        require_distinct(&self.id, client, server)?;

        Ok(RepositoryPair {
            client: PathBuf::from(client),
            server: PathBuf::from(server),
        })
    }
}

/// Changes requested by `config <PROJECT> --client ... --server ...`.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub client: Option<String>,
    pub server: Option<String>,
    pub protected_branches: Option<Vec<String>>,
    pub drift_reference: Option<String>,
}

impl ProjectUpdate {
    pub fn is_empty(&self) -> bool {
        self.client.is_none()
            && self.server.is_none()
            && self.protected_branches.is_none()
            && self.drift_reference.is_none()
    }
}

fn missing_path(id: &str, role: &str) -> Error {
    Error::invalid_config(
        format!("No {} repository configured for project '{}'", role, id),
        json!({ "project": id, "field": role }),
    )
    .with_hint(format!("pairship config {} --{} <path>", id, role))
}

fn require_existing(id: &str, path: &str) -> Result<()> {
    if Path::new(path).is_dir() {
        return Ok(());
    }
    Err(Error::invalid_config(
        format!("Repository path does not exist: {}", path),
        json!({ "project": id, "path": path }),
    )
    .with_hint(format!(
        "Point the project at an existing checkout: pairship config {} --client <path> --server <path>",
        id
    )))
}

fn require_distinct(id: &str, client: &str, server: &str) -> Result<()> {
    if !same_path(Path::new(client), Path::new(server)) {
        return Ok(());
    }
    Err(Error::invalid_config(
        format!("Client and server paths are identical: {}", client),
        json!({ "project": id, "client": client, "server": server }),
    )
    .with_hint(format!(
        "Use two different checkouts: pairship config {} --client <path> --server <path>",
        id
    )))
}

/// Case-insensitive, component-wise comparison after lexical cleanup.
fn same_path(a: &Path, b: &Path) -> bool {
    let a = lexical_clean(a);
    let b = lexical_clean(b);
    a.components().count() == b.components().count()
        && a.components().zip(b.components()).all(|(x, y)| {
            x.as_os_str().to_string_lossy().to_lowercase()
                == y.as_os_str().to_string_lossy().to_lowercase()
        })
}

/// Drop `.` components and fold `..` into its parent without touching the
/// filesystem. Trailing separators disappear with the component split.
fn lexical_clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(cleaned.components().next_back(), Some(Component::Normal(_))) {
                    cleaned.pop();
                } else if !cleaned.has_root() {
                    cleaned.push(component);
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

/// Expand `~`, make relative paths absolute against the current directory,
/// and clean `.`/`..` components and trailing separators.
pub fn normalize_path(raw: &str) -> Result<String> {
    let expanded = PathBuf::from(shellexpand::tilde(raw.trim()).to_string());
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        let cwd = std::env::current_dir().map_err(|e| {
            Error::internal_io(e.to_string(), Some("resolve current directory".to_string()))
        })?;
        cwd.join(expanded)
    };
    Ok(lexical_clean(&absolute).to_string_lossy().to_string())
}

// ============================================================================
// Store operations
// ============================================================================

pub fn load(id: &str) -> Result<Project> {
    config::load(id)
}

pub fn list() -> Result<Vec<Project>> {
    config::list()
}

pub fn exists(id: &str) -> bool {
    Project::config_dir()
        .map(|dir| config::exists_in::<Project>(&dir, id))
        .unwrap_or(false)
}

pub fn find_similar(id: &str) -> Vec<String> {
    config::find_similar_ids::<Project>(id)
}

/// Merge `update` into the stored project (creating it if needed) and save.
pub fn apply_update(id: &str, update: ProjectUpdate) -> Result<Project> {
    apply_update_in(&Project::config_dir()?, id, update)
}

pub(crate) fn apply_update_in(dir: &Path, id: &str, update: ProjectUpdate) -> Result<Project> {
    let mut project = config::load_optional_in::<Project>(dir, id)?.unwrap_or_else(|| Project {
        id: id.to_string(),
        ..Default::default()
    });

    if let Some(client) = update.client {
        project.client = Some(normalize_path(&client)?);
    }
    if let Some(server) = update.server {
        project.server = Some(normalize_path(&server)?);
    }
    if let Some(branches) = update.protected_branches {
        project.protected_branches = Some(branches);
    }
    if let Some(reference) = update.drift_reference {
        project.drift_reference = Some(reference);
    }

    config::save_in(dir, &project)?;
    Ok(project)
}
