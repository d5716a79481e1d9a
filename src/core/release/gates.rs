//! Pure gate decisions. Querying the repositories happens in the pipeline;
//! these functions only judge what was observed.

use std::path::Path;

use crate::defaults::PipelineSettings;
use crate::error::{Error, Result};
use crate::validation;

use super::types::{ProtectedBranches, Stage};

/// Most specific source wins: repository manifest, then project, then the
/// settings default.
pub fn resolve_protected_branches(
    manifest: Option<Vec<String>>,
    project: Option<&[String]>,
    settings: &PipelineSettings,
) -> ProtectedBranches {
    if let Some(branches) = manifest {
        return ProtectedBranches::new(branches);
    }
    if let Some(branches) = project {
        return ProtectedBranches::new(branches.iter().cloned());
    }
    ProtectedBranches::new(settings.protected_branches.iter().cloned())
}

/// CLI override, then the project's configured reference, then the stage.
///
/// The result is unqualified; each repository resolves it against its own
/// remote-tracking refs before comparing.
pub fn resolve_drift_reference(
    cli: Option<&str>,
    project: Option<&str>,
    stage: &Stage,
) -> Result<String> {
    let reference = match cli.map(str::trim).filter(|r| !r.is_empty()) {
        Some(reference) => {
            validation::validate_ref_name("reference", reference)?;
            reference
        }
        None => project.unwrap_or(stage.as_str()),
    };
    Ok(reference.to_string())
}

/// Working tree must have no staged, unstaged or untracked changes.
pub fn check_clean(path: &Path, is_clean: bool) -> Result<()> {
    if !is_clean {
        return Err(Error::repository_dirty(path));
    }
    Ok(())
}

pub fn check_unprotected(path: &Path, branch: &str, protected: &ProtectedBranches) -> Result<()> {
    if protected.contains(branch) {
        return Err(Error::protected_branch(path, branch, protected.as_slice()));
    }
    Ok(())
}

/// Being ahead is fine; being behind by any amount is not.
pub fn check_drift(path: &Path, reference: &str, behind: u32, ahead: u32) -> Result<()> {
    if behind > 0 {
        return Err(Error::commits_behind(path, reference, behind, ahead));
    }
    Ok(())
}
