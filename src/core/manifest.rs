//! Reads the package manifest (`package.json`) at a repository root.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::json;

use crate::config;
use crate::error::{Error, Result};

pub const MANIFEST_FILE: &str = "package.json";

/// The subset of `package.json` the pipeline reads.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManifest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub cs_build: Option<BuildSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSection {
    #[serde(default)]
    pub protected_branches: Option<Vec<String>>,
}

pub fn manifest_path(repo: &Path) -> PathBuf {
    repo.join(MANIFEST_FILE)
}

/// Parse the manifest. `Ok(None)` when the repository has none.
pub fn read(repo: &Path) -> Result<Option<PackageManifest>> {
    let path = manifest_path(repo);
    let Some(content) = config::read_optional(&path)? else {
        return Ok(None);
    };
    parse(&content, &path).map(Some)
}

fn parse(content: &str, path: &Path) -> Result<PackageManifest> {
    serde_json::from_str(content).map_err(|e| Error::invalid_json(e, "package manifest", Some(path)))
}

/// Like [`read`], but a missing manifest is an `InvalidConfig` error.
pub fn require(repo: &Path) -> Result<PackageManifest> {
    read(repo)?.ok_or_else(|| {
        let path = manifest_path(repo);
        Error::invalid_config(
            format!("No {} found in {}", MANIFEST_FILE, repo.display()),
            json!({ "path": path.display().to_string() }),
        )
    })
}

/// Manifest-declared protected branches, if the repository overrides them.
pub fn protected_branches_override(repo: &Path) -> Result<Option<Vec<String>>> {
    Ok(read(repo)?
        .and_then(|m| m.cs_build)
        .and_then(|b| b.protected_branches))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tempfile::tempdir;

    #[test]
    fn reads_version_and_override() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name":"client","version":"1.4.0-3","csBuild":{"protectedBranches":["main","staging"]}}"#,
        )
        .unwrap();

        let manifest = require(dir.path()).unwrap();
        assert_eq!(manifest.version.as_deref(), Some("1.4.0-3"));
        assert_eq!(
            protected_branches_override(dir.path()).unwrap(),
            Some(vec!["main".to_string(), "staging".to_string()])
        );
    }

    #[test]
    fn missing_manifest_has_no_override() {
        let dir = tempdir().unwrap();
        assert!(read(dir.path()).unwrap().is_none());
        assert_eq!(protected_branches_override(dir.path()).unwrap(), None);
    }

    #[test]
    fn manifest_without_build_section_has_no_override() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), r#"{"version":"1.0.0"}"#).unwrap();
        assert_eq!(protected_branches_override(dir.path()).unwrap(), None);
    }

    #[test]
    fn malformed_manifest_is_invalid_config() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("package.json"), "{\"version\": ").unwrap();
        let err = read(dir.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
    }

    #[test]
    fn require_reports_missing_manifest() {
        let dir = tempdir().unwrap();
        let err = require(dir.path()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfig);
    }
}
