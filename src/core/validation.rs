//! Identifier validation for values that end up in file names or command lines.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

// Branch/tag-like names: no leading dash, no whitespace or shell metacharacters.
static REF_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._/-]*$").unwrap());

/// Project IDs become file names in the projects directory.
pub fn validate_project_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::invalid_arguments("project", "Project name cannot be empty"));
    }

    if id.starts_with('.') || id.chars().any(|c| c.is_control() || c == '/' || c == '\\') {
        return Err(Error::invalid_arguments(
            "project",
            format!("Project name contains invalid characters: {}", id),
        ));
    }

    Ok(())
}

/// Stages and references are interpolated into git and npm command lines.
pub fn validate_ref_name(field: &str, value: &str) -> Result<()> {
    if value.contains("..") || value.ends_with('/') || !REF_NAME_PATTERN.is_match(value) {
        return Err(Error::invalid_arguments(
            field,
            format!(
                "Invalid {} '{}': use letters, digits, '.', '_', '-' or '/'",
                field, value
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_id_valid() {
        assert!(validate_project_id("demo").is_ok());
        assert!(validate_project_id("Nightly_App-2").is_ok());
    }

    #[test]
    fn project_id_rejects_paths() {
        assert!(validate_project_id("").is_err());
        assert!(validate_project_id("foo/bar").is_err());
        assert!(validate_project_id("..").is_err());
    }

    #[test]
    fn ref_names() {
        assert!(validate_ref_name("stage", "development").is_ok());
        assert!(validate_ref_name("stage", "release/1.2").is_ok());
        assert!(validate_ref_name("stage", "v2.0.0-rc.1").is_ok());
    }

    #[test]
    fn ref_names_reject_shell_and_git_hazards() {
        for bad in ["", "-rf", "dev; rm -x", "a..b", "dev/", "$(id)", "stage name"] {
            assert!(validate_ref_name("stage", bad).is_err(), "{}", bad);
        }
    }
}
