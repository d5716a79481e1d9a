use crate::error::Error;
use crate::validation;
use crate::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

// ============================================================================
// File Access
// ============================================================================

/// Read a file; a missing file is `Ok(None)`.
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::internal_io(
            format!("{}: {}", path.display(), e),
            Some("read file".to_string()),
        )),
    }
}

/// Write next to `path` as `<name>.tmp`, then rename over it.
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let tmp_path = path.with_extension("json.tmp");

    fs::write(&tmp_path, content)
        .map_err(|e| Error::internal_io(e.to_string(), Some("write temp file".to_string())))?;
    fs::rename(&tmp_path, path)
        .map_err(|e| Error::internal_io(e.to_string(), Some("rename temp file".to_string())))
}

/// `*.json` files directly inside `dir`. A missing directory holds none.
fn json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(Error::internal_io(
                e.to_string(),
                Some("list directory".to_string()),
            ))
        }
    };

    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect())
}

fn file_id(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_string())
}

// ============================================================================
// JSON Parsing Utilities (internal)
// ============================================================================

/// Parse JSON file content into a typed value.
pub(crate) fn from_str<T: DeserializeOwned>(s: &str, path: &Path) -> Result<T> {
    serde_json::from_str(s).map_err(|e| Error::invalid_json(e, "config file", Some(path)))
}

/// Serialize value to pretty-printed JSON string.
pub(crate) fn to_string_pretty<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| Error::internal_json(e.to_string(), Some("serialize json".to_string())))
}

// ============================================================================
// Entity Store
// ============================================================================

/// A named JSON document stored as `<config_dir>/<id>.json`.
///
/// The ID lives in the file name, not in the document.
pub(crate) trait ConfigEntity: Serialize + DeserializeOwned {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn config_dir() -> Result<PathBuf>;
    fn not_found_error(id: String, suggestions: Vec<String>) -> Error;

    /// Entity-specific validation, run before every save.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

fn entity_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{}.json", id))
}

pub(crate) fn load<T: ConfigEntity>(id: &str) -> Result<T> {
    load_in(&T::config_dir()?, id)
}

pub(crate) fn load_in<T: ConfigEntity>(dir: &Path, id: &str) -> Result<T> {
    validation::validate_project_id(id)?;
    let path = entity_path(dir, id);
    let Some(content) = read_optional(&path)? else {
        let suggestions = find_similar_ids_in::<T>(dir, id);
        return Err(T::not_found_error(id.to_string(), suggestions));
    };
    let mut entity: T = from_str(&content, &path)?;
    entity.set_id(id.to_string());
    Ok(entity)
}

/// Load an entity, or `None` when it has never been saved.
pub(crate) fn load_optional_in<T: ConfigEntity>(dir: &Path, id: &str) -> Result<Option<T>> {
    if !exists_in::<T>(dir, id) {
        return Ok(None);
    }
    load_in(dir, id).map(Some)
}

pub(crate) fn list<T: ConfigEntity>() -> Result<Vec<T>> {
    list_in(&T::config_dir()?)
}

pub(crate) fn list_in<T: ConfigEntity>(dir: &Path) -> Result<Vec<T>> {
    let mut items = Vec::new();

    for path in json_files(dir)? {
        let Some(id) = file_id(&path) else {
            continue;
        };
        // Removed between listing and reading.
        let Some(content) = read_optional(&path)? else {
            continue;
        };
        let mut entity: T = from_str(&content, &path)?;
        entity.set_id(id);
        items.push(entity);
    }

    items.sort_by(|a, b| a.id().cmp(b.id()));
    Ok(items)
}

pub(crate) fn save_in<T: ConfigEntity>(dir: &Path, entity: &T) -> Result<()> {
    validation::validate_project_id(entity.id())?;
    entity.validate()?;

    fs::create_dir_all(dir)
        .map_err(|e| Error::internal_io(e.to_string(), Some("create directory".to_string())))?;
    let content = to_string_pretty(entity)?;
    write_atomic(&entity_path(dir, entity.id()), &content)
}

pub(crate) fn exists_in<T: ConfigEntity>(dir: &Path, id: &str) -> bool {
    entity_path(dir, id).is_file()
}

pub(crate) fn list_ids_in(dir: &Path) -> Result<Vec<String>> {
    let mut ids: Vec<String> = json_files(dir)?.iter().filter_map(|p| file_id(p)).collect();
    ids.sort();
    Ok(ids)
}

// ============================================================================
// Fuzzy Matching
// ============================================================================

/// Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row: Vec<usize> = vec![0; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        curr_row[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            curr_row[j + 1] = (prev_row[j + 1] + 1)
                .min(curr_row[j] + 1)
                .min(prev_row[j] + cost);
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }

    prev_row[b_chars.len()]
}

/// Find entity IDs similar to the given target.
/// Prefix and suffix matches rank first, then Levenshtein distance <= 3.
/// Returns up to 3 matches.
pub(crate) fn find_similar_ids<T: ConfigEntity>(target: &str) -> Vec<String> {
    match T::config_dir() {
        Ok(dir) => find_similar_ids_in::<T>(&dir, target),
        Err(_) => vec![],
    }
}

fn find_similar_ids_in<T: ConfigEntity>(dir: &Path, target: &str) -> Vec<String> {
    let existing = match list_ids_in(dir) {
        Ok(ids) => ids,
        Err(_) => return vec![],
    };

    let target_lower = target.to_lowercase();
    let mut matches: Vec<(String, usize)> = Vec::new();

    for id in existing {
        let id_lower = id.to_lowercase();

        if id_lower.starts_with(&target_lower) && id_lower != target_lower {
            matches.push((id, 0));
            continue;
        }

        if id_lower.ends_with(&target_lower) {
            matches.push((id, 1));
            continue;
        }

        let dist = levenshtein(&target_lower, &id_lower);
        if dist <= 3 && dist > 0 {
            matches.push((id, dist + 10));
        }
    }

    matches.sort_by_key(|(_, priority)| *priority);
    matches.into_iter().take(3).map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        #[serde(skip)]
        id: String,
        body: String,
    }

    impl ConfigEntity for Note {
        fn id(&self) -> &str {
            &self.id
        }
        fn set_id(&mut self, id: String) {
            self.id = id;
        }
        fn config_dir() -> Result<PathBuf> {
            Err(Error::internal_unexpected("tests use explicit dirs"))
        }
        fn not_found_error(id: String, suggestions: Vec<String>) -> Error {
            Error::project_not_found(&id, suggestions)
        }
    }

    fn note(id: &str, body: &str) -> Note {
        Note {
            id: id.to_string(),
            body: body.to_string(),
        }
    }

    #[test]
    fn save_then_load_restores_id_from_file_name() {
        let dir = tempdir().unwrap();
        save_in(dir.path(), &note("alpha", "hello")).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("alpha.json")).unwrap();
        assert!(!raw.contains("\"id\""));

        let loaded: Note = load_in(dir.path(), "alpha").unwrap();
        assert_eq!(loaded, note("alpha", "hello"));
    }

    #[test]
    fn missing_entity_suggests_similar_ids() {
        let dir = tempdir().unwrap();
        save_in(dir.path(), &note("nightly", "x")).unwrap();

        let err = load_in::<Note>(dir.path(), "nightyl").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ProjectNotFound);
        assert_eq!(err.details["suggestions"][0], "nightly");
    }

    #[test]
    fn list_is_sorted() {
        let dir = tempdir().unwrap();
        save_in(dir.path(), &note("b", "2")).unwrap();
        save_in(dir.path(), &note("a", "1")).unwrap();

        let items: Vec<Note> = list_in(dir.path()).unwrap();
        let ids: Vec<&str> = items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn malformed_file_is_invalid_config() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let err = load_in::<Note>(dir.path(), "broken").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidConfig);
    }

    #[test]
    fn load_optional_missing_is_none() {
        let dir = tempdir().unwrap();
        assert!(load_optional_in::<Note>(dir.path(), "ghost").unwrap().is_none());
    }

    #[test]
    fn save_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        save_in(dir.path(), &note("alpha", "one")).unwrap();
        save_in(dir.path(), &note("alpha", "two")).unwrap();

        assert!(!dir.path().join("alpha.json.tmp").exists());
        let loaded: Note = load_in(dir.path(), "alpha").unwrap();
        assert_eq!(loaded.body, "two");
    }

    #[test]
    fn only_json_files_are_entities() {
        let dir = tempdir().unwrap();
        save_in(dir.path(), &note("alpha", "1")).unwrap();
        std::fs::write(dir.path().join("README.txt"), "not an entity").unwrap();
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        assert_eq!(list_ids_in(dir.path()).unwrap(), vec!["alpha".to_string()]);
    }

    #[test]
    fn missing_store_lists_nothing() {
        let dir = tempdir().unwrap();
        assert!(list_ids_in(&dir.path().join("missing")).unwrap().is_empty());
        assert!(read_optional(&dir.path().join("missing.json")).unwrap().is_none());
    }

    #[test]
    fn levenshtein_distances() {
        assert_eq!(levenshtein("demo", "demo"), 0);
        assert_eq!(levenshtein("demo", "dmeo"), 2);
        assert_eq!(levenshtein("", "abc"), 3);
    }
}
