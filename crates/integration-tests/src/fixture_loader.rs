//! Reading logger scenarios from `tests/fixtures`.

use anyhow::{Context as _, Result};
use serde_json::from_str;
use std::fs;
use std::path::{Path, PathBuf};

use super::fixture::LogScenario;

/// Parse the JSON scenario stored at `path`.
///
/// # Errors
/// Fails with the fixture path attached when the file is missing or is not a
/// valid scenario.
pub fn load_fixture(path: &Path) -> Result<LogScenario> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture: {}", path.display()))?;
    from_str(&content).with_context(|| format!("Failed to parse fixture: {}", path.display()))
}

/// Every `.json` scenario below `dir`, nested folders included, in path
/// order. A missing `dir` holds no scenarios.
///
/// # Errors
/// Fails when a folder below `dir` cannot be listed.
pub fn discover_fixtures(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut scenarios = Vec::new();
    if !dir.exists() {
        return Ok(scenarios);
    }

    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list scenario folder: {}", dir.display()))?;
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to read entry in {}", dir.display()))?
            .path();
        if path.is_dir() {
            scenarios.extend(discover_fixtures(&path)?);
        } else if path.extension().is_some_and(|extension| extension == "json") {
            scenarios.push(path);
        }
    }

    scenarios.sort();
    Ok(scenarios)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_walks_folders_and_skips_other_files() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("policy");
        fs::create_dir(&nested).unwrap();
        fs::write(root.path().join("b.json"), "{}").unwrap();
        fs::write(root.path().join("notes.txt"), "").unwrap();
        fs::write(nested.join("a.json"), "{}").unwrap();

        let found = discover_fixtures(root.path()).unwrap();

        assert_eq!(found, vec![root.path().join("b.json"), nested.join("a.json")]);
    }

    #[test]
    fn test_missing_scenario_file_names_the_path() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("gone.json");

        let error = load_fixture(&path).unwrap_err();

        assert!(error.to_string().contains("gone.json"));
        assert!(error.to_string().starts_with("Failed to read fixture"));
    }
}
