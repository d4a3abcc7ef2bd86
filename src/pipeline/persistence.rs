// the only state that survives a restart: small string preferences like the theme.
// the pattern itself is deliberately not saved.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;

const STEPPAD_DIR: &str = ".steppad";
const PREFS_FILE: &str = "prefs.json";

pub const THEME_KEY: &str = "selectedTheme";
pub const DEFAULT_THEME: &str = "default";

// <project_dir>/.steppad/
pub fn state_dir(project_dir: &Path) -> PathBuf {
    project_dir.join(STEPPAD_DIR)
}

// <project_dir>/.steppad/prefs.json
fn prefs_file_path(project_dir: &Path) -> PathBuf {
    state_dir(project_dir).join(PREFS_FILE)
}

#[derive(Clone, Debug)]
pub struct Preferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl Preferences {
    // a missing or unreadable file just means nothing is stored yet
    pub fn open(project_dir: &Path) -> Self {
        let path = prefs_file_path(project_dir);
        let values = std::fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default();
        Self { path, values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    // writes through to disk, making .steppad/ if it doesn't exist already
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }

    pub fn theme(&self) -> &str {
        self.get(THEME_KEY).unwrap_or(DEFAULT_THEME)
    }

    pub fn change_theme(&mut self, theme: &str) -> anyhow::Result<()> {
        self.set(THEME_KEY, theme)?;
        log::info!("theme changed to {theme}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::temp_dir as temp_project;

    #[test]
    fn theme_defaults_when_nothing_is_stored() {
        let dir = temp_project("steppad_prefs_default");
        let prefs = Preferences::open(&dir);
        assert_eq!(prefs.theme(), "default");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn changed_theme_survives_a_reload() {
        let dir = temp_project("steppad_prefs_reload");
        let mut prefs = Preferences::open(&dir);
        prefs.change_theme("dark").unwrap();

        let reopened = Preferences::open(&dir);
        assert_eq!(reopened.theme(), "dark");
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn garbage_prefs_file_falls_back_to_defaults() {
        let dir = temp_project("steppad_prefs_garbage");
        std::fs::create_dir_all(state_dir(&dir)).unwrap();
        std::fs::write(prefs_file_path(&dir), "{not json").unwrap();
        assert_eq!(Preferences::open(&dir).theme(), DEFAULT_THEME);
        let _ = std::fs::remove_dir_all(dir);
    }
}
