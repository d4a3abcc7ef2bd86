// optional <project_dir>/steppad.json; every field has a default so a missing
// file (or a partial one) is fine, a malformed one is an error.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::sequencer::clock::Tempo;

const CONFIG_FILE: &str = "steppad.json";

// slowest tempo a config may allow; much lower and a step lasts longer than a Duration can hold
pub const MIN_BPM_FLOOR: f64 = 1.0;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub sounds_dir: PathBuf, // relative paths resolve against the project dir
    pub sample_rate: Option<u32>, // output rate override, None = device default
    pub tempo: TempoRange,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: String::from("127.0.0.1"),
            port: 3001,
            sounds_dir: PathBuf::from("sounds"),
            sample_rate: None,
            tempo: TempoRange::default(),
        }
    }
}

/// Bounds every tempo the UI can produce before it reaches the sequencer.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TempoRange {
    pub default_bpm: f64,
    pub min_bpm: f64,
    pub max_bpm: f64,
}

impl Default for TempoRange {
    fn default() -> Self {
        Self {
            default_bpm: 120.0,
            min_bpm: 40.0,
            max_bpm: 300.0,
        }
    }
}

impl TempoRange {
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.min_bpm.is_finite() && self.max_bpm.is_finite()) {
            anyhow::bail!("tempo range must be finite, got {}..={}", self.min_bpm, self.max_bpm);
        }
        if self.min_bpm < MIN_BPM_FLOOR {
            anyhow::bail!("min_bpm must be at least {MIN_BPM_FLOOR}, got {}", self.min_bpm);
        }
        if self.min_bpm > self.max_bpm {
            anyhow::bail!("tempo range is empty: {}..={}", self.min_bpm, self.max_bpm);
        }
        if !(self.min_bpm..=self.max_bpm).contains(&self.default_bpm) {
            anyhow::bail!(
                "default tempo {} is outside {}..={}",
                self.default_bpm,
                self.min_bpm,
                self.max_bpm
            );
        }
        Ok(())
    }

    pub fn default_tempo(&self) -> anyhow::Result<Tempo> {
        self.checked(self.default_bpm)
    }

    // rejects anything outside the range
    pub fn checked(&self, bpm: f64) -> anyhow::Result<Tempo> {
        if !(self.min_bpm..=self.max_bpm).contains(&bpm) {
            anyhow::bail!("tempo {bpm} is outside {}..={}", self.min_bpm, self.max_bpm);
        }
        Tempo::new(bpm)
    }

    // for relative knob-style changes: clamp instead of failing
    pub fn nudge(&self, current: Tempo, delta: f64) -> anyhow::Result<Tempo> {
        self.checked((current.bpm() + delta).clamp(self.min_bpm, self.max_bpm))
    }
}

impl Config {
    pub fn load(project_dir: &Path) -> anyhow::Result<Self> {
        let path = project_dir.join(CONFIG_FILE);
        let config: Config = match std::fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data)
                .with_context(|| format!("parsing {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Config::default(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.tempo.validate().context("invalid tempo config")?;
        if self.sample_rate == Some(0) {
            anyhow::bail!("sample_rate must be non-zero");
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .with_context(|| format!("invalid listen address {addr}"))
    }

    pub fn sounds_dir(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.sounds_dir) // join keeps absolute paths as-is
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::temp_dir as temp_project;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = temp_project("steppad_config_missing");
        let config = Config::load(&dir).unwrap();
        assert_eq!(config.port, 3001);
        assert_eq!(config.sounds_dir(&dir), dir.join("sounds"));
        assert_eq!(config.listen_addr().unwrap().to_string(), "127.0.0.1:3001");
        assert_eq!(config.tempo.default_tempo().unwrap().bpm(), 120.0);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = temp_project("steppad_config_partial");
        let json = r#"{ "port": 4000, "tempo": { "max_bpm": 200 } }"#;
        std::fs::write(dir.join(CONFIG_FILE), json).unwrap();
        let config = Config::load(&dir).unwrap();
        assert_eq!(config.port, 4000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.tempo.min_bpm, 40.0);
        assert_eq!(config.tempo.max_bpm, 200.0);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = temp_project("steppad_config_bad");
        std::fs::write(dir.join(CONFIG_FILE), "port = 4000").unwrap();
        assert!(Config::load(&dir).is_err());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn bad_tempo_ranges_are_rejected() {
        let zero = TempoRange { default_bpm: 0.0, min_bpm: 0.0, max_bpm: 10.0 };
        assert!(zero.validate().is_err());
        let empty = TempoRange { default_bpm: 100.0, min_bpm: 200.0, max_bpm: 100.0 };
        assert!(empty.validate().is_err());
        let outside = TempoRange { default_bpm: 500.0, ..TempoRange::default() };
        assert!(outside.validate().is_err());
        assert!(TempoRange::default().validate().is_ok());
    }

    #[test]
    fn absurdly_slow_tempo_ranges_are_rejected() {
        let tiny = TempoRange { default_bpm: 1e-20, min_bpm: 1e-20, max_bpm: 10.0 };
        assert!(tiny.validate().is_err());
        let floor = TempoRange { default_bpm: 1.0, min_bpm: MIN_BPM_FLOOR, max_bpm: 10.0 };
        assert!(floor.validate().is_ok());
    }

    #[test]
    fn sample_rate_override_is_optional() {
        let dir = temp_project("steppad_config_rate");
        assert_eq!(Config::load(&dir).unwrap().sample_rate, None);
        std::fs::write(dir.join(CONFIG_FILE), r#"{ "sample_rate": 48000 }"#).unwrap();
        assert_eq!(Config::load(&dir).unwrap().sample_rate, Some(48000));
        std::fs::write(dir.join(CONFIG_FILE), r#"{ "sample_rate": 0 }"#).unwrap();
        assert!(Config::load(&dir).is_err());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn nudge_clamps_into_range() {
        let range = TempoRange::default();
        let tempo = range.checked(295.0).unwrap();
        assert_eq!(range.nudge(tempo, 10.0).unwrap().bpm(), 300.0);
        let tempo = range.checked(45.0).unwrap();
        assert_eq!(range.nudge(tempo, -10.0).unwrap().bpm(), 40.0);
        assert!(range.checked(0.0).is_err());
        assert!(range.checked(301.0).is_err());
    }
}
