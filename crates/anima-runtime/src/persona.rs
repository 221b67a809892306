//! Persona Store – the process-wide trait file.
//!
//! Five personality traits consumed by the response-style calculation. The
//! file is process-wide (not per-session) and this store is its single
//! owner: components that need the traits receive them from here, with an
//! explicit load/save lifecycle instead of ambient file I/O. Trait
//! evolution is out of scope; the traits only change when the user edits
//! the file.

use std::fs;
use std::path::PathBuf;

use anima_types::AffectVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// A trait counts as dominant above this value.
const DOMINANT_THRESHOLD: f32 = 0.65;

/// Errors that can arise from persona file operations.
#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed persona file {}: {reason}", .path.display())]
    Parse { path: PathBuf, reason: String },
    #[error("serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// PersonaTraits
// ─────────────────────────────────────────────────────────────────────────────

/// The five-trait persona profile, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PersonaTraits {
    #[serde(default = "default_openness")]
    pub openness: f32,
    #[serde(default = "default_conscientiousness")]
    pub conscientiousness: f32,
    #[serde(default = "default_extraversion")]
    pub extraversion: f32,
    #[serde(default = "default_agreeableness")]
    pub agreeableness: f32,
    #[serde(default = "default_neuroticism")]
    pub neuroticism: f32,
}

fn default_openness() -> f32 {
    0.7
}
fn default_conscientiousness() -> f32 {
    0.6
}
fn default_extraversion() -> f32 {
    0.5
}
fn default_agreeableness() -> f32 {
    0.8
}
fn default_neuroticism() -> f32 {
    0.3
}

impl Default for PersonaTraits {
    fn default() -> Self {
        Self {
            openness: default_openness(),
            conscientiousness: default_conscientiousness(),
            extraversion: default_extraversion(),
            agreeableness: default_agreeableness(),
            neuroticism: default_neuroticism(),
        }
    }
}

/// Sampling parameters derived from persona and current affect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseStyle {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl PersonaTraits {
    /// Traits above the dominance threshold, for prompt modulation.
    pub fn dominant(&self) -> Vec<(&'static str, f32)> {
        [
            ("openness", self.openness),
            ("conscientiousness", self.conscientiousness),
            ("extraversion", self.extraversion),
            ("agreeableness", self.agreeableness),
            ("neuroticism", self.neuroticism),
        ]
        .into_iter()
        .filter(|(_, value)| *value > DOMINANT_THRESHOLD)
        .collect()
    }

    /// Derive generation parameters from persona and current affect.
    ///
    /// Extraversion and arousal push the temperature up; openness and
    /// curiosity buy a longer token budget.
    pub fn response_style(&self, affect: &AffectVector) -> ResponseStyle {
        let temperature = (0.5 + self.extraversion * 0.2 + (affect.arousal() - 0.5) * 0.1)
            .clamp(0.3, 1.0);
        let max_tokens =
            ((500.0 + (self.openness + affect.curiosity()) * 1000.0) as u32).min(2048);
        ResponseStyle {
            temperature,
            max_tokens,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PersonaStore
// ─────────────────────────────────────────────────────────────────────────────

/// Single owner of the persona trait file.
#[derive(Debug)]
pub struct PersonaStore {
    path: PathBuf,
    traits: PersonaTraits,
}

impl PersonaStore {
    /// Load the persona file at `path`; a missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`PersonaError::Parse`] on a malformed file rather than
    /// silently adopting defaults; the caller decides whether to fall back.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersonaError> {
        let path = path.into();
        let traits = match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw).map_err(|e| PersonaError::Parse {
                path: path.clone(),
                reason: e.to_string(),
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no persona file; using default traits");
                PersonaTraits::default()
            }
            Err(e) => return Err(PersonaError::Io { path, source: e }),
        };
        Ok(Self { path, traits })
    }

    /// A store with default traits, without touching the filesystem.
    pub fn with_defaults(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            traits: PersonaTraits::default(),
        }
    }

    /// Copy of the current traits.
    pub fn traits(&self) -> PersonaTraits {
        self.traits
    }

    /// Write the traits back to the persona file.
    pub fn save(&self) -> Result<(), PersonaError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| PersonaError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let raw = toml::to_string_pretty(&self.traits)?;
        fs::write(&self.path, raw).map_err(|e| PersonaError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_traits_match_profile() {
        let traits = PersonaTraits::default();
        assert!((traits.openness - 0.7).abs() < 1e-6);
        assert!((traits.agreeableness - 0.8).abs() < 1e-6);
        assert!((traits.neuroticism - 0.3).abs() < 1e-6);
    }

    #[test]
    fn dominant_traits_are_those_above_threshold() {
        let traits = PersonaTraits::default();
        let dominant = traits.dominant();
        let names: Vec<&str> = dominant.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, vec!["openness", "agreeableness"]);
    }

    #[test]
    fn response_style_follows_extraversion_and_arousal() {
        let traits = PersonaTraits {
            extraversion: 0.5,
            ..PersonaTraits::default()
        };
        let affect = AffectVector::new(0.5, 0.7, 0.5, 0.5, 0.4, 0.2);
        let style = traits.response_style(&affect);
        // 0.5 + 0.5 × 0.2 + (0.7 − 0.5) × 0.1 = 0.62
        assert!((style.temperature - 0.62).abs() < 1e-6);
        // 500 + (0.7 + 0.4) × 1000 = 1600
        assert_eq!(style.max_tokens, 1600);
    }

    #[test]
    fn response_style_is_clamped() {
        let hot = PersonaTraits {
            extraversion: 1.0,
            openness: 1.0,
            ..PersonaTraits::default()
        };
        let excited = AffectVector::new(0.5, 1.0, 0.5, 0.5, 1.0, 0.5);
        let style = hot.response_style(&excited);
        assert!(style.temperature <= 1.0);
        assert_eq!(style.max_tokens, 2048);

        let flat = PersonaTraits {
            extraversion: 0.0,
            ..PersonaTraits::default()
        };
        let calm = AffectVector::new(0.5, 0.0, 0.5, 0.5, 0.0, 0.0);
        assert!(flat.response_style(&calm).temperature >= 0.3);
    }

    #[test]
    fn open_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = PersonaStore::open(dir.path().join("persona.toml")).unwrap();
        assert_eq!(store.traits(), PersonaTraits::default());
    }

    #[test]
    fn save_then_open_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.toml");

        let mut store = PersonaStore::with_defaults(&path);
        store.traits.extraversion = 0.9;
        store.save().unwrap();

        let reopened = PersonaStore::open(&path).unwrap();
        assert!((reopened.traits().extraversion - 0.9).abs() < 1e-6);
    }

    #[test]
    fn malformed_file_is_an_error_not_a_silent_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.toml");
        fs::write(&path, "openness = \"very\"").unwrap();

        let err = PersonaStore::open(&path).unwrap_err();
        assert!(matches!(err, PersonaError::Parse { .. }));
    }

    #[test]
    fn partial_file_fills_missing_traits_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persona.toml");
        fs::write(&path, "extraversion = 0.1").unwrap();

        let store = PersonaStore::open(&path).unwrap();
        assert!((store.traits().extraversion - 0.1).abs() < 1e-6);
        assert!((store.traits().openness - 0.7).abs() < 1e-6);
    }
}
