//! Affect State Engine.
//!
//! Tracks the agent's internal disposition as a continuous dynamical system:
//! every incoming message first decays the current vector toward its
//! per-dimension baseline, then adds the lexical signals extracted from the
//! message, then clamps back into `[0, 1]^6`.
//!
//! ## Decay model
//!
//! Arousal, confidence, curiosity, and attachment decay multiplicatively
//! toward zero; valence and dominance relax toward their neutral baseline of
//! `0.5` by shrinking the *deviation* from baseline:
//!
//! ```text
//! arousal(t+1)  = arousal(t) × 0.85
//! valence(t+1)  = 0.5 + (valence(t) − 0.5) × 0.9
//! ```
//!
//! Attachment is one-directional: interaction only ever raises it (a small
//! fixed increment per update); its very slow decay is the only way down.
//!
//! ## Persistence
//!
//! [`AffectState::save`] writes `{state, history}` as JSON keyed by session
//! id; [`AffectState::load`] restores both or neither: the file is parsed in
//! full before any in-memory field is touched, so malformed data can never
//! leave a partial overwrite behind.
//!
//! # Example
//!
//! ```rust
//! use anima_affect::AffectState;
//!
//! let mut affect = AffectState::new("/tmp/anima-affect");
//!
//! let snap = affect.update("This is perfect, thanks!");
//! assert!(snap.vector.valence() > 0.5);
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use anima_types::{AffectSnapshot, AffectVector};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::signals;

/// Number of snapshots retained in the bounded history.
pub const HISTORY_LIMIT: usize = 200;

// ── Decay factors (applied before each signal update) ────────────────────────

const AROUSAL_DECAY: f32 = 0.85;
const CONFIDENCE_DECAY: f32 = 0.95;
const CURIOSITY_DECAY: f32 = 0.9;
const VALENCE_DECAY: f32 = 0.9;
const DOMINANCE_DECAY: f32 = 0.97;
const ATTACHMENT_DECAY: f32 = 0.995;

// ── Signal increments ────────────────────────────────────────────────────────

const VALENCE_POSITIVE_STEP: f32 = 0.15;
const VALENCE_NEGATIVE_STEP: f32 = 0.2;
const CONFIDENCE_POSITIVE_STEP: f32 = 0.1;
const CONFIDENCE_NEGATIVE_STEP: f32 = 0.15;
const AROUSAL_QUESTION_STEP: f32 = 0.15;
const AROUSAL_EXCLAMATION_STEP: f32 = 0.2;
const DOMINANCE_DIRECTIVE_STEP: f32 = 0.1;
const CURIOSITY_LENGTH_STEP: f32 = 0.1;
const ATTACHMENT_STEP: f32 = 0.03;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise when persisting affect state.
#[derive(Debug, Error)]
pub enum AffectError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// AffectState
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk shape of a persisted affect session.
#[derive(Serialize, Deserialize)]
struct PersistedAffect {
    state: AffectVector,
    history: Vec<AffectSnapshot>,
}

/// The affect state machine: current vector plus bounded snapshot history.
///
/// Owned exclusively by one session; there are no discrete states and no
/// terminal state, only the default-initialized vector mutated by every
/// [`update`][AffectState::update] and optionally persisted at session end.
pub struct AffectState {
    vector: AffectVector,
    history: VecDeque<AffectSnapshot>,
    dir: PathBuf,
}

impl AffectState {
    /// Create a default-initialized state persisting under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            vector: AffectVector::default(),
            history: VecDeque::new(),
            dir: dir.into(),
        }
    }

    /// Process one message: decay, then signal extraction, then clamp, then
    /// snapshot. Returns the snapshot that was appended to the history.
    pub fn update(&mut self, text: &str) -> AffectSnapshot {
        self.apply_decay();

        let sig = signals::extract(text);
        let v = &mut self.vector;

        v.set_valence(
            v.valence() + VALENCE_POSITIVE_STEP * sig.positive as f32
                - VALENCE_NEGATIVE_STEP * sig.negative as f32,
        );
        v.set_confidence(
            v.confidence() + CONFIDENCE_POSITIVE_STEP * sig.positive as f32
                - CONFIDENCE_NEGATIVE_STEP * sig.negative as f32,
        );
        if sig.interrogative {
            v.set_arousal(v.arousal() + AROUSAL_QUESTION_STEP);
        }
        if sig.exclamation {
            v.set_arousal(v.arousal() + AROUSAL_EXCLAMATION_STEP);
        }
        if sig.directive {
            v.set_dominance(v.dominance() + DOMINANCE_DIRECTIVE_STEP);
        }
        if sig.long_message {
            v.set_curiosity(v.curiosity() + CURIOSITY_LENGTH_STEP);
        }
        // Attachment only rises from interaction; decay is its only way down.
        v.set_attachment(v.attachment() + ATTACHMENT_STEP);

        let snapshot = AffectSnapshot::new(self.vector, text);
        self.history.push_back(snapshot.clone());
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }

        debug!(label = %snapshot.label(), intensity = snapshot.intensity(), "affect updated");
        snapshot
    }

    /// Pure read of the current state; does not decay, signal, or append to
    /// the history.
    pub fn snapshot(&self) -> AffectSnapshot {
        AffectSnapshot::new(self.vector, "")
    }

    /// Copy of the current vector.
    pub fn vector(&self) -> AffectVector {
        self.vector
    }

    /// The bounded snapshot history, oldest first.
    pub fn history(&self) -> &VecDeque<AffectSnapshot> {
        &self.history
    }

    /// Persist the vector and history for `session_id`.
    pub fn save(&self, session_id: &str) -> Result<(), AffectError> {
        fs::create_dir_all(&self.dir)?;
        let persisted = PersistedAffect {
            state: self.vector,
            history: self.history.iter().cloned().collect(),
        };
        let raw = serde_json::to_string_pretty(&persisted)?;
        fs::write(self.session_path(session_id), raw)?;
        Ok(())
    }

    /// Restore the vector and history saved for `session_id`.
    ///
    /// Returns `false` when no file exists or the file is malformed; in both
    /// cases the in-memory state is left exactly as it was.
    pub fn load(&mut self, session_id: &str) -> bool {
        let path = self.session_path(session_id);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return false,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read affect file");
                return false;
            }
        };

        // Parse completely before touching any field: a malformed file must
        // never result in a partial overwrite.
        match serde_json::from_str::<PersistedAffect>(&raw) {
            Ok(persisted) => {
                self.vector = persisted.state;
                self.history = persisted.history.into_iter().collect();
                while self.history.len() > HISTORY_LIMIT {
                    self.history.pop_front();
                }
                debug!(session = session_id, snapshots = self.history.len(), "affect restored");
                true
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed affect file; keeping current state");
                false
            }
        }
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("affect_{session_id}.json"))
    }

    fn apply_decay(&mut self) {
        let v = &mut self.vector;
        v.set_arousal(v.arousal() * AROUSAL_DECAY);
        v.set_confidence(v.confidence() * CONFIDENCE_DECAY);
        v.set_curiosity(v.curiosity() * CURIOSITY_DECAY);
        // Valence and dominance relax toward the 0.5 baseline, not toward zero.
        v.set_valence(0.5 + (v.valence() - 0.5) * VALENCE_DECAY);
        v.set_dominance(0.5 + (v.dominance() - 0.5) * DOMINANCE_DECAY);
        v.set_attachment(v.attachment() * ATTACHMENT_DECAY);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
