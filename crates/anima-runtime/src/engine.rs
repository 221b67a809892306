//! [`Engine`] – the cognitive cycle orchestrator.
//!
//! Every interaction runs the same pipeline:
//!
//! 1. **Affect** – update the affect state from the raw message (always
//!    first; the snapshot taken here flavors everything downstream).
//! 2. **Recall** – retrieve affect-weighted memories for the message.
//! 3. **Context** – flatten the short-term window for the generator.
//! 4. **Style** – derive prompts and sampling parameters from persona and
//!    affect.
//! 5. **Generate** – call the generation collaborator. A tagged failure
//!    degrades to a fallback line; it never aborts the cycle.
//! 6. **Window** – append the turn to the short-term window.
//! 7. **Gate** – if the instinct score clears the threshold, store the
//!    exchange long-term with that score as its importance.
//!
//! Steps 6–7 run regardless of the generation outcome.
//!
//! # Concurrency
//!
//! Single-writer discipline: every cognitive method takes `&mut self`, so
//! exclusivity is structural in a single-threaded caller. A service layer
//! that accepts concurrent requests must wrap the engine in one process-wide
//! `tokio::sync::Mutex` and hold the guard across the collaborator awaits —
//! collaborator latency then serializes throughput, which is the intended
//! trade-off. Read-only status goes through [`Engine::status`], which
//! returns owned copies, never live references into the state.

use std::path::PathBuf;
use std::sync::Arc;

use anima_affect::{AffectError, AffectState};
use anima_memory::{
    Embedder, MemoryError, MemoryStore, ShortTermTurn, ShortTermWindow,
};
use anima_types::{AffectVector, MemoryRecord};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::gate::StorageGate;
use crate::generator::{GenerateError, GenerationRequest, Generator};
use crate::persona::{PersonaError, PersonaStore, PersonaTraits};
use crate::prompt::{self, SessionStats};

/// Importance assigned to explicitly taught content.
const TEACH_IMPORTANCE: f32 = 0.7;
/// Importance assigned to corrections.
const CORRECTION_IMPORTANCE: f32 = 0.8;
const TEACH_TEMPERATURE: f32 = 0.6;
const CORRECTION_TEMPERATURE: f32 = 0.5;
const LEARNING_MAX_TOKENS: u32 = 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration bundle for [`Engine`].
pub struct EngineConfig {
    /// Root directory for all persisted state (memory pair, affect files,
    /// persona file).
    pub data_dir: PathBuf,
    /// Session identifier; a fresh UUID when `None`.
    pub session_id: Option<String>,
    /// Minimum importance for long-term storage, shared by gate and store.
    pub min_importance: f32,
    /// Memories to retrieve per interaction.
    pub retrieval_k: usize,
    /// Turns held in the short-term window.
    pub short_term_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            session_id: None,
            min_importance: 0.3,
            retrieval_k: 5,
            short_term_capacity: 20,
        }
    }
}

/// Errors that can arise while constructing or persisting an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Memory(#[from] MemoryError),
    #[error(transparent)]
    Affect(#[from] AffectError),
    #[error(transparent)]
    Persona(#[from] PersonaError),
}

/// Owned snapshot of the engine state for lock-free status reporting.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub session_id: String,
    pub affect: AffectVector,
    pub persona: PersonaTraits,
    pub short_term_len: usize,
    pub long_term_count: usize,
    pub interactions: u64,
    pub memories_stored: u64,
    pub started_at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Engine
// ─────────────────────────────────────────────────────────────────────────────

/// One conversational session: affect state, both memory tiers, the storage
/// gate, the persona profile, and the generation collaborator.
pub struct Engine {
    session_id: String,
    affect: AffectState,
    short_term: ShortTermWindow,
    memory: MemoryStore,
    gate: StorageGate,
    persona: PersonaStore,
    generator: Arc<dyn Generator>,
    stats: SessionStats,
    retrieval_k: usize,
    started_at: DateTime<Utc>,
}

impl Engine {
    /// Wire up a session from configuration and collaborators.
    ///
    /// A previously saved affect state for the same session id is restored;
    /// an unusable persona file falls back to default traits with a warning.
    ///
    /// # Errors
    ///
    /// Fails when the long-term store refuses to open (missing sibling,
    /// corruption, or index/ledger divergence) — the engine must never serve
    /// retrieval against misaligned data.
    pub fn new(
        config: EngineConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, EngineError> {
        let session_id = config
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let memory = MemoryStore::open(
            config.data_dir.join("memory"),
            config.min_importance,
            embedder,
        )?;

        let persona = match PersonaStore::open(config.data_dir.join("persona.toml")) {
            Ok(persona) => persona,
            Err(e) => {
                warn!(error = %e, "persona file unusable; using default traits");
                PersonaStore::with_defaults(config.data_dir.join("persona.toml"))
            }
        };

        let mut affect = AffectState::new(config.data_dir.join("affect"));
        if affect.load(&session_id) {
            info!(session = %session_id, "affect state restored");
        }

        Ok(Self {
            session_id,
            affect,
            short_term: ShortTermWindow::new(config.short_term_capacity),
            memory,
            gate: StorageGate::new(config.min_importance),
            persona,
            generator,
            stats: SessionStats::default(),
            retrieval_k: config.retrieval_k.max(1),
            started_at: Utc::now(),
        })
    }

    /// Run one full cognitive cycle for `user_message` and return the reply.
    pub async fn process_interaction(&mut self, user_message: &str) -> String {
        // ── 1. Affect (always first) ──────────────────────────────────────
        let snapshot = self.affect.update(user_message);

        // ── 2. Emotional recall ───────────────────────────────────────────
        let memories = match self
            .memory
            .retrieve(user_message, &snapshot.vector, self.retrieval_k)
            .await
        {
            Ok(memories) => memories,
            Err(e) => {
                warn!(error = %e, "memory retrieval failed; continuing without recall");
                Vec::new()
            }
        };

        // ── 3. Short-term context ─────────────────────────────────────────
        let context = self.short_term.as_messages();

        // ── 4. Prompts and response style ─────────────────────────────────
        let traits = self.persona.traits();
        let system_prompt = prompt::system_prompt(&snapshot.vector, &traits, self.stats);
        let user_prompt = prompt::user_prompt(user_message, &memories, &snapshot.vector);
        let style = traits.response_style(&snapshot.vector);

        // ── 5. Generation (degrades, never halts the cycle) ───────────────
        let reply = match self
            .generator
            .generate(GenerationRequest {
                prompt: user_prompt,
                system_prompt,
                context,
                temperature: style.temperature,
                max_tokens: style.max_tokens,
            })
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "generation failed; degrading to fallback");
                fallback_reply(&e).to_string()
            }
        };

        // ── 6. Short-term window ──────────────────────────────────────────
        self.short_term
            .append(ShortTermTurn::new(user_message, reply.clone(), snapshot.clone()));

        // ── 7. Long-term storage gate ─────────────────────────────────────
        // The gate runs before the store so low-salience interactions never
        // reach the embedding collaborator.
        if self.gate.should_store(&snapshot) {
            let importance = self.gate.decide_importance(&snapshot);
            let text = format!("User: {user_message}\nAnima: {reply}");
            match self.memory.store(&text, &snapshot, Some(importance)).await {
                Ok(outcome) if outcome.is_stored() => self.stats.memories += 1,
                Ok(_) => debug!("gated at the store despite instinct score"),
                Err(e) => warn!(error = %e, "long-term store failed; continuing unpersisted"),
            }
        }

        self.stats.interactions += 1;
        reply
    }

    /// Teaching mode: the content is stored long-term with a fixed high
    /// importance, bypassing the instinct gate.
    pub async fn teach(&mut self, content: &str) -> String {
        let snapshot = self.affect.update(content);
        let traits = self.persona.traits();
        let system_prompt = prompt::system_prompt(&snapshot.vector, &traits, self.stats);

        let reply = match self
            .generator
            .generate(GenerationRequest {
                prompt: prompt::teaching_prompt(content),
                system_prompt,
                context: Vec::new(),
                temperature: TEACH_TEMPERATURE,
                max_tokens: LEARNING_MAX_TOKENS,
            })
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "generation failed during teaching");
                "Noted. I have stored what you taught me.".to_string()
            }
        };

        match self
            .memory
            .store(content, &snapshot, Some(TEACH_IMPORTANCE))
            .await
        {
            Ok(outcome) if outcome.is_stored() => self.stats.memories += 1,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to store taught content"),
        }

        self.stats.interactions += 1;
        reply
    }

    /// Correction mode: stores the correction with high importance and asks
    /// the model to acknowledge it.
    pub async fn correct(&mut self, user_input: &str, correction: &str) -> String {
        let snapshot = self.affect.update(correction);
        let traits = self.persona.traits();
        let system_prompt = prompt::system_prompt(&snapshot.vector, &traits, self.stats);

        let reply = match self
            .generator
            .generate(GenerationRequest {
                prompt: prompt::correction_prompt(user_input, correction),
                system_prompt,
                context: Vec::new(),
                temperature: CORRECTION_TEMPERATURE,
                max_tokens: LEARNING_MAX_TOKENS,
            })
            .await
        {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "generation failed during correction");
                "Correction noted. I will take it into account.".to_string()
            }
        };

        let text = format!("Correction: {correction} (for: {user_input})");
        match self
            .memory
            .store(&text, &snapshot, Some(CORRECTION_IMPORTANCE))
            .await
        {
            Ok(outcome) if outcome.is_stored() => self.stats.memories += 1,
            Ok(_) => {}
            Err(e) => warn!(error = %e, "failed to store correction"),
        }

        self.stats.interactions += 1;
        reply
    }

    /// Owned snapshot of the engine state; safe to call without the
    /// cognitive lock.
    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            session_id: self.session_id.clone(),
            affect: self.affect.vector(),
            persona: self.persona.traits(),
            short_term_len: self.short_term.len(),
            long_term_count: self.memory.count(),
            interactions: self.stats.interactions,
            memories_stored: self.stats.memories,
            started_at: self.started_at,
        }
    }

    /// The most recent long-term memories, newest first.
    pub fn recent_memories(&self, n: usize) -> Vec<MemoryRecord> {
        self.memory.records().iter().rev().take(n).cloned().collect()
    }

    /// Clear the short-term window (session reset); long-term memory and
    /// affect state are untouched.
    pub fn reset_conversation(&mut self) {
        self.short_term.clear();
    }

    /// Persist affect state and persona traits for this session.
    pub fn save(&self) -> Result<(), EngineError> {
        self.affect.save(&self.session_id)?;
        self.persona.save()?;
        Ok(())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

/// Map a tagged generation failure to the line shown to the user.
fn fallback_reply(error: &GenerateError) -> &'static str {
    match error {
        GenerateError::Unavailable(_) => {
            "I cannot reach my language model right now, but I have taken note of what you said."
        }
        GenerateError::TimedOut(_) => {
            "That took me too long to think through. Could you try again, perhaps with a shorter message?"
        }
        GenerateError::EmptyResponse | GenerateError::BadResponse(_) => {
            "I do not have a good answer right now, but I will remember this exchange."
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
