//! `anima-runtime` – The Cognitive Engine.
//!
//! The execution layer where the cognitive cycle happens: affect update →
//! emotional recall → prompt assembly → generation → short-term window →
//! storage gate → long-term store.
//!
//! # Modules
//!
//! - [`engine`] – [`Engine`][engine::Engine]: the session orchestrator that
//!   wires the affect state, both memory tiers, the storage gate, the
//!   persona profile, and the generation collaborator into one
//!   single-writer cycle. Generation failures degrade to fallback replies;
//!   the memory pipeline always runs to completion.
//! - [`generator`] – the [`Generator`][generator::Generator] collaborator
//!   contract and [`OllamaGenerator`][generator::OllamaGenerator], a chat
//!   client for an OpenAI-compatible endpoint with tagged failures
//!   (unavailable / timed out / empty).
//! - [`embedder`] – [`OllamaEmbedder`][embedder::OllamaEmbedder]: the
//!   [`Embedder`][anima_memory::Embedder] implementation against Ollama's
//!   embeddings endpoint, dimension-validated.
//! - [`gate`] – [`StorageGate`][gate::StorageGate]: the instinctive
//!   importance score (`0.7·intensity + 0.3·dominance`) that decides what
//!   deserves long-term storage before any embedding work happens.
//! - [`persona`] – [`PersonaStore`][persona::PersonaStore]: single owner of
//!   the process-wide trait file, plus the response-style calculation.
//! - [`prompt`] – affect- and persona-modulated prompt assembly.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: tracing
//!   subscriber bootstrap with optional OTLP span export.

pub mod embedder;
pub mod engine;
pub mod gate;
pub mod generator;
pub mod persona;
pub mod prompt;
pub mod telemetry;

pub use embedder::OllamaEmbedder;
pub use engine::{Engine, EngineConfig, EngineError, EngineStatus};
pub use gate::StorageGate;
pub use generator::{GenerateError, GenerationRequest, Generator, OllamaGenerator};
pub use persona::{PersonaError, PersonaStore, PersonaTraits, ResponseStyle};
pub use prompt::SessionStats;
pub use telemetry::{TelemetryGuard, init_tracing};
