//! `anima-affect` – The Affect Engine.
//!
//! Maintains the six-dimensional affect vector that colors everything the
//! agent remembers and recalls.
//!
//! # Modules
//!
//! - [`engine`] – [`AffectState`][engine::AffectState]: the continuous
//!   dynamical system `v(t+1) = clamp(decay(v(t)) + signal(message))` over
//!   `[0, 1]^6`, with a bounded snapshot history and per-session JSON
//!   persistence.
//! - [`signals`] – lexical cue extraction: turns a raw user message into the
//!   additive signal terms (positive/negative cues, interrogatives,
//!   exclamations, directives, message length) consumed by the engine.

pub mod engine;
pub mod signals;

pub use engine::{AffectError, AffectState, HISTORY_LIMIT};
pub use signals::MessageSignals;
