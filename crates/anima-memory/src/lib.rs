//! `anima-memory` – The Memory Substrate.
//!
//! The two memory tiers of the engine, plus the embedding collaborator seam.
//!
//! # Modules
//!
//! - [`store`] – [`MemoryStore`][store::MemoryStore]: the long-term,
//!   affect-weighted store. Coordinates an exact vector index with a
//!   position-aligned record ledger, gates writes on importance, ranks
//!   retrieval with a composite semantic/emotional score, and persists the
//!   index and ledger as an inseparable file pair.
//! - [`index`] – [`VectorIndex`][index::VectorIndex]: a flat Euclidean
//!   nearest-neighbour index over fixed-dimension embeddings.
//! - [`short_term`] – [`ShortTermWindow`][short_term::ShortTermWindow]: the
//!   bounded FIFO of recent conversation turns. Recency-only, never
//!   persisted.
//! - [`embedder`] – the [`Embedder`][embedder::Embedder] collaborator
//!   contract: text in, fixed-dimension vector out, deterministic for
//!   identical input.

pub mod embedder;
pub mod index;
pub mod short_term;
pub mod store;

pub use embedder::{EmbedError, Embedder};
pub use index::VectorIndex;
pub use short_term::{ShortTermTurn, ShortTermWindow};
pub use store::{MemoryError, MemoryStore, emotional_alignment};
