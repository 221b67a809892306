//! Long-Term Emotional Memory Store.
//!
//! Coordinates the vector index with a position-aligned ledger of
//! [`MemoryRecord`]s. Writes are gated on importance, reads are ranked by a
//! composite score that blends semantic similarity with emotional congruence:
//!
//! ```text
//! score = 0.5·semantic + 0.3·alignment + 0.1·importance + 0.1·intensity
//! semantic = 1 / (1 + L2(query, stored))
//! ```
//!
//! Semantic similarity dominates so recall stays on topic; the emotional
//! terms act as mood-congruent tie-breakers.
//!
//! # Storage layout
//!
//! Two JSON files sharing a base path, written and read as a unit:
//!
//! | file | contents |
//! |---|---|
//! | `<base>.index.json`  | `{dimension, vectors}` in position order |
//! | `<base>.ledger.json` | the [`MemoryRecord`] ledger, same order   |
//!
//! Invariant: index and ledger always have equal length with matching
//! position-for-position correspondence. A missing sibling, malformed file,
//! or length mismatch at open time is a refusal to serve, never a partial
//! load.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use anima_memory::MemoryStore;
//!
//! # async fn demo(embedder: Arc<dyn anima_memory::Embedder>) {
//! let mut store = MemoryStore::open("data/memory", 0.3, embedder).unwrap();
//! let snapshot = anima_types::AffectSnapshot::new(Default::default(), "hello");
//! store.store("the user prefers terse answers", &snapshot, Some(0.8)).await.unwrap();
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anima_types::{AffectSnapshot, AffectVector, MemoryRecord, StoreOutcome};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::embedder::{EmbedError, Embedder};
use crate::index::VectorIndex;

const INDEX_SUFFIX: &str = ".index.json";
const LEDGER_SUFFIX: &str = ".ledger.json";

/// Over-sampling factor: retrieval searches `3k` neighbours before
/// re-ranking, to give the emotional terms headroom to reorder.
const OVERSAMPLE: usize = 3;

// ── Composite score weights ──────────────────────────────────────────────────

const SEMANTIC_WEIGHT: f32 = 0.5;
const ALIGNMENT_WEIGHT: f32 = 0.3;
const IMPORTANCE_WEIGHT: f32 = 0.1;
const INTENSITY_WEIGHT: f32 = 0.1;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from long-term memory operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed memory file {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },
    #[error("found {} without its sibling {}; refusing partial load",
            .present.display(), .missing.display())]
    SiblingMissing { present: PathBuf, missing: PathBuf },
    #[error("index/ledger divergence: {index_len} vectors vs {ledger_len} records")]
    Divergence { index_len: usize, ledger_len: usize },
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Embed(#[from] EmbedError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Emotional alignment
// ─────────────────────────────────────────────────────────────────────────────

/// Congruence between two affect vectors over the valence, arousal, and
/// dominance axes: the mean of `1 − |current − stored|` per axis, in
/// `[0, 1]`. Returns `0.5` when either side is absent.
pub fn emotional_alignment(
    current: Option<&AffectVector>,
    stored: Option<&AffectVector>,
) -> f32 {
    let (Some(current), Some(stored)) = (current, stored) else {
        return 0.5;
    };
    let pairs = [
        (current.valence(), stored.valence()),
        (current.arousal(), stored.arousal()),
        (current.dominance(), stored.dominance()),
    ];
    let sum: f32 = pairs.iter().map(|(c, s)| 1.0 - (c - s).abs()).sum();
    (sum / pairs.len() as f32).clamp(0.0, 1.0)
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk shape of the vector index file.
#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// The long-term memory store.
///
/// Exclusively owns the vector index and the record ledger; nothing else may
/// mutate them. Embeddings are obtained from the injected [`Embedder`]
/// collaborator.
pub struct MemoryStore {
    index: VectorIndex,
    ledger: Vec<MemoryRecord>,
    embedder: Arc<dyn Embedder>,
    base_path: PathBuf,
    min_importance: f32,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("index", &self.index)
            .field("ledger", &self.ledger)
            .field("base_path", &self.base_path)
            .field("min_importance", &self.min_importance)
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Open the store at `base_path`, loading the persisted index/ledger pair
    /// if present.
    ///
    /// # Errors
    ///
    /// Refuses to open (so retrieval is never served against misaligned
    /// data) when exactly one of the pair exists
    /// ([`MemoryError::SiblingMissing`]), either file is malformed
    /// ([`MemoryError::Corrupt`]), the persisted dimension disagrees with the
    /// embedder ([`MemoryError::Dimension`]), or the lengths disagree
    /// ([`MemoryError::Divergence`]). Neither file existing yields a fresh
    /// empty store.
    pub fn open(
        base_path: impl Into<PathBuf>,
        min_importance: f32,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, MemoryError> {
        let base_path = base_path.into();
        let index_path = sibling(&base_path, INDEX_SUFFIX);
        let ledger_path = sibling(&base_path, LEDGER_SUFFIX);
        let min_importance = min_importance.clamp(0.0, 1.0);

        let (index, ledger) = match (index_path.exists(), ledger_path.exists()) {
            (false, false) => {
                debug!(base = %base_path.display(), "no persisted memory; starting empty");
                (VectorIndex::new(embedder.dimension()), Vec::new())
            }
            (true, false) => {
                return Err(MemoryError::SiblingMissing {
                    present: index_path,
                    missing: ledger_path,
                });
            }
            (false, true) => {
                return Err(MemoryError::SiblingMissing {
                    present: ledger_path,
                    missing: index_path,
                });
            }
            (true, true) => {
                let persisted: PersistedIndex = read_json(&index_path)?;
                let ledger: Vec<MemoryRecord> = read_json(&ledger_path)?;

                if persisted.dimension != embedder.dimension() {
                    return Err(MemoryError::Dimension {
                        expected: embedder.dimension(),
                        actual: persisted.dimension,
                    });
                }
                let index = VectorIndex::from_vectors(persisted.dimension, persisted.vectors)?;
                if index.len() != ledger.len() {
                    return Err(MemoryError::Divergence {
                        index_len: index.len(),
                        ledger_len: ledger.len(),
                    });
                }
                for (position, record) in ledger.iter().enumerate() {
                    if record.embedding_ref != position {
                        return Err(MemoryError::Corrupt {
                            path: ledger_path.clone(),
                            reason: format!(
                                "record at position {position} references embedding {}",
                                record.embedding_ref
                            ),
                        });
                    }
                }
                info!(memories = ledger.len(), base = %base_path.display(), "memory store loaded");
                (index, ledger)
            }
        };

        Ok(Self {
            index,
            ledger,
            embedder,
            base_path,
            min_importance,
        })
    }

    /// Store `text` as a long-term memory.
    ///
    /// `importance` defaults to the snapshot's intensity. Below the
    /// configured minimum the call returns [`StoreOutcome::Rejected`] without
    /// touching the index, the ledger, or the embedding collaborator — the
    /// gate is the normal path, not an error. Otherwise the embedding is
    /// appended to the index, an aligned record to the ledger, and the pair
    /// is persisted as a unit.
    ///
    /// # Errors
    ///
    /// On a persistence failure the freshly appended record stays in memory
    /// (index and ledger remain aligned) and the error is returned; the
    /// caller may continue in non-persisted mode.
    pub async fn store(
        &mut self,
        text: &str,
        snapshot: &AffectSnapshot,
        importance: Option<f32>,
    ) -> Result<StoreOutcome, MemoryError> {
        let importance = importance
            .unwrap_or_else(|| snapshot.intensity())
            .clamp(0.0, 1.0);
        if importance < self.min_importance {
            debug!(importance, minimum = self.min_importance, "below importance threshold; not stored");
            return Ok(StoreOutcome::Rejected {
                importance,
                minimum: self.min_importance,
            });
        }

        let embedding = self.embedder.embed(text).await?;
        let position = self.index.add(embedding)?;
        let record = MemoryRecord::new(text, position, importance, snapshot.vector);
        let id = record.id;
        self.ledger.push(record);
        debug_assert_eq!(self.index.len(), self.ledger.len());

        self.persist()?;
        info!(%id, importance, "memory stored");
        Ok(StoreOutcome::Stored(id))
    }

    /// Retrieve the `k` memories most relevant to `query` under the current
    /// affect, as `(record, score)` pairs, best first.
    pub async fn retrieve(
        &self,
        query: &str,
        current: &AffectVector,
        k: usize,
    ) -> Result<Vec<(MemoryRecord, f32)>, MemoryError> {
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let pool = k.saturating_mul(OVERSAMPLE).min(self.index.len());
        let candidates = self.index.search(&query_embedding, pool)?;

        let mut scored: Vec<(MemoryRecord, f32)> = candidates
            .into_iter()
            .map(|(position, distance)| {
                let record = &self.ledger[position];
                let semantic = 1.0 / (1.0 + distance);
                let alignment = emotional_alignment(Some(current), Some(&record.affect));
                let score = SEMANTIC_WEIGHT * semantic
                    + ALIGNMENT_WEIGHT * alignment
                    + IMPORTANCE_WEIGHT * record.importance
                    + INTENSITY_WEIGHT * record.affect.intensity();
                (record.clone(), score)
            })
            .collect();

        // Stable sort: equal scores keep the nearest-first candidate order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        debug!(query_len = query.len(), returned = scored.len(), "memories retrieved");
        Ok(scored)
    }

    /// Authoritative memory count (the ledger length always matches).
    pub fn count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The record ledger, in storage order.
    pub fn records(&self) -> &[MemoryRecord] {
        &self.ledger
    }

    pub fn min_importance(&self) -> f32 {
        self.min_importance
    }

    /// Write the index and ledger files as a unit.
    ///
    /// Each file goes through a temp-file-then-rename; the index is renamed
    /// first, the ledger second. A crash between the two renames surfaces as
    /// a length mismatch at the next open and the store refuses to serve.
    fn persist(&self) -> Result<(), MemoryError> {
        if let Some(parent) = self.base_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| MemoryError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let index_raw = serde_json::to_string(&PersistedIndex {
            dimension: self.index.dimension(),
            vectors: self.index.vectors().to_vec(),
        })?;
        let ledger_raw = serde_json::to_string(&self.ledger)?;

        write_atomic(&sibling(&self.base_path, INDEX_SUFFIX), &index_raw)?;
        write_atomic(&sibling(&self.base_path, LEDGER_SUFFIX), &ledger_raw)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// File helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Append `suffix` to `base` without replacing any existing extension.
fn sibling(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, MemoryError> {
    let raw = fs::read_to_string(path).map_err(|e| MemoryError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&raw).map_err(|e| MemoryError::Corrupt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), MemoryError> {
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, contents).map_err(|e| MemoryError::Io {
        path: tmp.clone(),
        source: e,
    })?;
    fs::rename(&tmp, path).map_err(|e| MemoryError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
