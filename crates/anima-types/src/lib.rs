use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of characters of triggering text kept on a snapshot.
pub const TRIGGER_LIMIT: usize = 120;

// ─────────────────────────────────────────────────────────────────────────────
// AffectVector
// ─────────────────────────────────────────────────────────────────────────────

/// The six-dimensional affect state: valence, arousal, dominance, confidence,
/// curiosity, attachment.
///
/// Every dimension is held in `[0.0, 1.0]`; construction, mutation, and
/// deserialization all clamp into that range. `intensity` and `label` are
/// derived on demand and never stored as independent fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawAffectVector")]
pub struct AffectVector {
    valence: f32,
    arousal: f32,
    dominance: f32,
    confidence: f32,
    curiosity: f32,
    attachment: f32,
}

/// Unvalidated mirror of [`AffectVector`] used to clamp on deserialization.
#[derive(Debug, Clone, Copy, Deserialize)]
struct RawAffectVector {
    valence: f32,
    arousal: f32,
    dominance: f32,
    confidence: f32,
    curiosity: f32,
    attachment: f32,
}

impl From<RawAffectVector> for AffectVector {
    fn from(raw: RawAffectVector) -> Self {
        Self::new(
            raw.valence,
            raw.arousal,
            raw.dominance,
            raw.confidence,
            raw.curiosity,
            raw.attachment,
        )
    }
}

impl Default for AffectVector {
    /// Session-start disposition: mildly calm, mildly curious, low attachment.
    fn default() -> Self {
        Self::new(0.5, 0.3, 0.5, 0.5, 0.4, 0.2)
    }
}

impl AffectVector {
    /// Construct a vector, clamping every dimension to `[0.0, 1.0]`.
    pub fn new(
        valence: f32,
        arousal: f32,
        dominance: f32,
        confidence: f32,
        curiosity: f32,
        attachment: f32,
    ) -> Self {
        Self {
            valence: valence.clamp(0.0, 1.0),
            arousal: arousal.clamp(0.0, 1.0),
            dominance: dominance.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            curiosity: curiosity.clamp(0.0, 1.0),
            attachment: attachment.clamp(0.0, 1.0),
        }
    }

    pub fn valence(&self) -> f32 {
        self.valence
    }
    pub fn arousal(&self) -> f32 {
        self.arousal
    }
    pub fn dominance(&self) -> f32 {
        self.dominance
    }
    pub fn confidence(&self) -> f32 {
        self.confidence
    }
    pub fn curiosity(&self) -> f32 {
        self.curiosity
    }
    pub fn attachment(&self) -> f32 {
        self.attachment
    }

    pub fn set_valence(&mut self, v: f32) {
        self.valence = v.clamp(0.0, 1.0);
    }
    pub fn set_arousal(&mut self, v: f32) {
        self.arousal = v.clamp(0.0, 1.0);
    }
    pub fn set_dominance(&mut self, v: f32) {
        self.dominance = v.clamp(0.0, 1.0);
    }
    pub fn set_confidence(&mut self, v: f32) {
        self.confidence = v.clamp(0.0, 1.0);
    }
    pub fn set_curiosity(&mut self, v: f32) {
        self.curiosity = v.clamp(0.0, 1.0);
    }
    pub fn set_attachment(&mut self, v: f32) {
        self.attachment = v.clamp(0.0, 1.0);
    }

    /// Overall affective intensity: how far the state is from neutral.
    ///
    /// Mean of the valence deviation from baseline, the arousal level, and
    /// the curiosity level.
    pub fn intensity(&self) -> f32 {
        ((self.valence - 0.5).abs() + self.arousal + self.curiosity) / 3.0
    }

    /// Categorical label derived from the vector by a fixed decision tree.
    ///
    /// The branch order is part of the contract: intensity gates first, then
    /// valence, then arousal, then curiosity before confidence. Two equal
    /// vectors always yield the same label.
    pub fn label(&self) -> AffectLabel {
        if self.intensity() < 0.3 {
            return AffectLabel::Neutral;
        }
        if self.valence > 0.7 {
            if self.arousal > 0.7 {
                AffectLabel::Enthusiastic
            } else if self.arousal < 0.3 {
                AffectLabel::Serene
            } else {
                AffectLabel::Content
            }
        } else if self.valence < 0.3 {
            if self.arousal > 0.7 {
                AffectLabel::Anxious
            } else if self.arousal < 0.3 {
                AffectLabel::Melancholic
            } else {
                AffectLabel::Preoccupied
            }
        } else if self.curiosity > 0.7 {
            AffectLabel::Curious
        } else if self.confidence > 0.7 {
            AffectLabel::Confident
        } else {
            AffectLabel::Attentive
        }
    }
}

/// Categorical mood label derived from an [`AffectVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffectLabel {
    Neutral,
    Enthusiastic,
    Serene,
    Content,
    Anxious,
    Melancholic,
    Preoccupied,
    Curious,
    Confident,
    Attentive,
}

impl std::fmt::Display for AffectLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            AffectLabel::Neutral => "neutral",
            AffectLabel::Enthusiastic => "enthusiastic",
            AffectLabel::Serene => "serene",
            AffectLabel::Content => "content",
            AffectLabel::Anxious => "anxious",
            AffectLabel::Melancholic => "melancholic",
            AffectLabel::Preoccupied => "preoccupied",
            AffectLabel::Curious => "curious",
            AffectLabel::Confident => "confident",
            AffectLabel::Attentive => "attentive",
        };
        write!(f, "{name}")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// AffectSnapshot
// ─────────────────────────────────────────────────────────────────────────────

/// Immutable record of the affect vector at a point in time, together with a
/// truncated copy of the text that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectSnapshot {
    /// Wall-clock time at which the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Triggering text, truncated to [`TRIGGER_LIMIT`] characters.
    pub trigger: String,
    /// The affect vector at snapshot time.
    pub vector: AffectVector,
}

impl AffectSnapshot {
    /// Snapshot `vector` now, keeping at most [`TRIGGER_LIMIT`] characters of
    /// the triggering text.
    pub fn new(vector: AffectVector, trigger: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            trigger: trigger.chars().take(TRIGGER_LIMIT).collect(),
            vector,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.vector.intensity()
    }

    pub fn label(&self) -> AffectLabel {
        self.vector.label()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryRecord
// ─────────────────────────────────────────────────────────────────────────────

/// A single long-term memory. Created once at store time and never mutated.
///
/// `embedding_ref` is the positional reference into the vector index; the
/// index and the record ledger must stay aligned position-for-position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    /// The remembered text.
    pub text: String,
    /// Position of this record's embedding in the vector index.
    pub embedding_ref: usize,
    /// Storage priority in `[0.0, 1.0]`.
    pub importance: f32,
    /// Affect state at the moment of storage.
    pub affect: AffectVector,
    pub timestamp: DateTime<Utc>,
}

impl MemoryRecord {
    /// Construct a record with a fresh UUID and the current UTC timestamp.
    pub fn new(
        text: impl Into<String>,
        embedding_ref: usize,
        importance: f32,
        affect: AffectVector,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            embedding_ref,
            importance: importance.clamp(0.0, 1.0),
            affect,
            timestamp: Utc::now(),
        }
    }
}

/// Result of a long-term store attempt.
///
/// `Rejected` is the importance gate firing, not an error: nothing was
/// mutated and the caller is expected to carry on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StoreOutcome {
    /// The memory was appended to the index and ledger.
    Stored(Uuid),
    /// The memory fell below the configured minimum importance.
    Rejected { importance: f32, minimum: f32 },
}

impl StoreOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, StoreOutcome::Stored(_))
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            StoreOutcome::Stored(id) => Some(*id),
            StoreOutcome::Rejected { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat messages
// ─────────────────────────────────────────────────────────────────────────────

/// The role of a participant in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a chat conversation, in the shape the generation
/// collaborator consumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── AffectVector ─────────────────────────────────────────────────────────

    #[test]
    fn default_vector_matches_session_start_disposition() {
        let v = AffectVector::default();
        assert!((v.valence() - 0.5).abs() < 1e-6);
        assert!((v.arousal() - 0.3).abs() < 1e-6);
        assert!((v.dominance() - 0.5).abs() < 1e-6);
        assert!((v.confidence() - 0.5).abs() < 1e-6);
        assert!((v.curiosity() - 0.4).abs() < 1e-6);
        assert!((v.attachment() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn new_clamps_out_of_range_dimensions() {
        let v = AffectVector::new(1.5, -0.3, 0.5, 2.0, -1.0, 0.7);
        assert_eq!(v.valence(), 1.0);
        assert_eq!(v.arousal(), 0.0);
        assert_eq!(v.confidence(), 1.0);
        assert_eq!(v.curiosity(), 0.0);
    }

    #[test]
    fn setters_clamp() {
        let mut v = AffectVector::default();
        v.set_arousal(7.0);
        assert_eq!(v.arousal(), 1.0);
        v.set_valence(-3.0);
        assert_eq!(v.valence(), 0.0);
    }

    #[test]
    fn deserialization_clamps_out_of_range_values() {
        let json = r#"{"valence":1.8,"arousal":-0.2,"dominance":0.5,
                       "confidence":0.5,"curiosity":0.5,"attachment":0.5}"#;
        let v: AffectVector = serde_json::from_str(json).unwrap();
        assert_eq!(v.valence(), 1.0);
        assert_eq!(v.arousal(), 0.0);
    }

    #[test]
    fn vector_serde_roundtrip() {
        let v = AffectVector::new(0.8, 0.2, 0.6, 0.4, 0.9, 0.1);
        let json = serde_json::to_string(&v).unwrap();
        let back: AffectVector = serde_json::from_str(&json).unwrap();
        assert_eq!(v, back);
    }

    #[test]
    fn intensity_is_mean_of_deviation_arousal_curiosity() {
        let v = AffectVector::new(0.9, 0.6, 0.5, 0.5, 0.3, 0.2);
        // (|0.9 - 0.5| + 0.6 + 0.3) / 3 = 1.3 / 3
        assert!((v.intensity() - 1.3 / 3.0).abs() < 1e-6);
    }

    // ── Label decision tree ──────────────────────────────────────────────────

    #[test]
    fn low_intensity_is_neutral_regardless_of_valence() {
        // High valence but intensity below 0.3: the intensity gate wins.
        let v = AffectVector::new(0.75, 0.1, 0.5, 0.9, 0.1, 0.2);
        assert!(v.intensity() < 0.3);
        assert_eq!(v.label(), AffectLabel::Neutral);
    }

    #[test]
    fn high_valence_branches_on_arousal() {
        let enthusiastic = AffectVector::new(0.9, 0.8, 0.5, 0.5, 0.5, 0.2);
        assert_eq!(enthusiastic.label(), AffectLabel::Enthusiastic);

        let serene = AffectVector::new(0.9, 0.2, 0.5, 0.5, 0.6, 0.2);
        assert_eq!(serene.label(), AffectLabel::Serene);

        let content = AffectVector::new(0.9, 0.5, 0.5, 0.5, 0.5, 0.2);
        assert_eq!(content.label(), AffectLabel::Content);
    }

    #[test]
    fn low_valence_branches_on_arousal() {
        let anxious = AffectVector::new(0.1, 0.8, 0.5, 0.5, 0.5, 0.2);
        assert_eq!(anxious.label(), AffectLabel::Anxious);

        let melancholic = AffectVector::new(0.1, 0.2, 0.5, 0.5, 0.7, 0.2);
        assert_eq!(melancholic.label(), AffectLabel::Melancholic);

        let preoccupied = AffectVector::new(0.1, 0.5, 0.5, 0.5, 0.5, 0.2);
        assert_eq!(preoccupied.label(), AffectLabel::Preoccupied);
    }

    #[test]
    fn mid_valence_checks_curiosity_before_confidence() {
        // Both curiosity and confidence above 0.7: curiosity wins.
        let v = AffectVector::new(0.5, 0.5, 0.5, 0.9, 0.8, 0.2);
        assert_eq!(v.label(), AffectLabel::Curious);

        let confident = AffectVector::new(0.5, 0.5, 0.5, 0.9, 0.5, 0.2);
        assert_eq!(confident.label(), AffectLabel::Confident);

        let attentive = AffectVector::new(0.5, 0.6, 0.5, 0.5, 0.5, 0.2);
        assert_eq!(attentive.label(), AffectLabel::Attentive);
    }

    #[test]
    fn label_display_is_lowercase() {
        assert_eq!(AffectLabel::Enthusiastic.to_string(), "enthusiastic");
        assert_eq!(AffectLabel::Neutral.to_string(), "neutral");
    }

    // ── AffectSnapshot ───────────────────────────────────────────────────────

    #[test]
    fn snapshot_truncates_trigger_text() {
        let long = "x".repeat(500);
        let snap = AffectSnapshot::new(AffectVector::default(), &long);
        assert_eq!(snap.trigger.chars().count(), TRIGGER_LIMIT);
    }

    #[test]
    fn snapshot_truncation_respects_char_boundaries() {
        let long = "é".repeat(200);
        let snap = AffectSnapshot::new(AffectVector::default(), &long);
        assert_eq!(snap.trigger.chars().count(), TRIGGER_LIMIT);
    }

    #[test]
    fn snapshot_delegates_intensity_and_label() {
        let v = AffectVector::new(0.9, 0.8, 0.5, 0.5, 0.5, 0.2);
        let snap = AffectSnapshot::new(v, "hello");
        assert!((snap.intensity() - v.intensity()).abs() < 1e-6);
        assert_eq!(snap.label(), v.label());
    }

    // ── MemoryRecord / StoreOutcome ──────────────────────────────────────────

    #[test]
    fn memory_record_clamps_importance() {
        let rec = MemoryRecord::new("text", 0, 1.7, AffectVector::default());
        assert_eq!(rec.importance, 1.0);
    }

    #[test]
    fn memory_record_serde_roundtrip() {
        let rec = MemoryRecord::new("a memory", 3, 0.8, AffectVector::default());
        let json = serde_json::to_string(&rec).unwrap();
        let back: MemoryRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, rec.id);
        assert_eq!(back.embedding_ref, 3);
        assert_eq!(back.text, "a memory");
    }

    #[test]
    fn store_outcome_helpers() {
        let id = Uuid::new_v4();
        assert!(StoreOutcome::Stored(id).is_stored());
        assert_eq!(StoreOutcome::Stored(id).id(), Some(id));

        let rejected = StoreOutcome::Rejected {
            importance: 0.1,
            minimum: 0.3,
        };
        assert!(!rejected.is_stored());
        assert_eq!(rejected.id(), None);
    }

    // ── ChatMessage ──────────────────────────────────────────────────────────

    #[test]
    fn chat_message_serializes_role_lowercase() {
        let msg = ChatMessage::system("hello");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"system\""));
    }

    #[test]
    fn chat_message_roundtrip() {
        let msg = ChatMessage::user("What do you remember?");
        let json = serde_json::to_string(&msg).unwrap();
        let back: ChatMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
