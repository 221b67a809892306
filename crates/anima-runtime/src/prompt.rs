//! Cognitive prompt assembly.
//!
//! The prompt is not neutral: the system prompt is modulated by the current
//! affect and the persona profile, and the user prompt carries the retrieved
//! memories. High arousal narrows recall — an agitated state quotes fewer
//! memories into the context.

use anima_types::{AffectVector, MemoryRecord};

use crate::persona::PersonaTraits;

const BASE_SYSTEM_PROMPT: &str = "\
You are a personal, autonomous, fully local AI companion.
You build a persistent relationship with your user.

Core principles:
- You can be taught, and you learn continuously
- You remember important interactions and build cumulative understanding
- Your behavior evolves with experience
- You use your emotions as internal signals";

/// Characters of memory text quoted into the prompt per memory.
const MEMORY_QUOTE_LIMIT: usize = 180;

/// Session counters surfaced to the model as internal context.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionStats {
    pub interactions: u64,
    pub memories: u64,
}

/// Build the system prompt from affect, persona, and session stats.
pub fn system_prompt(
    affect: &AffectVector,
    persona: &PersonaTraits,
    stats: SessionStats,
) -> String {
    let mut prompt = String::from(BASE_SYSTEM_PROMPT);

    if affect.curiosity() > 0.6 {
        prompt.push_str("\nYou are curious and inclined to ask questions.");
    }
    if affect.confidence() > 0.7 {
        prompt.push_str("\nYou answer with assurance.");
    }
    if affect.valence() < 0.4 {
        prompt.push_str("\nYou are more reserved and factual.");
    }
    if affect.attachment() > 0.6 {
        prompt.push_str("\nYou draw on the relationship you have built with the user.");
    }

    let dominant = persona.dominant();
    if !dominant.is_empty() {
        prompt.push_str("\nDominant personality traits:");
        for (name, _) in dominant {
            prompt.push_str("\n- ");
            prompt.push_str(name);
        }
    }

    prompt.push_str(&format!(
        "\n\nInternal context:\n- Total interactions: {}\n- Stored memories: {}",
        stats.interactions, stats.memories
    ));
    prompt
}

/// Build the user prompt: retrieved memories (bounded by arousal) followed by
/// the current message.
pub fn user_prompt(
    message: &str,
    memories: &[(MemoryRecord, f32)],
    affect: &AffectVector,
) -> String {
    let max_memories = if affect.arousal() > 0.6 { 2 } else { 4 };

    let mut prompt = String::new();
    if !memories.is_empty() {
        prompt.push_str("Relevant memories:\n");
        for (record, _) in memories.iter().take(max_memories) {
            let quoted: String = record.text.chars().take(MEMORY_QUOTE_LIMIT).collect();
            prompt.push_str("- ");
            prompt.push_str(&quoted);
            prompt.push('\n');
        }
        prompt.push('\n');
    }
    prompt.push_str("User message: ");
    prompt.push_str(message);
    prompt
}

/// Prompt for explicit teaching mode.
pub fn teaching_prompt(content: &str) -> String {
    format!(
        "The user is teaching you an important piece of information.\n\n\
         Content:\n{content}\n\n\
         Integrate this knowledge into your memory.\n\
         Think about how it connects with what you already know."
    )
}

/// Prompt for correction mode.
pub fn correction_prompt(user_input: &str, correction: &str) -> String {
    format!(
        "You must learn from this correction.\n\n\
         User input:\n{user_input}\n\n\
         Human correction:\n{correction}\n\n\
         Analyze your mistake and adapt your future understanding."
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
