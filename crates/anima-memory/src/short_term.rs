//! Short-Term Conversational Window.
//!
//! A bounded FIFO of recent turns, flattened on demand into the role-tagged
//! message sequence the generation collaborator consumes. Recency is the only
//! criterion here: no importance weighting, no filtering — salience-based
//! retention is the long-term store's job. The window lives only in memory
//! and is discarded at session end.

use std::collections::VecDeque;

use anima_types::{AffectSnapshot, ChatMessage};
use chrono::{DateTime, Utc};

/// One user/agent exchange with the affect snapshot taken for it.
#[derive(Debug, Clone)]
pub struct ShortTermTurn {
    pub timestamp: DateTime<Utc>,
    pub user_text: String,
    pub agent_text: String,
    pub affect: AffectSnapshot,
}

impl ShortTermTurn {
    pub fn new(
        user_text: impl Into<String>,
        agent_text: impl Into<String>,
        affect: AffectSnapshot,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_text: user_text.into(),
            agent_text: agent_text.into(),
            affect,
        }
    }
}

/// Bounded FIFO of recent conversation turns.
pub struct ShortTermWindow {
    capacity: usize,
    turns: VecDeque<ShortTermTurn>,
}

impl ShortTermWindow {
    /// Create a window holding at most `capacity` turns (minimum 1).
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            turns: VecDeque::new(),
        }
    }

    /// Append a turn, evicting the oldest when at capacity.
    pub fn append(&mut self, turn: ShortTermTurn) {
        while self.turns.len() >= self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    /// Flatten the window into alternating user/assistant messages in
    /// chronological order.
    pub fn as_messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.turns.len() * 2);
        for turn in &self.turns {
            messages.push(ChatMessage::user(turn.user_text.clone()));
            messages.push(ChatMessage::assistant(turn.agent_text.clone()));
        }
        messages
    }

    /// The retained turns, oldest first.
    pub fn turns(&self) -> &VecDeque<ShortTermTurn> {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop every turn; used on session reset.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use anima_types::{AffectVector, Role};

    fn turn(n: usize) -> ShortTermTurn {
        ShortTermTurn::new(
            format!("user {n}"),
            format!("agent {n}"),
            AffectSnapshot::new(AffectVector::default(), "t"),
        )
    }

    #[test]
    fn append_evicts_oldest_at_capacity() {
        let mut window = ShortTermWindow::new(3);
        for n in 1..=4 {
            window.append(turn(n));
        }

        assert_eq!(window.len(), 3);
        let messages = window.as_messages();
        assert_eq!(messages.len(), 6);
        // T1 was evicted; order is T2, T3, T4.
        assert_eq!(messages[0].content, "user 2");
        assert_eq!(messages[2].content, "user 3");
        assert_eq!(messages[4].content, "user 4");
    }

    #[test]
    fn messages_alternate_user_then_assistant() {
        let mut window = ShortTermWindow::new(5);
        window.append(turn(1));
        window.append(turn(2));

        let messages = window.as_messages();
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "agent 1");
        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[3].role, Role::Assistant);
    }

    #[test]
    fn empty_window_yields_no_messages() {
        let window = ShortTermWindow::new(3);
        assert!(window.is_empty());
        assert!(window.as_messages().is_empty());
    }

    #[test]
    fn clear_resets_to_empty() {
        let mut window = ShortTermWindow::new(3);
        window.append(turn(1));
        window.append(turn(2));
        window.clear();
        assert!(window.is_empty());
        assert!(window.as_messages().is_empty());
    }

    #[test]
    fn capacity_is_at_least_one() {
        let mut window = ShortTermWindow::new(0);
        assert_eq!(window.capacity(), 1);
        window.append(turn(1));
        window.append(turn(2));
        assert_eq!(window.len(), 1);
        assert_eq!(window.turns().front().unwrap().user_text, "user 2");
    }
}
