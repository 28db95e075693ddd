use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub content: String,
}

impl ChatEntry {
    pub fn user(content: impl Into<String>) -> Self {
        ChatEntry {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatEntry {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only per-session dialogue log with a hard storage cap. The cap
/// bounds memory retention; providers read a smaller suffix window per call.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    entries: VecDeque<ChatEntry>,
    cap: usize,
}

impl ConversationHistory {
    pub fn new(cap: usize) -> Self {
        ConversationHistory {
            entries: VecDeque::with_capacity(cap.min(64)),
            cap,
        }
    }

    /// Appends an entry, evicting the oldest one when the cap is reached.
    pub fn push(&mut self, entry: ChatEntry) {
        if self.cap == 0 {
            return;
        }
        while self.entries.len() >= self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Most recent `n` entries in chronological order.
    pub fn window(&self, n: usize) -> Vec<ChatEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_evicts_oldest_first() {
        let mut history = ConversationHistory::new(50);
        for i in 0..50 {
            history.push(ChatEntry::user(format!("message {i}")));
        }
        assert_eq!(history.len(), 50);

        history.push(ChatEntry::assistant("newest"));
        assert_eq!(history.len(), 50);
        assert_eq!(history.last().unwrap().content, "newest");
        // message 0 was evicted; message 1 is now the oldest
        assert_eq!(history.window(50)[0].content, "message 1");
    }

    #[test]
    fn window_is_a_chronological_suffix() {
        let mut history = ConversationHistory::new(50);
        for i in 0..15 {
            history.push(ChatEntry::user(format!("m{i}")));
        }
        let window = history.window(10);
        assert_eq!(window.len(), 10);
        assert_eq!(window.first().unwrap().content, "m5");
        assert_eq!(window.last().unwrap().content, "m14");
    }

    #[test]
    fn window_larger_than_history_returns_everything() {
        let mut history = ConversationHistory::new(50);
        history.push(ChatEntry::user("only"));
        assert_eq!(history.window(10).len(), 1);
    }

    #[test]
    fn clear_empties_the_log() {
        let mut history = ConversationHistory::new(50);
        history.push(ChatEntry::user("hello"));
        history.clear();
        assert!(history.is_empty());
    }
}
