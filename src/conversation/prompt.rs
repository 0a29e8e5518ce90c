//! Prompt assembly for grounded answers

use super::history::ConversationHistory;
use crate::config::ConversationConfig;
use crate::types::{ChatMessage, ScoredPassage};

/// Builds the chat transcript sent to the generation model:
/// system instruction, replayed turns, then the context-bearing question.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_instruction: String,
    max_passages: usize,
    separator: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::from_config(&ConversationConfig::default())
    }
}

impl PromptAssembler {
    pub fn new(system_instruction: impl Into<String>, max_passages: usize, separator: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            max_passages,
            separator: separator.into(),
        }
    }

    pub fn from_config(config: &ConversationConfig) -> Self {
        Self::new(
            config.system_instruction.clone(),
            config.max_passages,
            config.separator.clone(),
        )
    }

    /// Passage texts in retrieval order, joined by the separator
    pub fn context(&self, passages: &[ScoredPassage]) -> String {
        passages
            .iter()
            .take(self.max_passages)
            .map(|scored| scored.passage.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    pub fn assemble(
        &self,
        passages: &[ScoredPassage],
        history: &ConversationHistory,
        query: &str,
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(2 + history.len() * 2);
        messages.push(ChatMessage::system(self.system_instruction.clone()));

        for turn in history.iter() {
            messages.push(ChatMessage::user(turn.user.clone()));
            messages.push(ChatMessage::assistant(turn.assistant.clone()));
        }

        messages.push(ChatMessage::user(format!(
            "Context:\n{}\n\nQuestion: {}",
            self.context(passages),
            query
        )));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Passage, Role, Turn};

    fn scored(texts: &[&str]) -> Vec<ScoredPassage> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| ScoredPassage {
                passage: Passage::new(i, *t),
                distance: i as f32,
            })
            .collect()
    }

    #[test]
    fn test_assemble_without_history() {
        let messages = PromptAssembler::default().assemble(
            &scored(&["Alpha.", "Beta."]),
            &ConversationHistory::default(),
            "What comes first?",
        );

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(
            messages[0].content,
            "You are an intelligent assistant. Answer based on the context provided."
        );
        assert_eq!(
            messages[1].content,
            "Context:\nAlpha.\n---\nBeta.\n\nQuestion: What comes first?"
        );
    }

    #[test]
    fn test_history_replayed_in_order() {
        let mut history = ConversationHistory::new(5);
        history.push(Turn::new("q1", "a1"));
        history.push(Turn::new("q2", "a2"));

        let messages = PromptAssembler::default().assemble(&scored(&["ctx"]), &history, "q3");
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages[1].content, "q1");
        assert_eq!(messages[4].content, "a2");
    }

    #[test]
    fn test_passages_capped() {
        let assembler = PromptAssembler::new("sys", 2, " | ");
        assert_eq!(assembler.context(&scored(&["a", "b", "c"])), "a | b");
    }
}
