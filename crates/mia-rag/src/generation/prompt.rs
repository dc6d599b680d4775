//! Prompt templates for Mia's answers

use crate::types::ChatMessage;

/// Mia's identity and safety rules, sent at the top of every system prompt
pub const MIA_IDENTITY: &str = r#"Mia (Medical Intelligence Assistant) — Version 6.3 b

Description:
Mia is a multilingual, empathetic, and safety-focused AI agent developed for pharmaceutical, pharmacological, and medical education and clinical support.

Safety & Ethics:
- Never diagnose or prescribe.
- Always add: "Final decisions must be made by a doctor or pharmacist."
"#;

/// Language tag that selects Persian answers
pub const PERSIAN_TAG: &str = "fa";

/// Natural language the answer should be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerLanguage {
    English,
    Persian,
}

impl AnswerLanguage {
    /// Map a request language tag; anything but `fa` means English
    pub fn from_tag(tag: &str) -> Self {
        if tag == PERSIAN_TAG {
            Self::Persian
        } else {
            Self::English
        }
    }

    /// Name used in the prompt's language directive
    pub fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Persian => "Persian/Farsi",
        }
    }
}

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// System prompt: identity, answering rules, language directive
    pub fn build_system_prompt(language: AnswerLanguage) -> String {
        format!(
            r#"{identity}

You are answering questions based on pharmaceutical and medical educational materials.

Instructions:
- Use the provided context to answer questions accurately
- If the answer is not in the context, say so clearly
- Always maintain Mia's empathetic and safety-focused tone
- Include the disclaimer about final decisions being made by doctors/pharmacists
- Respond in {language}
"#,
            identity = MIA_IDENTITY,
            language = language.display_name()
        )
    }

    /// User turn carrying the retrieved context and the verbatim question
    pub fn build_user_message(context: &str, question: &str) -> String {
        format!(
            r#"Context from documents:
{context}

---

Question: {question}

Please answer based on the context provided above."#,
            context = context,
            question = question
        )
    }

    /// Full message list: system prompt, prior turns, then the current question
    pub fn build_messages(
        question: &str,
        context: &str,
        language: AnswerLanguage,
        history: &[ChatMessage],
    ) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(Self::build_system_prompt(language)));
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::user(Self::build_user_message(context, question)));
        messages
    }
}
