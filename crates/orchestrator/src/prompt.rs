//! Builds the chat messages sent to providers.

use provider_core::ChatMessage;

use crate::message::{Message, MessageRole};
use crate::template::AgentTemplate;

/// System prompt for a template: its framing plus the specialties it covers.
pub fn system_prompt(template: &AgentTemplate) -> String {
    if template.specialties.is_empty() {
        return template.system_prompt.clone();
    }
    format!(
        "{}\n\nYou are the {} and specialise in: {}.",
        template.system_prompt.trim_end(),
        template.name,
        template.specialties.join(", ")
    )
}

/// System message, then history oldest first, then the new user message.
pub fn build_messages(template: &AgentTemplate, history: &[Message], text: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(system_prompt(template)));
    messages.extend(history.iter().map(|message| match message.role {
        MessageRole::User => ChatMessage::user(&message.content),
        MessageRole::Agent => ChatMessage::assistant(&message.content),
    }));
    messages.push(ChatMessage::user(text));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{MessageMetadata, ResponseSource};
    use chrono::Utc;
    use provider_core::ChatRole;

    #[test]
    fn test_prompt_layout() {
        let template = AgentTemplate::new("sales", "Sales Advisor", "You sell things.")
            .with_specialties(&["sales", "pricing"]);
        let history = vec![
            Message::user("earlier question", Utc::now()),
            Message::agent(
                "sales",
                "earlier answer",
                Utc::now(),
                0.6,
                MessageMetadata {
                    source: ResponseSource::Llm,
                    processing_time_ms: 5,
                    provider_id: Some("ollama".into()),
                    model: Some("llama3.2".into()),
                    tools_used: Vec::new(),
                },
            ),
        ];

        let messages = build_messages(&template, &history, "new question");
        let roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![ChatRole::System, ChatRole::User, ChatRole::Assistant, ChatRole::User]
        );
        assert!(messages[0].content.contains("specialise in: sales, pricing"));
        assert_eq!(messages[3].content, "new question");
    }
}
