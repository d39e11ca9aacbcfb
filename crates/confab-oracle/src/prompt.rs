//! Prompt construction for the completion endpoint.
//!
//! History is rendered as plain `speaker: text` lines over a fixed
//! trailing window. Only plain text messages are rendered; tombstones,
//! file transfers and call summaries would read as noise to the model.

use confab_shared::constants::{ROLEPLAY_HISTORY_WINDOW, SUGGEST_HISTORY_WINDOW};
use confab_shared::types::{MessageKind, Sender};
use confab_store::Message;

fn render_history(
    history: &[Message],
    window: usize,
    me_label: &str,
    them_label: &str,
) -> String {
    let start = history.len().saturating_sub(window);
    history[start..]
        .iter()
        .filter(|m| !m.deleted && !m.text.is_empty() && matches!(m.kind, MessageKind::Text))
        .map(|m| {
            let speaker = match m.sender {
                Sender::Me => me_label,
                Sender::Them => them_label,
            };
            format!("{speaker}: {}", m.text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prompt asking for a completion of the user's unsent draft.
pub fn suggest_prompt(history: &[Message], draft: &str) -> String {
    let rendered = render_history(history, SUGGEST_HISTORY_WINDOW, "Me", "Them");
    format!(
        "You are a helpful chat assistant providing smart replies.\n\
         Based on the following conversation history and the user's current message draft, \
         suggest a concise and natural-sounding completion or reply.\n\
         Only return the suggested text, without any prefixes like \"Suggestion:\".\n\
         \n\
         ---\n\
         CONVERSATION HISTORY:\n\
         {rendered}\n\
         ---\n\
         USER IS TYPING:\n\
         \"{draft}\"\n\
         ---\n\
         \n\
         SUGGESTED REPLY:"
    )
}

/// Prompt asking for one reply in the counterparty's voice.
pub fn roleplay_prompt(history: &[Message], contact_name: &str) -> String {
    let rendered = render_history(history, ROLEPLAY_HISTORY_WINDOW, "You", contact_name);
    format!(
        "You are role-playing as a person named {contact_name} in a secure chat application.\n\
         Your personality should be friendly and natural. Keep your replies concise, like a \
         real text message.\n\
         Do not break character. Do not mention that you are an AI.\n\
         Based on the following conversation history, write a plausible reply as {contact_name}.\n\
         \n\
         ---\n\
         CONVERSATION HISTORY:\n\
         {rendered}\n\
         ---\n\
         \n\
         REPLY AS {contact_name}:"
    )
}

/// Normalize a suggestion: trim, then strip one pair of wrapping double
/// quotes if the model added them.
pub fn clean_suggestion(raw: &str) -> String {
    let trimmed = raw.trim();
    let stripped = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    stripped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use confab_shared::types::{MessageId, MessageKind};

    fn msg(sender: Sender, text: &str) -> Message {
        Message {
            id: MessageId::new(format!("m-{text}")),
            sender,
            text: text.to_string(),
            obfuscated_text: confab_shared::cipher::obfuscate(text),
            timestamp: Utc::now(),
            kind: MessageKind::Text,
            read: false,
            deleted: false,
            edited: false,
            uploading: false,
        }
    }

    #[test]
    fn test_suggest_prompt_windows_history() {
        let history: Vec<Message> = (0..8)
            .map(|i| msg(Sender::Me, &format!("line {i}")))
            .collect();
        let prompt = suggest_prompt(&history, "so anyway");

        assert!(prompt.contains("Me: line 7"));
        assert!(prompt.contains("Me: line 3"));
        assert!(!prompt.contains("line 2"), "only the last 5 lines are kept");
        assert!(prompt.contains("\"so anyway\""));
    }

    #[test]
    fn test_roleplay_prompt_uses_contact_name() {
        let history = vec![msg(Sender::Them, "hey"), msg(Sender::Me, "hi Alice")];
        let prompt = roleplay_prompt(&history, "Alice");

        assert!(prompt.contains("Alice: hey"));
        assert!(prompt.contains("You: hi Alice"));
        assert!(prompt.contains("REPLY AS Alice:"));
    }

    #[test]
    fn test_only_plain_text_messages_are_rendered() {
        let mut tombstone = msg(Sender::Me, "oops");
        tombstone.text.clear();
        tombstone.deleted = true;
        let mut call = msg(Sender::Them, "Call ended");
        call.kind = MessageKind::Call { duration_secs: 42 };
        let history = vec![tombstone, call, msg(Sender::Them, "still here")];

        let prompt = roleplay_prompt(&history, "Bob");
        assert!(!prompt.contains("You: \n"));
        assert!(!prompt.contains("Call ended"));
        assert!(prompt.contains("Bob: still here"));
    }

    #[test]
    fn test_clean_suggestion_strips_one_quote_pair() {
        assert_eq!(clean_suggestion("  \"sounds good\"  "), "sounds good");
        assert_eq!(clean_suggestion("no quotes"), "no quotes");
        assert_eq!(clean_suggestion("\"\"nested\"\""), "\"nested\"");
        assert_eq!(clean_suggestion("\"unbalanced"), "\"unbalanced");
    }
}
