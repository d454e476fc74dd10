//! Builds the ordered turn list sent upstream for one exchange.
//!
//! The list is rebuilt from history on every request because the provider
//! is stateless. Attachments are sent inline with the user turn they were
//! bound to, so each part appears exactly once per outbound request.

use std::ops::Range;

use crate::conversation::{Conversation, Role};
use crate::error::ChatError;
use crate::part::AttachmentPart;

/// Message body used when files are sent without any text.
pub const DEFAULT_ATTACHMENT_PROMPT: &str = "Analyze the attached files.";

/// One element of an outbound turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundPart {
    Text(String),
    Attachment(AttachmentPart),
}

/// A role-tagged turn as submitted to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundTurn {
    pub role: Role,
    pub parts: Vec<OutboundPart>,
}

impl OutboundTurn {
    /// Number of binary parts in this turn.
    pub fn attachment_count(&self) -> usize {
        self.parts.iter().filter(|p| matches!(p, OutboundPart::Attachment(_))).count()
    }

    /// Concatenated text of this turn.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                OutboundPart::Text(t) => Some(t.as_str()),
                OutboundPart::Attachment(_) => None,
            })
            .collect()
    }
}

/// Result of [`assemble`].
#[derive(Debug, Clone)]
pub struct Assembled {
    /// History followed by the current user turn.
    pub turns: Vec<OutboundTurn>,
    /// The trimmed message as it should be stored in history. Never contains
    /// the synthesized attachment header.
    pub stored_text: String,
    /// Attachments this exchange binds to its user turn once it succeeds.
    pub binds: Range<usize>,
}

/// Header listing attachment names, prepended to the message text of the
/// turn that first carries them.
pub fn attachment_header<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    let lines: Vec<String> = names.into_iter().map(|n| format!("  • {n}")).collect();
    format!("📎 Attached files:\n{}\n\n", lines.join("\n"))
}

/// Assemble the outbound turns for `message` on top of `conversation`.
///
/// Fails with [`ChatError::EmptyMessage`] when the trimmed message is empty
/// and the session has never received an attachment.
///
/// Files uploaded after earlier exchanges are not folded into the first
/// history turn. They travel once, on the current turn, under a header that
/// names only them, and stay bound to that turn on later requests.
pub fn assemble(conversation: &Conversation, message: &str) -> Result<Assembled, ChatError> {
    let message = message.trim();
    if message.is_empty() && !conversation.has_attachments() {
        return Err(ChatError::EmptyMessage);
    }

    let attachments = conversation.attachments();
    let mut turns = Vec::with_capacity(conversation.history().len() + 1);

    for turn in conversation.history() {
        let mut parts: Vec<OutboundPart> = attachments[turn.attachments.clone()]
            .iter()
            .map(|a| OutboundPart::Attachment(a.part.clone()))
            .collect();
        parts.push(OutboundPart::Text(turn.text.clone()));
        turns.push(OutboundTurn { role: turn.role, parts });
    }

    let pending = conversation.pending();
    let mut current: Vec<OutboundPart> = pending
        .iter()
        .map(|a| OutboundPart::Attachment(a.part.clone()))
        .collect();

    let text = if pending.is_empty() {
        message.to_owned()
    } else {
        let body = if message.is_empty() { DEFAULT_ATTACHMENT_PROMPT } else { message };
        attachment_header(pending.iter().map(|a| a.name.as_str())) + body
    };
    current.push(OutboundPart::Text(text));
    turns.push(OutboundTurn { role: Role::User, parts: current });

    Ok(Assembled {
        turns,
        stored_text: message.to_owned(),
        binds: conversation.pending_range(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn with_files(names: &[&str]) -> Conversation {
        let mut conv = Conversation::new();
        for name in names {
            conv.add_attachment(*name, AttachmentPart::from_bytes(name, name.as_bytes().to_vec()));
        }
        conv
    }

    fn total_attachments(assembled: &Assembled) -> usize {
        assembled.turns.iter().map(OutboundTurn::attachment_count).sum()
    }

    #[test]
    fn empty_message_without_files_is_rejected() {
        let conv = Conversation::new();
        assert!(matches!(assemble(&conv, "   \n"), Err(ChatError::EmptyMessage)));
    }

    #[test]
    fn plain_first_message_is_single_turn() {
        let conv = Conversation::new();
        let out = assemble(&conv, "  hello  ").unwrap();
        assert_eq!(out.turns.len(), 1);
        assert_eq!(out.turns[0].role, Role::User);
        assert_eq!(out.turns[0].text(), "hello");
        assert_eq!(out.stored_text, "hello");
        assert_eq!(out.binds, 0..0);
    }

    #[test]
    fn first_turn_with_files_gets_header_and_parts() {
        let conv = with_files(&["a.pdf", "b.png"]);
        let out = assemble(&conv, "summarise").unwrap();

        assert_eq!(out.turns.len(), 1);
        let turn = &out.turns[0];
        assert_eq!(turn.attachment_count(), 2);
        assert!(matches!(turn.parts[0], OutboundPart::Attachment(_)));
        assert_eq!(
            turn.text(),
            "📎 Attached files:\n  • a.pdf\n  • b.png\n\nsummarise"
        );
        assert_eq!(out.stored_text, "summarise");
        assert_eq!(out.binds, 0..2);
    }

    #[test]
    fn files_without_text_use_default_prompt() {
        let conv = with_files(&["data.csv"]);
        let out = assemble(&conv, "").unwrap();
        assert!(out.turns[0].text().ends_with(DEFAULT_ATTACHMENT_PROMPT));
        assert_eq!(out.stored_text, "");
    }

    #[test]
    fn bound_files_ride_on_first_history_turn_only() {
        let mut conv = with_files(&["a.pdf"]);
        let first = assemble(&conv, "what is this").unwrap();
        conv.commit_exchange(first.stored_text, first.binds, "a pdf".into());

        let out = assemble(&conv, "and then?").unwrap();
        assert_eq!(out.turns.len(), 3);
        assert_eq!(out.turns[0].attachment_count(), 1);
        assert_eq!(out.turns[0].text(), "what is this");
        assert_eq!(out.turns[1].role, Role::Model);
        assert_eq!(out.turns[2].attachment_count(), 0);
        assert_eq!(out.turns[2].text(), "and then?");
        assert_eq!(total_attachments(&out), 1);
        assert_eq!(out.binds, 1..1);
    }

    #[test]
    fn empty_follow_up_allowed_once_files_exist() {
        let mut conv = with_files(&["a.pdf"]);
        conv.commit_exchange(String::new(), 0..1, "ok".into());

        let out = assemble(&conv, "").unwrap();
        assert_eq!(out.turns.last().unwrap().text(), "");
        assert_eq!(out.turns.last().unwrap().attachment_count(), 0);
    }

    #[test]
    fn late_upload_binds_to_current_turn() {
        let mut conv = Conversation::new();
        conv.commit_exchange("hi".into(), 0..0, "hello".into());
        conv.add_attachment("late.txt", AttachmentPart::from_bytes("late.txt", "x"));

        let out = assemble(&conv, "read this").unwrap();
        let current = out.turns.last().unwrap();
        assert_eq!(current.attachment_count(), 1);
        assert!(current.text().starts_with("📎 Attached files:\n  • late.txt"));
        assert_eq!(total_attachments(&out), 1);
        assert_eq!(out.binds, 0..1);
        assert_eq!(out.turns[0].text(), "hi");
        assert_eq!(out.turns[0].attachment_count(), 0);
    }
}
