//! Per-session conversation state.

use std::ops::Range;

use crate::part::AttachmentPart;

/// Author of a turn, using the provider's role names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One committed turn of history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Indices into [`Conversation::attachments`] bound to this turn.
    /// Always empty for model turns.
    pub attachments: Range<usize>,
}

impl Turn {
    pub fn user(text: impl Into<String>, attachments: Range<usize>) -> Self {
        Self { role: Role::User, text: text.into(), attachments }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self { role: Role::Model, text: text.into(), attachments: 0..0 }
    }
}

/// An uploaded file: display name and its binary part, kept side by side so
/// names and parts can never drift out of alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub part: AttachmentPart,
}

/// History and uploads of one session.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    history: Vec<Turn>,
    attachments: Vec<Attachment>,
    /// Attachments `0..bound` are already bound to a history turn.
    bound: usize,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> &[Turn] {
        &self.history
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn attachment_names(&self) -> impl Iterator<Item = &str> {
        self.attachments.iter().map(|a| a.name.as_str())
    }

    pub fn attachment_parts(&self) -> impl Iterator<Item = &AttachmentPart> {
        self.attachments.iter().map(|a| &a.part)
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }

    /// Attachments uploaded but not yet bound to any history turn.
    pub fn pending(&self) -> &[Attachment] {
        &self.attachments[self.bound..]
    }

    pub fn pending_range(&self) -> Range<usize> {
        self.bound..self.attachments.len()
    }

    pub fn add_attachment(&mut self, name: impl Into<String>, part: AttachmentPart) {
        self.attachments.push(Attachment { name: name.into(), part });
    }

    /// Record a successful exchange: the user's text (with the attachments it
    /// carried) followed by the model's reply.
    ///
    /// Binds `attachments` permanently to the user turn; they are never
    /// attached to a later current turn again.
    pub fn commit_exchange(&mut self, user_text: String, attachments: Range<usize>, reply: String) {
        debug_assert!(attachments.start == self.bound && attachments.end <= self.attachments.len());
        self.bound = self.bound.max(attachments.end);
        self.history.push(Turn::user(user_text, attachments));
        self.history.push(Turn::model(reply));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn part(name: &str) -> AttachmentPart {
        AttachmentPart::from_bytes(name, name.as_bytes().to_vec())
    }

    #[test]
    fn names_and_parts_stay_aligned() {
        let mut conv = Conversation::new();
        conv.add_attachment("a.pdf", part("a.pdf"));
        conv.add_attachment("b.png", part("b.png"));

        let names: Vec<&str> = conv.attachment_names().collect();
        let types: Vec<&str> = conv.attachment_parts().map(|p| p.mime_type()).collect();
        assert_eq!(names.len(), types.len());
        assert_eq!(names, ["a.pdf", "b.png"]);
        assert_eq!(types, ["application/pdf", "image/png"]);
    }

    #[test]
    fn commit_binds_pending_attachments() {
        let mut conv = Conversation::new();
        conv.add_attachment("a.txt", part("a.txt"));
        assert_eq!(conv.pending().len(), 1);

        let range = conv.pending_range();
        conv.commit_exchange("hi".into(), range, "hello".into());

        assert!(conv.pending().is_empty());
        assert_eq!(conv.history().len(), 2);
        assert_eq!(conv.history()[0], Turn::user("hi", 0..1));
        assert_eq!(conv.history()[1], Turn::model("hello"));
    }

    #[test]
    fn late_uploads_are_pending_until_next_commit() {
        let mut conv = Conversation::new();
        conv.commit_exchange("one".into(), 0..0, "r1".into());
        conv.add_attachment("late.csv", part("late.csv"));

        assert_eq!(conv.pending_range(), 0..1);
        conv.commit_exchange("two".into(), conv.pending_range(), "r2".into());
        assert_eq!(conv.history()[2].attachments, 0..1);
        assert!(conv.pending().is_empty());
    }

    #[test]
    fn role_names_match_provider() {
        assert_eq!(Role::User.as_ref(), "user");
        assert_eq!(Role::Model.as_ref(), "model");
    }
}
