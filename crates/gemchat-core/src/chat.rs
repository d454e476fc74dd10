//! One chat exchange: validate, assemble, generate, commit.

use std::sync::Arc;

use tracing::{info, warn};

use crate::assembler::assemble;
use crate::conversation::Conversation;
use crate::error::ChatError;
use crate::gemini::{Generate, GenerateRequest};
use crate::thinking::thinking_config;

/// Caller-selected inputs for one exchange.
#[derive(Debug, Clone, Copy)]
pub struct Exchange<'a> {
    pub message: &'a str,
    pub model: &'a str,
    pub thinking: &'a str,
}

/// Result of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeOutcome {
    pub reply: String,
    /// Names of every attachment in the session, in upload order.
    pub files: Vec<String>,
}

/// Runs exchanges against a [`Generate`] backend.
#[derive(Clone)]
pub struct ChatService {
    generator: Arc<dyn Generate>,
}

impl std::fmt::Debug for ChatService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChatService")
    }
}

impl ChatService {
    pub fn new(generator: Arc<dyn Generate>) -> Self {
        Self { generator }
    }

    /// Send `exchange` on top of `conversation`.
    ///
    /// The conversation is only modified after the backend replies: on
    /// success the user's text and the reply are appended and any pending
    /// attachments become bound to that user turn. On error nothing changes.
    pub async fn exchange(
        &self,
        conversation: &mut Conversation,
        exchange: Exchange<'_>,
    ) -> Result<ExchangeOutcome, ChatError> {
        let assembled = assemble(conversation, exchange.message)?;
        let request = GenerateRequest {
            model: exchange.model.to_owned(),
            turns: assembled.turns,
            thinking: thinking_config(exchange.model, exchange.thinking),
        };

        let reply = match self.generator.generate(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(model = %exchange.model, retryable = err.is_retryable(), error = %err, "generation failed");
                return Err(err);
            }
        };

        let attached = assembled.binds.len();
        conversation.commit_exchange(assembled.stored_text, assembled.binds, reply.clone());
        info!(
            model = %exchange.model,
            history_len = conversation.history().len(),
            attached,
            "exchange committed"
        );

        Ok(ExchangeOutcome {
            reply,
            files: conversation.attachment_names().map(str::to_owned).collect(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assembler::OutboundTurn;
    use crate::part::AttachmentPart;
    use crate::thinking::ThinkingConfig;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Records every request and answers from a script.
    #[derive(Default)]
    struct ScriptedGenerator {
        seen: Mutex<Vec<GenerateRequest>>,
        fail_with: Mutex<Option<ChatError>>,
    }

    #[async_trait]
    impl Generate for ScriptedGenerator {
        async fn generate(&self, request: &GenerateRequest) -> Result<String, ChatError> {
            self.seen.lock().unwrap().push(request.clone());
            if let Some(err) = self.fail_with.lock().unwrap().take() {
                return Err(err);
            }
            Ok(format!("reply #{}", self.seen.lock().unwrap().len()))
        }
    }

    fn service() -> (ChatService, Arc<ScriptedGenerator>) {
        let generator = Arc::new(ScriptedGenerator::default());
        (ChatService::new(generator.clone()), generator)
    }

    fn exchange(message: &str) -> Exchange<'_> {
        Exchange { message, model: "gemini-2.5-pro", thinking: "medium" }
    }

    fn attachments_sent(turns: &[OutboundTurn]) -> Vec<usize> {
        turns.iter().map(OutboundTurn::attachment_count).collect()
    }

    #[tokio::test]
    async fn successful_exchange_appends_two_turns() {
        let (svc, generator) = service();
        let mut conv = Conversation::new();

        let out = svc.exchange(&mut conv, exchange("hello")).await.unwrap();
        assert_eq!(out.reply, "reply #1");
        assert_eq!(conv.history().len(), 2);

        svc.exchange(&mut conv, exchange("again")).await.unwrap();
        assert_eq!(conv.history().len(), 4);

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].thinking, ThinkingConfig::Budget(4096));
        assert_eq!(seen[1].turns.len(), 3);
    }

    #[tokio::test]
    async fn validation_error_skips_upstream_and_history() {
        let (svc, generator) = service();
        let mut conv = Conversation::new();

        let err = svc.exchange(&mut conv, exchange("  ")).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyMessage));
        assert!(conv.history().is_empty());
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_leaves_state_untouched() {
        let (svc, generator) = service();
        *generator.fail_with.lock().unwrap() =
            Some(ChatError::UpstreamTransient { status: Some(503), message: "overloaded".into() });

        let mut conv = Conversation::new();
        conv.add_attachment("a.pdf", AttachmentPart::from_bytes("a.pdf", "pdf"));

        let err = svc.exchange(&mut conv, exchange("read")).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(conv.history().is_empty());
        assert_eq!(conv.pending().len(), 1);

        // The retry still binds the file to the first turn.
        svc.exchange(&mut conv, exchange("read")).await.unwrap();
        assert_eq!(conv.history()[0].attachments, 0..1);
    }

    #[tokio::test]
    async fn files_are_sent_once_per_request_and_header_not_stored() {
        let (svc, generator) = service();
        let mut conv = Conversation::new();
        conv.add_attachment("a.pdf", AttachmentPart::from_bytes("a.pdf", "pdf"));
        conv.add_attachment("b.txt", AttachmentPart::from_bytes("b.txt", "txt"));

        let out = svc.exchange(&mut conv, exchange("")).await.unwrap();
        assert_eq!(out.files, ["a.pdf", "b.txt"]);
        svc.exchange(&mut conv, exchange("more")).await.unwrap();

        let seen = generator.seen.lock().unwrap();
        assert_eq!(attachments_sent(&seen[0].turns), [2]);
        assert_eq!(attachments_sent(&seen[1].turns), [2, 0, 0]);

        assert_eq!(conv.history()[0].text, "");
        assert!(conv.history().iter().all(|t| !t.text.contains("Attached files")));
    }
}
