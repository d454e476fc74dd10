//! Wire types for the Gemini `generateContent` REST endpoint.

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::assembler::{OutboundPart, OutboundTurn};
use crate::thinking::ThinkingConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub(crate) struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub thinking_config: WireThinkingConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireThinkingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_budget: Option<i32>,
}

impl From<&ThinkingConfig> for WireThinkingConfig {
    fn from(config: &ThinkingConfig) -> Self {
        match config {
            ThinkingConfig::Level(level) => {
                Self { thinking_level: Some(level.clone()), thinking_budget: None }
            }
            ThinkingConfig::Budget(budget) => {
                Self { thinking_level: None, thinking_budget: Some(*budget) }
            }
        }
    }
}

impl From<&OutboundPart> for Part {
    fn from(part: &OutboundPart) -> Self {
        match part {
            OutboundPart::Text(text) => Part::Text { text: text.clone() },
            OutboundPart::Attachment(att) => Part::InlineData {
                inline_data: InlineData {
                    mime_type: att.mime_type().to_owned(),
                    data: BASE64_STANDARD.encode(att.data()),
                },
            },
        }
    }
}

impl From<&OutboundTurn> for Content {
    fn from(turn: &OutboundTurn) -> Self {
        Content {
            role: turn.role.as_ref().to_owned(),
            parts: turn.parts.iter().map(Part::from).collect(),
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Candidate {
    pub content: Option<ContentResponse>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentResponse {
    #[serde(default)]
    pub parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PartResponse {
    pub text: Option<String>,
    #[serde(default)]
    pub thought: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorWrapper {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
    pub status: Option<String>,
}
