//! Mapping of the UI's abstract thinking effort onto provider parameters.
//!
//! Gemini 3 models take a qualitative `thinkingLevel`; earlier families take
//! a numeric `thinkingBudget`. Callers only ever pass the model id and the
//! level string they received from the page.

use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Effort levels offered by the chat page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum ThinkingLevel {
    Off,
    Low,
    Medium,
    High,
}

impl ThinkingLevel {
    /// Token budget used by budget-based model families.
    pub fn budget(self) -> i32 {
        match self {
            ThinkingLevel::Off => 0,
            ThinkingLevel::Low => 1024,
            ThinkingLevel::Medium => 4096,
            ThinkingLevel::High => 8192,
        }
    }
}

/// Budget sent when the level is not recognised; the provider then decides.
pub const DYNAMIC_BUDGET: i32 = -1;

/// Provider-specific thinking configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThinkingConfig {
    /// Qualitative level (`"minimal"`, `"low"`, `"medium"`, `"high"`).
    Level(String),
    /// Token budget; `0` disables thinking, `-1` lets the model decide.
    Budget(i32),
}

fn uses_thinking_level(model: &str) -> bool {
    model.contains("gemini-3")
}

/// Translate `level` into the configuration `model` understands.
pub fn thinking_config(model: &str, level: &str) -> ThinkingConfig {
    let parsed = level.parse::<ThinkingLevel>().ok();

    if uses_thinking_level(model) {
        // Gemini 3 cannot fully disable thinking; use its lowest setting.
        return match parsed {
            Some(ThinkingLevel::Off) if model.contains("3-pro") => ThinkingConfig::Level("low".into()),
            Some(ThinkingLevel::Off) => ThinkingConfig::Level("minimal".into()),
            _ => ThinkingConfig::Level(level.to_owned()),
        };
    }

    ThinkingConfig::Budget(parsed.map_or(DYNAMIC_BUDGET, ThinkingLevel::budget))
}
