//! Email rendering configuration model.
//!
//! # Responsibility
//! - Define the per-level override record used by the template cascade.
//! - Define the fully-resolved configuration handed to the renderer.
//!
//! # Invariants
//! - `None` in an override means "defer to the next level", never "empty".
//! - `EffectiveTemplateConfig` has no optional fields.

use serde::{Deserialize, Serialize};

/// Email body format requested from the rendering collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailFormat {
    /// Plain text body only.
    Plaintext,
    /// Plain text plus HTML alternative.
    Multipart,
}

impl EmailFormat {
    /// Returns whether free text should be pre-wrapped for this format.
    pub fn is_plaintext(self) -> bool {
        matches!(self, Self::Plaintext)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plaintext => "plaintext",
            Self::Multipart => "multipart",
        }
    }
}

/// Optional rendering overrides attached to an exchange or a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateOverride {
    pub sender_name: Option<String>,
    pub email_format: Option<EmailFormat>,
    pub template_name: Option<String>,
    /// Honored at exchange level only; ignored on participants.
    pub template_group: Option<String>,
}

impl TemplateOverride {
    /// Returns whether every field defers to the next level.
    pub fn is_empty(&self) -> bool {
        self.sender_name.is_none()
            && self.email_format.is_none()
            && self.template_name.is_none()
            && self.template_group.is_none()
    }
}

/// Resolved rendering configuration for one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveTemplateConfig {
    pub sender_name: String,
    pub email_format: EmailFormat,
    pub template_group: String,
    pub template_name: String,
}
