// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port for descriptive flavor text.
//!
//! Rule builders call a [`TextGenerator`] synchronously; a failed call means
//! the optional text field is omitted, never that the step is aborted.
use thiserror::Error;

/// Failure reported by a text generator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// No generator is configured.
    #[error("text generation unavailable")]
    Unavailable,
    /// The backend rejected or failed the request.
    #[error("text generation failed: {0}")]
    Backend(String),
}

/// External text-generation capability consumed by rule builders.
pub trait TextGenerator: Send + Sync {
    /// Rewrites `template` in the given style.
    fn rewrite(&self, style: &str, template: &str) -> Result<String, TextError>;

    /// Continues `prior` following `template`, in the given style.
    fn continue_text(&self, style: &str, prior: &str, template: &str) -> Result<String, TextError>;
}

/// Generator that always fails; rules fall back to omitting text.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoText;

impl TextGenerator for NoText {
    fn rewrite(&self, _style: &str, _template: &str) -> Result<String, TextError> {
        Err(TextError::Unavailable)
    }

    fn continue_text(&self, _style: &str, _prior: &str, _template: &str) -> Result<String, TextError> {
        Err(TextError::Unavailable)
    }
}

/// Offline generator that returns the template tagged with the style.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateText;

impl TextGenerator for TemplateText {
    fn rewrite(&self, style: &str, template: &str) -> Result<String, TextError> {
        Ok(format!("[{style}] {template}"))
    }

    fn continue_text(&self, style: &str, prior: &str, template: &str) -> Result<String, TextError> {
        Ok(format!("{prior} [{style}] {template}"))
    }
}
