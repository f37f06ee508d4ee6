//! Client-side session state.
//!
//! A [`Session`] is the single mutable unit of client state: which artifact
//! the server holds for us and the last text extracted from it. Export
//! eligibility is always derived from those two fields, never stored.

use serde::Serialize;

/// Conceptual workflow phase, derived from a [`Session`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No artifact on the server.
    Empty,
    /// An artifact exists but no text has been extracted from it (or the
    /// extraction found nothing).
    ImageStaged,
    /// An artifact exists and its extracted text is non-empty.
    TextExtracted,
}

/// Session state for one use of the tool.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Session {
    current_filename: Option<String>,
    extracted_text: String,
    /// Bumped on every artifact change or reset; lets callers detect that a
    /// response belongs to an earlier state.
    #[serde(skip)]
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new server artifact. Any previously extracted text belongs
    /// to the old image and is cleared.
    pub fn set_artifact(&mut self, filename: impl Into<String>) {
        self.current_filename = Some(filename.into());
        self.extracted_text.clear();
        self.generation += 1;
    }

    /// Record extraction output. The artifact is left untouched.
    pub fn set_extracted_text(&mut self, text: impl Into<String>) {
        self.extracted_text = text.into();
    }

    /// Clear both fields to their empty defaults.
    pub fn reset(&mut self) {
        self.current_filename = None;
        self.extracted_text.clear();
        self.generation += 1;
    }

    /// True iff an artifact exists and its extracted text is non-empty.
    pub fn can_export(&self) -> bool {
        self.current_filename.is_some() && !self.extracted_text.is_empty()
    }

    pub fn current_filename(&self) -> Option<&str> {
        self.current_filename.as_deref()
    }

    pub fn extracted_text(&self) -> &str {
        &self.extracted_text
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        match (&self.current_filename, self.extracted_text.is_empty()) {
            (None, _) => Phase::Empty,
            (Some(_), true) => Phase::ImageStaged,
            (Some(_), false) => Phase::TextExtracted,
        }
    }
}
