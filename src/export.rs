//! Export formats and text statistics.
//!
//! Exports are rendered by the server and fetched by navigating to a URL;
//! the client only decides whether exporting is allowed and which link to
//! open. [`TextStats`] mirrors the counts the server embeds in its JSON and
//! XML exports so the text panel can show them next to the output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Server-rendered export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Pdf,
    Json,
    Xml,
}

impl ExportKind {
    pub const ALL: [ExportKind; 3] = [ExportKind::Pdf, ExportKind::Json, ExportKind::Xml];

    /// Path segment used by `GET /export/{kind}/{filename}`; also the file
    /// extension of the download.
    pub fn as_str(self) -> &'static str {
        match self {
            ExportKind::Pdf => "pdf",
            ExportKind::Json => "json",
            ExportKind::Xml => "xml",
        }
    }

    /// Name the server gives the downloaded rendition.
    pub fn download_name(self, filename: &str) -> String {
        format!("{filename}.{}", self.as_str())
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportKind::Pdf),
            "json" => Ok(ExportKind::Json),
            "xml" => Ok(ExportKind::Xml),
            other => Err(format!("unknown export format '{other}' (expected pdf, json or xml)")),
        }
    }
}

/// Size figures for a block of extracted text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStats {
    /// Unicode scalar values, not bytes.
    pub character_count: usize,
    /// Whitespace-separated runs.
    pub word_count: usize,
    /// Newline-separated segments; an empty text counts as one line.
    pub line_count: usize,
}

impl TextStats {
    pub fn from_text(text: &str) -> Self {
        Self {
            character_count: text.chars().count(),
            word_count: text.split_whitespace().count(),
            line_count: text.split('\n').count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in ExportKind::ALL {
            assert_eq!(kind.as_str().parse::<ExportKind>(), Ok(kind));
        }
        assert_eq!(" PDF ".parse::<ExportKind>(), Ok(ExportKind::Pdf));
        assert!("docx".parse::<ExportKind>().is_err());
    }

    #[test]
    fn download_name_appends_extension() {
        assert_eq!(ExportKind::Xml.download_name("a1.png"), "a1.png.xml");
    }

    #[test]
    fn stats_for_multiline_text() {
        let s = TextStats::from_text("Hello world\nsecond  line\n");
        assert_eq!(s.character_count, 25);
        assert_eq!(s.word_count, 4);
        assert_eq!(s.line_count, 3);
    }

    #[test]
    fn stats_count_chars_not_bytes() {
        let s = TextStats::from_text("héllo");
        assert_eq!(s.character_count, 5);
    }

    #[test]
    fn stats_for_empty_text() {
        let s = TextStats::from_text("");
        assert_eq!(
            s,
            TextStats {
                character_count: 0,
                word_count: 0,
                line_count: 1
            }
        );
    }
}
