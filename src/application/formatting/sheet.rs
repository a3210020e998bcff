//! Format sheets: named Markdown snippets loaded from a file.
//!
//! ```text
//! @msg:
//!     {author} in {channel} at {date}:
//!     {content}
//!
//! @rm:
//!     {author} removed {amt} messages from {members} in {channel}.
//! ```
//!
//! A line of the form `@name:` opens a section. Every other line, trimmed,
//! belongs to the section above it; text before the first header lands in the
//! unnamed section `""`. A header with anything after the colon is not a
//! header and is kept as section text.

use std::collections::HashMap;
use std::path::Path;

use super::template::{self, Values};
use crate::application::errors::{BotError, SheetError};

/// Sheet shipped with the bot, used when no sheet file is present
pub const DEFAULT_SHEET: &str = include_str!("../../../sheet.md");

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    sections: HashMap<String, String>,
}

impl Sheet {
    pub fn parse(text: &str) -> Self {
        let mut name = String::new();
        let mut sections: HashMap<String, String> = HashMap::new();

        for line in text.lines().map(str::trim) {
            if line.len() >= 2 && line.starts_with('@') && line.ends_with(':') {
                name = line[1..line.len() - 1].to_string();
                continue;
            }
            let body = sections.entry(name.clone()).or_default();
            body.push_str(line);
            body.push('\n');
        }

        let sections = sections
            .into_iter()
            .map(|(k, v)| (k, v.trim().to_string()))
            .collect();
        Self { sections }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Load `path`, or fall back to the built-in sheet when it does not exist
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, BotError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::warn!("Sheet {} not found, using built-in sheet", path.display());
            Ok(Self::parse(DEFAULT_SHEET))
        }
    }

    pub fn get(&self, name: &str) -> Result<&str, SheetError> {
        self.sections
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| SheetError::MissingSection(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Render section `name` with the given placeholder values
    pub fn render(&self, name: &str, values: &Values<'_>) -> Result<String, SheetError> {
        template::render(self.get(name)?, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let sheet = Sheet::parse("@msg:\n    **{author}**\n    {content}\n\n@pin:\n  pinned {amt}\n");
        assert_eq!(sheet.get("msg").unwrap(), "**{author}**\n{content}");
        assert_eq!(sheet.get("pin").unwrap(), "pinned {amt}");
    }

    #[test]
    fn test_text_after_header_colon_is_not_a_header() {
        let sheet = Sheet::parse("@a:\nfirst\n@bad: inline text\n");
        assert_eq!(sheet.get("a").unwrap(), "first\n@bad: inline text");
        assert!(!sheet.contains("bad"));
    }

    #[test]
    fn test_preamble_goes_to_unnamed_section() {
        let sheet = Sheet::parse("intro\n@x:\nbody");
        assert_eq!(sheet.get("").unwrap(), "intro");
        assert_eq!(sheet.get("x").unwrap(), "body");
    }

    #[test]
    fn test_missing_section() {
        let sheet = Sheet::parse("@x:\nbody");
        assert_eq!(sheet.get("y"), Err(SheetError::MissingSection("y".to_string())));
    }

    #[test]
    fn test_default_sheet_has_message_format() {
        let sheet = Sheet::parse(DEFAULT_SHEET);
        assert!(sheet.contains("msg"));
        assert!(sheet.contains("rm"));
    }

    #[test]
    fn test_missing_file_falls_back_to_built_in_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = Sheet::load_or_default(dir.path().join("nope.md")).unwrap();
        assert_eq!(sheet, Sheet::parse(DEFAULT_SHEET));
    }

    #[test]
    fn test_existing_file_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.md");
        std::fs::write(&path, "@msg:\n{content}\n").unwrap();
        let sheet = Sheet::load_or_default(&path).unwrap();
        assert_eq!(sheet.get("msg").unwrap(), "{content}");
        assert!(!sheet.contains("rm"));
    }
}
