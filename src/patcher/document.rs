use crate::exceptions::PatchError;
use std::path::Path;

/// The in-memory text of one target file.
///
/// Lines are exposed with their terminators attached, so concatenating
/// `lines()` always reproduces the original text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        for line in lines {
            text.push_str(line.as_ref());
        }
        Self { text }
    }

    pub fn load(path: &Path) -> Result<Self, PatchError> {
        Ok(Self::new(std::fs::read_to_string(path)?))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> Vec<&str> {
        self.text.split_inclusive('\n').collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }

    /// Index of the first line whose content, terminator excluded, contains `needle`.
    pub fn find_line(&self, needle: &str) -> Option<usize> {
        self.text
            .split_inclusive('\n')
            .position(|line| line_content(line).contains(needle))
    }

    pub(crate) fn replace_all(&mut self, from: &str, to: &str) {
        self.text = self.text.replace(from, to);
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.text = text;
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// The terminator a line ends with, if any.
pub(crate) fn line_ending(line: &str) -> Option<&'static str> {
    if line.ends_with("\r\n") {
        Some("\r\n")
    } else if line.ends_with('\n') {
        Some("\n")
    } else {
        None
    }
}

pub(crate) fn line_content(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

pub(crate) fn leading_whitespace(line: &str) -> &str {
    let indent_len = line.len() - line.trim_start().len();
    &line[..indent_len]
}
