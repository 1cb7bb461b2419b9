// src/config.rs
//
// Which cosmetic markup is removed before tidying.

use regex::Regex;

use crate::error::Result;
use crate::split::compile_pattern;

/// Cosmetic markup removed before tidying unless configured otherwise.
///
/// Proofing state, language tags and font hints differ between otherwise
/// identical runs all the time; removing them is what lets most runs merge.
pub const DEFAULT_REMOVAL_PATTERNS: &[&str] = &[
    r#"<w:proofErr w:type="\w+"/>"#,
    r"<w:noProof/>",
    r"<w:lang\s[^>]*/>",
    r#"<w:rFonts w:hint="\w+"/>"#,
    r#" w:hint="\w+""#,
    r"<w:rPr></w:rPr>",
    r"<w:rPr/>",
];

/// What the removal pre-pass strips from a part.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RemovalConfig {
    /// [`DEFAULT_REMOVAL_PATTERNS`].
    #[default]
    Default,
    /// Skip the pre-pass.
    Disabled,
    /// Caller-supplied regular expressions, any of which is removed.
    Patterns(Vec<String>),
}

impl RemovalConfig {
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            RemovalConfig::Default => DEFAULT_REMOVAL_PATTERNS.to_vec(),
            RemovalConfig::Disabled => Vec::new(),
            RemovalConfig::Patterns(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }

    /// One alternation of all patterns, or `None` when there is nothing to
    /// remove.
    pub fn compile(&self) -> Result<Option<Regex>> {
        let patterns = self.patterns();
        if patterns.is_empty() {
            return Ok(None);
        }
        // Compile separately first so an error names the offending pattern.
        for pattern in &patterns {
            compile_pattern(pattern)?;
        }
        let joined = patterns
            .iter()
            .map(|p| format!("(?:{p})"))
            .collect::<Vec<_>>()
            .join("|");
        compile_pattern(&joined).map(Some)
    }
}
