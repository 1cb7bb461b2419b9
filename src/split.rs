// src/split.rs
//
// Split-with-captured-separators: the one primitive used to explode a part
// into paragraphs, a paragraph into runs and a run into element tags.
// Interleaving `fragments` and `separators` always gives back the input.

use regex::Regex;

use crate::error::{Result, TidyError};

/// Compile a tokenization or removal pattern.
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| TidyError::Pattern {
        pattern: pattern.to_owned(),
        source,
    })
}

/// Result of [`split_with_separators`].
///
/// `fragments.len() == separators.len() + 1`; `separators[i]` sits between
/// `fragments[i]` and `fragments[i + 1]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split<'a> {
    pub fragments: Vec<&'a str>,
    pub separators: Vec<&'a str>,
}

impl Split<'_> {
    /// Re-interleave fragments and separators.
    pub fn join(&self) -> String {
        join_with_glues(&self.fragments, &self.separators)
    }
}

/// Split `text` around every non-overlapping match of `pattern`, keeping the
/// matches.
pub fn split_with_separators<'a>(pattern: &Regex, text: &'a str) -> Split<'a> {
    let mut fragments = Vec::new();
    let mut separators = Vec::new();
    let mut last = 0usize;

    for m in pattern.find_iter(text) {
        fragments.push(&text[last..m.start()]);
        separators.push(m.as_str());
        last = m.end();
    }
    fragments.push(&text[last..]);

    Split {
        fragments,
        separators,
    }
}

/// Concatenate `pieces`, putting `glues[i]` after `pieces[i]` where present.
pub fn join_with_glues<P, G>(pieces: &[P], glues: &[G]) -> String
where
    P: AsRef<str>,
    G: AsRef<str>,
{
    let cap = pieces.iter().map(|p| p.as_ref().len()).sum::<usize>()
        + glues.iter().map(|g| g.as_ref().len()).sum::<usize>();
    let mut out = String::with_capacity(cap);
    for (index, piece) in pieces.iter().enumerate() {
        out.push_str(piece.as_ref());
        if let Some(glue) = glues.get(index) {
            out.push_str(glue.as_ref());
        }
    }
    out
}
