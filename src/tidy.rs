// src/tidy.rs
//
// Whole-part tidying:
//   1. removal pre-pass (cosmetic markup), repeated until nothing matches
//   2. strip every xml:space="preserve" marker
//   3. split into paragraphs and tidy each one to a fixed point
//   4. put xml:space="preserve" back on every bare text-element opening tag

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::config::RemovalConfig;
use crate::error::Result;
use crate::paragraph::tidy_paragraph;
use crate::split::{join_with_glues, split_with_separators};

pub const SPACE_PRESERVE: &str = r#" xml:space="preserve""#;

/// Leaf elements whose leading/trailing whitespace must survive.
const PRESERVED_ELEMENTS: [&str; 4] = ["w:t", "w:instrText", "w:delText", "w:delInstrText"];

/// `<w:p>` or `<w:p attr...>`, but not `<w:pPr>` and friends.
static PARAGRAPH_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:p(?:\s[^>]*)?>").expect("paragraph open pattern should compile")
});

/* ============================== Markers ================================= */

pub fn strip_space_preserve(xml: &str) -> String {
    xml.replace(SPACE_PRESERVE, "")
}

pub fn restore_space_preserve(xml: &str) -> String {
    PRESERVED_ELEMENTS
        .iter()
        .fold(xml.to_owned(), |acc, name| {
            acc.replace(&format!("<{name}>"), &format!("<{name}{SPACE_PRESERVE}>"))
        })
}

/* ============================== Removal ================================= */

/// Remove matches until none are left; a removal can make new neighbours
/// match, e.g. `<w:rPr><w:noProof/></w:rPr>` leaves an empty `<w:rPr>`.
fn remove_to_fixed_point(pattern: &Regex, xml: &str) -> String {
    let mut current = xml.to_owned();
    loop {
        let replaced = match pattern.replace_all(&current, "") {
            Cow::Owned(next) if next != current => Some(next),
            _ => None,
        };
        match replaced {
            Some(next) => current = next,
            None => return current,
        }
    }
}

/* ============================== Tidier ================================== */

/// A compiled removal configuration, reusable across parts.
#[derive(Clone, Debug)]
pub struct Tidier {
    removal: Option<Regex>,
}

impl Tidier {
    pub fn new(removal: &RemovalConfig) -> Result<Self> {
        Ok(Tidier {
            removal: removal.compile()?,
        })
    }

    pub fn tidy(&self, xml: &str) -> Result<String> {
        let cleaned = match &self.removal {
            Some(pattern) => remove_to_fixed_point(pattern, xml),
            None => xml.to_owned(),
        };
        let cleaned = strip_space_preserve(&cleaned);

        let split = split_with_separators(&PARAGRAPH_OPEN, &cleaned);
        debug!(paragraphs = split.separators.len(), "tidying part");

        // The first fragment is the document preamble, not a paragraph.
        let mut pieces = Vec::with_capacity(split.fragments.len());
        pieces.push(split.fragments[0].to_owned());
        for paragraph in &split.fragments[1..] {
            pieces.push(tidy_paragraph(paragraph)?);
        }

        let tidied = join_with_glues(&pieces, &split.separators);
        Ok(restore_space_preserve(&tidied))
    }
}

/// Tidy one XML part held in memory.
pub fn tidy_markup(xml: &str, removal: &RemovalConfig) -> Result<String> {
    Tidier::new(removal)?.tidy(xml)
}
