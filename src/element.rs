// src/element.rs
//
// Merging of adjacent leaf text elements inside a single run:
// `<w:t>Hello </w:t><w:t>World</w:t>` becomes `<w:t>Hello World</w:t>`, and
// likewise for `w:instrText`. Everything else in the run is left
// byte-for-byte untouched.

use std::borrow::Cow;
use std::sync::LazyLock;

use memchr::memmem;
use regex::Regex;
use tracing::trace;

use crate::error::Result;
use crate::split::split_with_separators;
use crate::tag::{limiting_kind, same_type, type_of, Limit};

/// Element types whose payloads may be concatenated.
pub const MERGEABLE_TYPES: [&str; 2] = ["w:t", "w:instrText"];

static ELEMENT_TAG_UNCLOSED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?w:[A-Za-z]+").expect("element tag pattern should compile"));

/// Quick check on the comma-joined tag list (`<w:rPr,<w:b,</w:rPr,<w:t,...`):
/// can it contain a close/open pair of a mergeable type at all?
pub fn contains_mergeable(tag_list: &str) -> bool {
    !tag_list.is_empty()
        && MERGEABLE_TYPES.iter().any(|ty| {
            let needle = format!("</{ty},<{ty}");
            memmem::find(tag_list.as_bytes(), needle.as_bytes()).is_some()
        })
}

/// One element tag and whatever follows it up to the next tag.
#[derive(Debug)]
struct Element<'a> {
    tag: &'a str,
    rest: Cow<'a, str>,
}

impl Element<'_> {
    /// Payload after a bare opening tag, e.g. `World` for `<w:t` + `>World`.
    fn bare_payload(&self) -> Option<&str> {
        self.rest.strip_prefix('>')
    }
}

fn tag_list(elements: &[Element<'_>]) -> String {
    elements.iter().map(|e| e.tag).collect::<Vec<_>>().join(",")
}

/// `closing` followed by `opening` can be fused.
fn is_mergeable_pair(closing: &Element<'_>, opening: &Element<'_>) -> Result<bool> {
    if limiting_kind(closing.tag) != Limit::Closing || limiting_kind(opening.tag) != Limit::Opening
    {
        return Ok(false);
    }
    if !same_type(closing.tag, opening.tag)? {
        return Ok(false);
    }
    let name = type_of(closing.tag)?;
    if !MERGEABLE_TYPES.iter().any(|ty| *ty == name) {
        return Ok(false);
    }
    // `<w:t foo="x">` would leak its attributes into the payload.
    Ok(opening.bare_payload().is_some())
}

/// Fuse the first mergeable pair. Returns whether anything changed.
fn merge_first_pair(elements: &mut Vec<Element<'_>>) -> Result<bool> {
    for index in 1..elements.len().saturating_sub(1) {
        if !is_mergeable_pair(&elements[index], &elements[index + 1])? {
            continue;
        }
        let payload = elements[index + 1].bare_payload().unwrap_or_default().to_owned();
        elements[index - 1].rest.to_mut().push_str(&payload);
        elements.drain(index..=index + 1);
        return Ok(true);
    }
    Ok(false)
}

/// Merge every adjacent same-type text element pair in `run`.
///
/// Returns the rewritten run and the number of merges performed.
pub fn merge_elements(run: &str) -> Result<(String, usize)> {
    let split = split_with_separators(&ELEMENT_TAG_UNCLOSED, run);
    if !contains_mergeable(&split.separators.join(",")) {
        return Ok((run.to_owned(), 0));
    }

    let prefix = split.fragments[0];
    let mut elements: Vec<Element<'_>> = split
        .separators
        .iter()
        .zip(&split.fragments[1..])
        .map(|(&tag, &rest)| Element {
            tag,
            rest: Cow::Borrowed(rest),
        })
        .collect();

    let mut merged = 0usize;
    while contains_mergeable(&tag_list(&elements)) && merge_first_pair(&mut elements)? {
        merged += 1;
    }
    if merged > 0 {
        trace!(merged, "merged text elements");
    }

    let mut out = String::with_capacity(run.len());
    out.push_str(prefix);
    for element in &elements {
        out.push_str(element.tag);
        out.push_str(&element.rest);
    }
    Ok((out, merged))
}
