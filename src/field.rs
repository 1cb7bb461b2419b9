// src/field.rs
//
// Field-character scopes. A complex field (page numbers, references, tables
// of contents) is spread over several runs: `begin` marker, instruction text,
// optional `separate` marker, displayed result, `end` marker. Word renders
// the runs between the markers as one unit, so their formatting is normalized
// to one canonical `w:rPr` before runs are compared for merging. Fields nest
// (`IF { MERGEFIELD x } ...`); only the outermost one forms the scope.

use std::sync::LazyLock;

use memchr::memmem;
use regex::Regex;
use thiserror::Error;

use crate::run::{run_properties, Run};

pub const FIELD_BEGIN: &str = r#"w:fldCharType="begin""#;
pub const FIELD_END: &str = r#"w:fldCharType="end""#;

static TEXT_ELEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:t[\s>]").expect("text element pattern should compile"));

static INSTR_TEXT_ELEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<w:instrText[\s>]").expect("instruction text pattern should compile")
});

/// A field scope has neither text nor instruction text to take its
/// formatting from.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("no text or instruction text follows the field begin marker in run {entering_run}")]
pub struct MissingFieldText {
    pub entering_run: usize,
}

/// Field-scope state at one run of a paragraph pass.
///
/// Threaded from run to run by value; a fresh default value starts every
/// paragraph pass outside any scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldScope {
    pub inside_scope: bool,
    /// The begin marker is in this run.
    pub entering_in_current_run: bool,
    /// The end marker closing the scope is in this run; the scope is closed
    /// after it.
    pub ending_in_current_run: bool,
    /// Formatting shared by the scope's interior runs (`None`: no `w:rPr`).
    pub canonical_properties: Option<String>,
    /// Fields opened and not yet closed, the scope's own included.
    pub depth: usize,
}

impl FieldScope {
    /// State at `runs[index]`, given that `self` is the state at the run
    /// before it.
    pub fn advance(&self, runs: &[Run], index: usize) -> Result<FieldScope, MissingFieldText> {
        let body = runs[index].body.as_str();

        let mut next = if self.ending_in_current_run {
            FieldScope::default()
        } else {
            self.clone()
        };
        next.entering_in_current_run = false;

        if next.inside_scope {
            let (close, depth) = closing_end(body, next.depth);
            next.ending_in_current_run = close.is_some();
            next.depth = depth;
        } else if let Some(begin) = body.find(FIELD_BEGIN) {
            let after_begin = begin + FIELD_BEGIN.len();
            let (close, depth) = closing_end(&body[after_begin..], 1);
            next.inside_scope = true;
            next.entering_in_current_run = true;
            next.ending_in_current_run = close.is_some();
            next.depth = depth;
            next.canonical_properties = canonical_properties(runs, index, after_begin)?;
        }

        Ok(next)
    }

    /// Strictly inside a scope: neither the begin nor the end run.
    pub fn is_interior(&self) -> bool {
        self.inside_scope && !self.entering_in_current_run && !self.ending_in_current_run
    }

    /// Properties to compare `body` by: the canonical ones for interior
    /// runs, the run's own otherwise.
    pub fn effective_properties<'a>(&'a self, body: &'a str) -> Option<&'a str> {
        if self.is_interior() {
            self.canonical_properties.as_deref()
        } else {
            run_properties(body)
        }
    }
}

/// Properties of the first run after the begin marker that displays text,
/// falling back to the first run holding instruction text.
fn canonical_properties(
    runs: &[Run],
    entering: usize,
    after_begin: usize,
) -> Result<Option<String>, MissingFieldText> {
    [&*TEXT_ELEMENT, &*INSTR_TEXT_ELEMENT]
        .into_iter()
        .find_map(|carrier| find_carrier(runs, entering, after_begin, carrier))
        .map(|run| run_properties(&run.body).map(str::to_owned))
        .ok_or(MissingFieldText {
            entering_run: entering,
        })
}

/// Walk the field markers of `body` starting at nesting `depth`. Returns the
/// offset of the end marker that closes the outermost field, if any, and the
/// depth left after `body`.
fn closing_end(body: &str, mut depth: usize) -> (Option<usize>, usize) {
    let bytes = body.as_bytes();
    let begins = memmem::find_iter(bytes, FIELD_BEGIN.as_bytes()).map(|at| (at, true));
    let ends = memmem::find_iter(bytes, FIELD_END.as_bytes()).map(|at| (at, false));
    let mut markers: Vec<(usize, bool)> = begins.chain(ends).collect();
    markers.sort_unstable();

    for (at, is_begin) in markers {
        if is_begin {
            depth += 1;
        } else {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return (Some(at), 0);
            }
        }
    }
    (None, depth)
}

fn find_carrier<'r>(
    runs: &'r [Run],
    entering: usize,
    after_begin: usize,
    carrier: &Regex,
) -> Option<&'r Run> {
    let mut depth = 1;
    for (index, run) in runs.iter().enumerate().skip(entering) {
        let start = if index == entering { after_begin } else { 0 };
        let searched = &run.body[start..];
        let (end, after) = closing_end(searched, depth);
        let portion = end.map_or(searched, |end| &searched[..end]);
        if carrier.is_match(portion) {
            return Some(run);
        }
        if end.is_some() {
            return None;
        }
        depth = after;
    }
    None
}
