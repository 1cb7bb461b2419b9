// src/run.rs
//
// Runs inside a paragraph and the fusion of adjacent formatting-identical
// runs.

use memchr::memmem;
use tracing::trace;

use crate::error::{Result, TidyError};
use crate::field::{FieldScope, FIELD_BEGIN};

pub const RUN_CLOSE: &str = "</w:r>";

const PROPERTIES_OPEN: &str = "<w:rPr>";
const PROPERTIES_CLOSE: &str = "</w:rPr>";
const PROPERTIES_EMPTY: &str = "<w:rPr/>";

/// One run of a paragraph: the `<w:r ...>` tag that opened it and everything
/// after it up to the next run-opening tag.
///
/// A blank run (both fields empty) was absorbed by its successor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Run {
    pub open_tag: String,
    pub body: String,
}

impl Run {
    pub fn new(open_tag: impl Into<String>, body: impl Into<String>) -> Self {
        Run {
            open_tag: open_tag.into(),
            body: body.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.open_tag.is_empty() && self.body.is_empty()
    }
}

#[inline]
pub(crate) fn contains(haystack: &str, needle: &str) -> bool {
    memmem::find(haystack.as_bytes(), needle.as_bytes()).is_some()
}

/// Byte range of the run-properties block. It is only recognised as the
/// run's first child; nested blocks (`w:rPrChange`) are balanced.
fn properties_span(body: &str) -> Option<(usize, usize)> {
    let start = body.len() - body.trim_start().len();
    let rest = &body[start..];
    if rest.starts_with(PROPERTIES_EMPTY) {
        return Some((start, start + PROPERTIES_EMPTY.len()));
    }
    if !rest.starts_with(PROPERTIES_OPEN) {
        return None;
    }

    let bytes = rest.as_bytes();
    let mut depth = 0usize;
    let mut at = 0usize;
    loop {
        let open = memmem::find(&bytes[at..], PROPERTIES_OPEN.as_bytes());
        let close = memmem::find(&bytes[at..], PROPERTIES_CLOSE.as_bytes())?;
        match open {
            Some(open) if open < close => {
                depth += 1;
                at += open + PROPERTIES_OPEN.len();
            }
            _ => {
                depth -= 1;
                at += close + PROPERTIES_CLOSE.len();
                if depth == 0 {
                    return Some((start, start + at));
                }
            }
        }
    }
}

/// The run's formatting block, or `None` if it carries no explicit formatting.
pub fn run_properties(body: &str) -> Option<&str> {
    properties_span(body).map(|(start, end)| &body[start..end])
}

fn strip_properties(body: &str) -> &str {
    match properties_span(body) {
        Some((_, end)) => &body[end..],
        None => body,
    }
}

fn replace_properties(body: &str, properties: Option<&str>) -> String {
    let rest = strip_properties(body);
    let mut out = String::with_capacity(rest.len() + properties.map_or(0, str::len));
    out.push_str(properties.unwrap_or_default());
    out.push_str(rest);
    out
}

fn strip_run_close(body: &str) -> Option<&str> {
    body.trim_end().strip_suffix(RUN_CLOSE)
}

/// Result of one [`try_merge_with_next`] attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged: bool,
    /// Field-scope state observed at the following run.
    pub scope: FieldScope,
}

/// Fuse `runs[index]` into `runs[index + 1]` if their formatting matches.
///
/// `scope` is the field-scope state at `runs[index]`. On success the trailing
/// slot carries the fused run (with the leading run's open tag) and
/// `runs[index]` is left blank, so a chain of equal runs collapses one call
/// at a time without shifting indices.
pub fn try_merge_with_next(
    runs: &mut [Run],
    index: usize,
    scope: FieldScope,
) -> Result<MergeOutcome> {
    if index + 1 >= runs.len() {
        return Ok(MergeOutcome {
            merged: false,
            scope,
        });
    }

    let next_scope =
        scope
            .advance(runs, index + 1)
            .map_err(|source| TidyError::FieldScopeInconsistency {
                run: source.entering_run,
                source,
            })?;

    let current = &runs[index].body;
    let next = &runs[index + 1].body;

    let Some(head) = strip_run_close(current) else {
        return Ok(MergeOutcome {
            merged: false,
            scope: next_scope,
        });
    };
    if contains(next, FIELD_BEGIN) || scope.ending_in_current_run {
        return Ok(MergeOutcome {
            merged: false,
            scope: next_scope,
        });
    }
    let properties = scope.effective_properties(current);
    if properties != next_scope.effective_properties(next) {
        return Ok(MergeOutcome {
            merged: false,
            scope: next_scope,
        });
    }

    let head = if scope.is_interior() {
        replace_properties(head, properties)
    } else {
        head.to_owned()
    };
    let mut body = head;
    body.push_str(strip_properties(next));

    let absorbed = std::mem::take(&mut runs[index]);
    runs[index + 1] = Run::new(absorbed.open_tag, body);
    trace!(index, "merged run into successor");

    Ok(MergeOutcome {
        merged: true,
        scope: next_scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOLD: &str = "<w:rPr><w:b/></w:rPr>";

    fn run(body: &str) -> Run {
        Run::new("<w:r>", body)
    }

    #[test]
    fn test_run_properties() {
        assert_eq!(
            run_properties("<w:rPr><w:b/></w:rPr><w:t>x</w:t></w:r>"),
            Some(BOLD)
        );
        assert_eq!(run_properties("<w:rPr/><w:t>x</w:t>"), Some("<w:rPr/>"));
        assert_eq!(run_properties("<w:t>x</w:t></w:r>"), None);
        assert_eq!(run_properties("\n <w:rPr>\n<w:i/>\n</w:rPr>"), Some("<w:rPr>\n<w:i/>\n</w:rPr>"));
    }

    #[test]
    fn test_tracked_change_properties_are_balanced() {
        let props = "<w:rPr><w:b/><w:rPrChange w:id=\"1\"><w:rPr><w:i/></w:rPr></w:rPrChange></w:rPr>";
        let body = format!("{props}<w:t>x</w:t></w:r>");
        assert_eq!(run_properties(&body), Some(props));
        assert_eq!(strip_properties(&body), "<w:t>x</w:t></w:r>");
    }

    #[test]
    fn test_unterminated_properties() {
        assert_eq!(run_properties("<w:rPr><w:b/>"), None);
    }

    #[test]
    fn test_nested_properties_are_not_the_run_properties() {
        let body = "<w:ruby><w:rt><w:r><w:rPr><w:b/></w:rPr></w:r></w:rt></w:ruby></w:r>";
        assert_eq!(run_properties(body), None);
    }

    #[test]
    fn test_merge_identical_runs() {
        let mut runs = vec![
            run(&format!("{BOLD}<w:t>Hello </w:t></w:r>")),
            Run::new("<w:r w:rsidR=\"2\">", format!("{BOLD}<w:t>World</w:t></w:r>")),
        ];
        let outcome = try_merge_with_next(&mut runs, 0, FieldScope::default()).unwrap();
        assert!(outcome.merged);
        assert!(runs[0].is_blank());
        assert_eq!(runs[1].open_tag, "<w:r>");
        assert_eq!(
            runs[1].body,
            format!("{BOLD}<w:t>Hello </w:t><w:t>World</w:t></w:r>")
        );
    }

    #[test]
    fn test_absent_properties_are_equal() {
        let mut runs = vec![run("<w:t>a</w:t></w:r>"), run("<w:t>b</w:t></w:r>")];
        let outcome = try_merge_with_next(&mut runs, 0, FieldScope::default()).unwrap();
        assert!(outcome.merged);
        assert_eq!(runs[1].body, "<w:t>a</w:t><w:t>b</w:t></w:r>");
    }

    #[test]
    fn test_absent_differs_from_present() {
        let mut runs = vec![
            run("<w:t>a</w:t></w:r>"),
            run(&format!("{BOLD}<w:t>b</w:t></w:r>")),
        ];
        let before = runs.clone();
        let outcome = try_merge_with_next(&mut runs, 0, FieldScope::default()).unwrap();
        assert!(!outcome.merged);
        assert_eq!(runs, before);
    }

    #[test]
    fn test_unclosed_run_is_skipped() {
        let mut runs = vec![
            run(&format!("{BOLD}<w:t>a</w:t></w:r><w:bookmarkStart w:id=\"0\"/>")),
            run(&format!("{BOLD}<w:t>b</w:t></w:r>")),
        ];
        let outcome = try_merge_with_next(&mut runs, 0, FieldScope::default()).unwrap();
        assert!(!outcome.merged);
    }

    #[test]
    fn test_never_merges_into_field_begin() {
        let mut runs = vec![
            run("<w:t>a</w:t></w:r>"),
            run("<w:fldChar w:fldCharType=\"begin\"/></w:r>"),
            run("<w:instrText> PAGE </w:instrText></w:r>"),
            run("<w:fldChar w:fldCharType=\"end\"/></w:r>"),
        ];
        let scope = FieldScope::default().advance(&runs, 0).unwrap();
        let outcome = try_merge_with_next(&mut runs, 0, scope).unwrap();
        assert!(!outcome.merged);
        assert!(outcome.scope.inside_scope);
        assert!(outcome.scope.entering_in_current_run);
    }

    #[test]
    fn test_out_of_range_index() {
        let mut runs = vec![run("<w:t>a</w:t></w:r>")];
        let outcome = try_merge_with_next(&mut runs, 0, FieldScope::default()).unwrap();
        assert!(!outcome.merged);
    }
}
