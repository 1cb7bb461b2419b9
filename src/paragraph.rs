// src/paragraph.rs
//
// One paragraph, tidied to a fixed point: runs are fused, then text elements
// inside each run, until a cycle changes nothing.

use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::element::merge_elements;
use crate::error::{Result, TidyError};
use crate::field::FieldScope;
use crate::run::{try_merge_with_next, Run};
use crate::split::split_with_separators;

/// `<w:r>` or `<w:r attr...>`, but not `<w:rPr>`, `<w:rFonts ...>` etc.
static RUN_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<w:r(?:\s[^>]*)?>").expect("run open pattern should compile"));

/// One left-to-right run-merge pass. Returns the number of fusions.
fn merge_runs(runs: &mut [Run]) -> Result<usize> {
    if runs.len() < 2 {
        return Ok(0);
    }

    let mut scope = FieldScope::default()
        .advance(runs, 0)
        .map_err(|source| TidyError::FieldScopeInconsistency {
            run: source.entering_run,
            source,
        })?;

    let mut merged = 0usize;
    for index in 0..runs.len() - 1 {
        let outcome = try_merge_with_next(runs, index, scope)?;
        merged += usize::from(outcome.merged);
        scope = outcome.scope;
    }
    Ok(merged)
}

fn merge_run_elements(runs: &mut [Run]) -> Result<usize> {
    let mut merged = 0usize;
    for run in runs.iter_mut().filter(|run| !run.body.is_empty()) {
        let (body, count) = merge_elements(&run.body)?;
        if count > 0 {
            run.body = body;
            merged += count;
        }
    }
    Ok(merged)
}

fn reassemble(head: &str, runs: &[Run]) -> String {
    let mut out = String::with_capacity(
        head.len()
            + runs
                .iter()
                .map(|run| run.open_tag.len() + run.body.len())
                .sum::<usize>(),
    );
    out.push_str(head);
    for run in runs {
        out.push_str(&run.open_tag);
        out.push_str(&run.body);
    }
    out
}

/// Tidy one paragraph (everything after its `<w:p ...>` tag) to a fixed
/// point.
///
/// Every cycle re-splits the paragraph into runs, because a fusion can make
/// runs adjacent that were not before.
pub fn tidy_paragraph(paragraph: &str) -> Result<String> {
    let mut current = paragraph.to_owned();
    let mut cycles = 0usize;

    loop {
        let (head, mut runs) = {
            let split = split_with_separators(&RUN_OPEN, &current);
            let runs: Vec<Run> = split
                .separators
                .iter()
                .zip(&split.fragments[1..])
                .map(|(&open_tag, &body)| Run::new(open_tag, body))
                .collect();
            (split.fragments[0].to_owned(), runs)
        };
        if runs.is_empty() {
            return Ok(current);
        }

        let runs_merged = merge_runs(&mut runs)?;
        let elements_merged = merge_run_elements(&mut runs)?;
        current = reassemble(&head, &runs);
        cycles += 1;

        if runs_merged == 0 && elements_merged == 0 {
            trace!(cycles, runs = runs.len(), "paragraph stable");
            return Ok(current);
        }
    }
}
