// src/error.rs
//
// Error taxonomy shared by every stage.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::field::MissingFieldText;

pub type Result<T, E = TidyError> = std::result::Result<T, E>;

/// Everything that can abort tidying a part or a document.
///
/// There is no partial-success mode: any of these ends the current
/// operation and is handed to the caller unchanged.
#[derive(Debug, Error)]
pub enum TidyError {
    #[error("invalid pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("tag type identification failed for '{tag}'")]
    MalformedTag { tag: String },

    #[error("field scope entered at run {run} has no canonical run properties")]
    FieldScopeInconsistency {
        run: usize,
        #[source]
        source: MissingFieldText,
    },

    #[error("failed reading part {}", .part.display())]
    PartRead {
        part: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed writing part {}", .part.display())]
    PartWrite {
        part: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed packaging document into {}", .path.display())]
    Packaging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
