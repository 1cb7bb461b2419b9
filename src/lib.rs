// src/lib.rs

//! docx-tidy — collapse redundant fragmentation in WordprocessingML parts.
//!
//! Word splits one logical piece of text into many adjacent `<w:r>` runs with
//! identical formatting, and many adjacent `<w:t>` elements inside a run.
//! This crate rewrites such markup into the minimal equivalent form:
//!
//! - adjacent runs with byte-identical `w:rPr` are fused,
//! - adjacent `w:t` / `w:instrText` elements inside a run are fused,
//! - runs inside a complex field (`w:fldChar` begin … end) are compared by
//!   the field's canonical formatting, so they can be fused as well,
//! - `xml:space="preserve"` is put on every text element afterwards.
//!
//! It is not an XML parser: it relies on the regular tag shapes Word emits.
//!
//! ```
//! use docx_tidy::{tidy_markup, RemovalConfig};
//!
//! let xml = "<w:body><w:p><w:r><w:t>Hel</w:t></w:r><w:r><w:t>lo</w:t></w:r></w:p></w:body>";
//! let tidied = tidy_markup(xml, &RemovalConfig::Default).unwrap();
//! assert_eq!(
//!     tidied,
//!     "<w:body><w:p><w:r><w:t xml:space=\"preserve\">Hello</w:t></w:r></w:p></w:body>"
//! );
//! ```

pub mod config;
pub mod element;
pub mod error;
pub mod field;
pub mod package;
pub mod paragraph;
pub mod run;
pub mod split;
pub mod tag;
pub mod tidy;

pub use config::RemovalConfig;
pub use error::{Result, TidyError};
pub use package::{
    tidy_document, tidy_package, tidy_part_file, DirectoryPackage, Package, PartHandle,
};
pub use tidy::{tidy_markup, Tidier};
