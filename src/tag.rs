// src/tag.rs
//
// Classification of raw element-tag tokens such as `<w:t`, `</w:t` or
// `<w:rPr>`.

use crate::error::{Result, TidyError};

/// "Limiting" kind of a tag token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Limit {
    Opening,
    Closing,
    Neither,
}

#[inline]
fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

/// Element type of a tag token, e.g. `w:t` for both `<w:t>` and `</w:t`.
///
/// Only prefixed names are recognised; anything else is a
/// [`TidyError::MalformedTag`].
pub fn type_of(tag: &str) -> Result<&str> {
    let malformed = || TidyError::MalformedTag {
        tag: tag.to_owned(),
    };

    let rest = tag
        .strip_prefix("</")
        .or_else(|| tag.strip_prefix('<'))
        .ok_or_else(malformed)?;
    let end = rest
        .bytes()
        .position(|b| !is_name_char(b))
        .unwrap_or(rest.len());
    let name = &rest[..end];

    match name.split_once(':') {
        Some((prefix, local))
            if !prefix.is_empty()
                && !local.is_empty()
                && prefix.bytes().all(|b| b.is_ascii_alphabetic())
                && local.bytes().all(|b| b.is_ascii_alphabetic()) =>
        {
            Ok(name)
        }
        _ => Err(malformed()),
    }
}

/// Opening if the token starts like `<w`, closing if it starts like `</w`.
pub fn limiting_kind(tag: &str) -> Limit {
    let b = tag.as_bytes();
    match b {
        [b'<', b'/', c, ..] if c.is_ascii_alphabetic() => Limit::Closing,
        [b'<', c, ..] if c.is_ascii_alphabetic() => Limit::Opening,
        _ => Limit::Neither,
    }
}

pub fn same_type(a: &str, b: &str) -> Result<bool> {
    Ok(type_of(a)? == type_of(b)?)
}
