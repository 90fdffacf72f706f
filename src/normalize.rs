//! Output normalization applied to successful command results.

use unicode_general_category::{get_general_category, GeneralCategory};

/// Strips every `'\r'`, then trims leading and trailing runs of non-graphic chars.
///
/// Interior characters, including interior non-graphic ones, are kept verbatim.
pub fn normalize_output(raw: &str) -> String {
    let without_cr: String = raw.chars().filter(|&ch| ch != '\r').collect();
    without_cr
        .trim_matches(|ch: char| !is_graphic(ch))
        .to_string()
}

/// Whether `ch` is a visible character or a space separator.
///
/// Graphic means general category L, M, N, P, S or Zs. Everything else is
/// trimmed: controls, format characters, line and paragraph separators,
/// surrogates, private use and unassigned code points.
pub fn is_graphic(ch: char) -> bool {
    !matches!(
        get_general_category(ch),
        GeneralCategory::Control
            | GeneralCategory::Format
            | GeneralCategory::LineSeparator
            | GeneralCategory::ParagraphSeparator
            | GeneralCategory::PrivateUse
            | GeneralCategory::Surrogate
            | GeneralCategory::Unassigned
    )
}
