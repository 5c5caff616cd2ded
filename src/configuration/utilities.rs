//! Newline-delimited list helpers used by the exclusion list.


/// Splits a newline-delimited blob into its tokens.
///
/// Each line is trimmed of surrounding whitespace (this also takes care of `\r\n`
/// line endings) and blank lines are dropped.
pub fn split_newline_delimited_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins tokens into a newline-delimited blob. Inverse of [`split_newline_delimited_list`]
/// for tokens that are non-empty, untrimmed-whitespace-free and contain no line breaks.
pub fn join_newline_delimited_list<S>(tokens: &[S]) -> String
where
    S: AsRef<str>,
{
    tokens
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}
