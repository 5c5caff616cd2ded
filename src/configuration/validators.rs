//! Format checks applied to individual configuration values.
//!
//! Every check is total: it never panics and reports the broken rule as a
//! [`ValidationReason`] instead of a boolean.

use url::Url;

use super::error::ValidationReason;


/// Checks that `value` is a URI reference: either an absolute URI
/// (`https://…`, `gs://…`, `file:///…`) or a relative reference such as a local
/// file path (`./bundles/a.brokerpak`).
pub fn check_uri(value: &str) -> Result<(), ValidationReason> {
    if value.is_empty() {
        return Err(ValidationReason::Required);
    }

    if !has_only_uri_characters(value) {
        return Err(ValidationReason::MalformedUri);
    }

    if has_scheme(value) {
        return Url::parse(value)
            .map(|_| ())
            .map_err(|_| ValidationReason::MalformedUri);
    }

    check_relative_reference(value)
}

/// Checks that `value` follows the brokerpak/service naming convention:
/// lowercase ASCII letters, digits, `-`, `_` and `.`, starting with a letter or digit.
pub fn check_identifier(value: &str) -> Result<(), ValidationReason> {
    let mut characters = value.chars();

    let Some(first) = characters.next() else {
        return Err(ValidationReason::Required);
    };

    if !is_identifier_alphanumeric(first) {
        return Err(ValidationReason::MalformedIdentifier);
    }

    if !characters.all(|c| is_identifier_alphanumeric(c) || matches!(c, '-' | '_' | '.')) {
        return Err(ValidationReason::MalformedIdentifier);
    }

    Ok(())
}

/// Checks that `value` parses as JSON and that the top-level value is an object.
pub fn check_json_object(value: &str) -> Result<(), ValidationReason> {
    if value.is_empty() {
        return Err(ValidationReason::Required);
    }

    let parsed = serde_json::from_str::<serde_json::Value>(value)
        .map_err(|_| ValidationReason::MalformedJson)?;

    if !parsed.is_object() {
        return Err(ValidationReason::NotJsonObject);
    }

    Ok(())
}


/// RFC 3986 section 4.2: the first segment of a relative path may not contain `:`,
/// and the reference has to name something (an authority or a non-empty path).
fn check_relative_reference(value: &str) -> Result<(), ValidationReason> {
    let without_fragment = value.split('#').next().unwrap_or_default();
    let hierarchical_part = without_fragment.split('?').next().unwrap_or_default();

    if let Some(authority_and_path) = hierarchical_part.strip_prefix("//") {
        let authority = authority_and_path.split('/').next().unwrap_or_default();
        if authority.is_empty() {
            return Err(ValidationReason::MalformedUri);
        }

        return Ok(());
    }

    if hierarchical_part.is_empty() {
        return Err(ValidationReason::MalformedUri);
    }

    let first_segment = hierarchical_part.split('/').next().unwrap_or_default();
    if first_segment.contains(':') {
        return Err(ValidationReason::MalformedUri);
    }

    Ok(())
}

#[inline]
fn is_identifier_alphanumeric(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

/// RFC 3986 section 3.1: `ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"`.
fn has_scheme(value: &str) -> bool {
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };

    let mut characters = scheme.chars();
    match characters.next() {
        Some(first) if first.is_ascii_alphabetic() => characters
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

/// Unreserved and reserved characters plus well-formed percent-encoded octets.
fn has_only_uri_characters(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut index = 0;

    while index < bytes.len() {
        let byte = bytes[index];

        if byte == b'%' {
            let is_encoded_octet = bytes
                .get(index + 1..index + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));

            if !is_encoded_octet {
                return false;
            }

            index += 3;
            continue;
        }

        let allowed = byte.is_ascii_alphanumeric()
            || matches!(
                byte,
                b'-' | b'.'
                    | b'_'
                    | b'~'
                    | b':'
                    | b'/'
                    | b'?'
                    | b'#'
                    | b'['
                    | b']'
                    | b'@'
                    | b'!'
                    | b'$'
                    | b'&'
                    | b'\''
                    | b'('
                    | b')'
                    | b'*'
                    | b'+'
                    | b','
                    | b';'
                    | b'='
            );

        if !allowed {
            return false;
        }

        index += 1;
    }

    true
}
