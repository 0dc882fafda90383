//! Redaction of secret material from log-bound strings.
//!
//! Error messages from the HTTP layer can embed request URLs or headers;
//! anything that may carry a token or password goes through here first.

use std::borrow::Cow;

/// Prefixes whose following value must not reach the logs.
const SECRET_PREFIXES: &[&str] = &[
    "Authorization: Bearer ",
    "authorization: bearer ",
    "token=",
    "session_token=",
    "password=",
];

/// Replaces the value after any known secret prefix with `[redacted]`.
pub fn redact_secrets(input: &str) -> Cow<'_, str> {
    if !SECRET_PREFIXES.iter().any(|p| input.contains(p)) {
        return Cow::Borrowed(input);
    }

    let mut out = input.to_owned();
    for prefix in SECRET_PREFIXES {
        out = redact_after(&out, prefix);
    }
    Cow::Owned(out)
}

fn redact_after(input: &str, prefix: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find(prefix) {
        let value_start = pos + prefix.len();
        result.push_str(&rest[..value_start]);
        result.push_str("[redacted]");
        let tail = &rest[value_start..];
        let value_end = tail
            .find(|c: char| c.is_whitespace() || c == '&' || c == '"' || c == '\'')
            .unwrap_or(tail.len());
        rest = &tail[value_end..];
    }
    result.push_str(rest);
    result
}
