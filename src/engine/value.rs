//! Scalar values in Junos statements

use crate::error::{Error, Result};

/// Parse an integer read from the device, failing on anything else
pub fn parse_int(field: &str, text: &str) -> Result<i64> {
    let text = unquote(text);
    text.parse::<i64>().map_err(|e| Error::ParseInt {
        field: field.to_string(),
        value: text.clone(),
        message: e.to_string(),
    })
}

/// Remove surrounding double quotes and unescape inner quotes
pub fn unquote(text: &str) -> String {
    let text = text.trim();
    match text
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\\\"", "\""),
        None => text.to_string(),
    }
}

/// Quote a value when the Junos CLI would otherwise split it
pub fn quote(text: &str) -> String {
    let needs_quotes = text.is_empty()
        || text
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | ';' | '{' | '}' | '#'));
    if needs_quotes {
        format!("\"{}\"", text.replace('"', "\\\""))
    } else {
        text.to_string()
    }
}

/// Split the first token off `text`, honoring double quotes
///
/// Returns the unquoted token and the trimmed remainder.
pub fn split_token(text: &str) -> (String, &str) {
    let text = text.trim_start();
    if let Some(quoted) = text.strip_prefix('"') {
        let mut escaped = false;
        for (i, c) in quoted.char_indices() {
            match c {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => {
                    let token = quoted[..i].replace("\\\"", "\"");
                    return (token, quoted[i + 1..].trim_start());
                }
                _ => escaped = false,
            }
        }
        return (quoted.replace("\\\"", "\""), "");
    }
    match text.split_once(' ') {
        Some((token, rest)) => (token.to_string(), rest.trim_start()),
        None => (text.to_string(), ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("loops", "5").unwrap(), 5);
        assert_eq!(parse_int("metric", "\"20\"").unwrap(), 20);

        let err = parse_int("loops", "five").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to convert value from 'five' to integer for loops: invalid digit found in string"
        );
        assert!(parse_int("loops", "5m").is_err());
    }

    #[test]
    fn test_quote_and_unquote() {
        assert_eq!(quote("untrust"), "untrust");
        assert_eq!(quote("dmz zone"), "\"dmz zone\"");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(unquote("\"dmz zone\""), "dmz zone");
        assert_eq!(unquote(&quote("say \"hi\"")), "say \"hi\"");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn test_split_token() {
        assert_eq!(
            split_token("book1 192.0.2.0/24"),
            ("book1".to_string(), "192.0.2.0/24")
        );
        assert_eq!(
            split_token("\"web servers\" description \"x y\""),
            ("web servers".to_string(), "description \"x y\"")
        );
        assert_eq!(split_token("alone"), ("alone".to_string(), ""));
    }
}
