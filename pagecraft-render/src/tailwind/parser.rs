use regex::Regex;
use std::sync::OnceLock;

/// A `prefix-[value]` utility class, borrowed from its source token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BracketToken<'a> {
    /// Utility key, optionally with an axis suffix: `p`, `px`, `space-x`, `text`.
    pub prefix: &'a str,
    /// Raw text between the brackets, untouched.
    pub value: &'a str,
}

fn bracket_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([a-z]+(?:-[a-z])?)-\[([^\[\]]+)\]$").expect("bracket pattern compiles")
    })
}

/// Classify one class token. Anything that is not exactly `prefix-[value]`
/// returns `None`.
pub fn parse_bracket_token(token: &str) -> Option<BracketToken<'_>> {
    let caps = bracket_pattern().captures(token)?;
    let prefix = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str();
    if value.trim().is_empty() {
        return None;
    }
    Some(BracketToken { prefix, value })
}

/// Splits a class string into tokens, in order, keeping duplicates.
///
/// Whitespace inside a `[...]` group does not split, so `w-[calc(100% - 1rem)]`
/// stays one token. If a bracket is never closed, the unterminated tail is
/// split on plain whitespace instead.
pub fn split_classes(classes: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;

    for (i, ch) in classes.char_indices() {
        match ch {
            '[' => {
                depth += 1;
                start.get_or_insert(i);
            }
            ']' => {
                depth = depth.saturating_sub(1);
                start.get_or_insert(i);
            }
            c if c.is_whitespace() && depth == 0 => {
                if let Some(s) = start.take() {
                    tokens.push(&classes[s..i]);
                }
            }
            _ => {
                start.get_or_insert(i);
            }
        }
    }

    if let Some(s) = start {
        let tail = &classes[s..];
        if depth == 0 {
            tokens.push(tail);
        } else {
            tokens.extend(tail.split_whitespace());
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_classes() {
        assert_eq!(split_classes("flex  p-4\ttext-white"), vec!["flex", "p-4", "text-white"]);
    }

    #[test]
    fn keeps_duplicates_and_order() {
        assert_eq!(split_classes("p-4 flex p-4"), vec!["p-4", "flex", "p-4"]);
    }

    #[test]
    fn brackets_group_whitespace() {
        assert_eq!(
            split_classes("w-[calc(100% - 1rem)] mt-2"),
            vec!["w-[calc(100% - 1rem)]", "mt-2"]
        );
    }

    #[test]
    fn unterminated_bracket_falls_back_to_whitespace() {
        assert_eq!(split_classes("flex w-[10 px-2"), vec!["flex", "w-[10", "px-2"]);
    }

    #[test]
    fn empty_input() {
        assert!(split_classes("   ").is_empty());
    }

    #[test]
    fn parses_bracket_tokens() {
        let tok = parse_bracket_token("p-[12]").unwrap();
        assert_eq!(tok, BracketToken { prefix: "p", value: "12" });

        let tok = parse_bracket_token("space-x-[4px]").unwrap();
        assert_eq!(tok.prefix, "space-x");

        let tok = parse_bracket_token("text-[#ff0000]").unwrap();
        assert_eq!(tok.value, "#ff0000");
    }

    #[test]
    fn rejects_non_bracket_tokens() {
        assert!(parse_bracket_token("p-4").is_none());
        assert!(parse_bracket_token("p-[]").is_none());
        assert!(parse_bracket_token("hover:p-[12]").is_none());
        assert!(parse_bracket_token("p-[[1]]").is_none());
        assert!(parse_bracket_token("P-[12]").is_none());
    }
}
