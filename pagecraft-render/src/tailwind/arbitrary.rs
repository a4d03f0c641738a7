use super::parser::{parse_bracket_token, split_classes, BracketToken};

/// Prefixes whose bare-integer arbitrary values are read as pixels.
const PIXEL_PREFIXES: &[&str] = &[
    "p", "px", "py", "pt", "pr", "pb", "pl",
    "m", "mx", "my", "mt", "mr", "mb", "ml",
    "w", "h",
    "gap", "space-x", "space-y",
    "inset", "top", "right", "bottom", "left",
];

/// Result of pulling arbitrary values out of a class string.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedStyles {
    /// CSS declarations, in first-seen order. A later token for the same
    /// property replaces the earlier value in place.
    pub styles: Vec<(String, String)>,
    /// Tokens that were not turned into declarations, space-joined.
    pub remaining_classes: String,
}

impl ExtractedStyles {
    fn set(&mut self, property: &str, value: String) {
        match self.styles.iter_mut().find(|(p, _)| p == property) {
            Some(slot) => slot.1 = value,
            None => self.styles.push((property.to_string(), value)),
        }
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.styles
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Declarations as an inline `style` attribute value.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        for (prop, val) in &self.styles {
            css.push_str(prop);
            css.push(':');
            css.push_str(val);
            css.push(';');
        }
        css
    }
}

// ─── Normalization ──────────────────────────────────────────────────────────

/// Rewrites `prefix-[value]` tokens as `prefix-value`.
///
/// Whitespace inside the brackets is removed, and a bare integer gets a `px`
/// unit when the prefix is a spacing, sizing or position utility. Every other
/// token is passed through. Token order and count are preserved.
pub fn normalize_arbitrary_classes(classes: &str) -> String {
    split_classes(classes)
        .into_iter()
        .map(|token| match parse_bracket_token(token) {
            Some(tok) => normalize_token(tok),
            None => token.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_token(tok: BracketToken<'_>) -> String {
    let value: String = tok.value.split_whitespace().collect();
    let value = with_pixel_unit(tok.prefix, value);
    format!("{}-{}", tok.prefix, value)
}

fn with_pixel_unit(prefix: &str, value: String) -> String {
    if PIXEL_PREFIXES.contains(&prefix) && is_bare_integer(&value) {
        format!("{}px", value)
    } else {
        value
    }
}

fn is_bare_integer(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

// ─── Style extraction ───────────────────────────────────────────────────────

/// Moves recognised `prefix-[value]` tokens into explicit CSS declarations.
///
/// Recognised prefixes are padding and margin (including axis and side
/// variants), `w`, `h`, the four position edges, and `text`. Everything else,
/// bracketed or not, stays in `remaining_classes` verbatim. The input string is
/// only partitioned, never rewritten.
pub fn extract_arbitrary_styles(classes: &str) -> ExtractedStyles {
    let mut out = ExtractedStyles::default();
    let mut remaining: Vec<&str> = Vec::new();

    for token in split_classes(classes) {
        let consumed = parse_bracket_token(token)
            .map(|tok| apply_token(&mut out, tok))
            .unwrap_or(false);
        if !consumed {
            remaining.push(token);
        }
    }

    out.remaining_classes = remaining.join(" ");
    out
}

/// Writes the declarations for one token. Returns false for unknown prefixes.
fn apply_token(out: &mut ExtractedStyles, tok: BracketToken<'_>) -> bool {
    let value = css_value(tok.value);

    if tok.prefix == "text" {
        return apply_text(out, value);
    }

    let Some(props) = box_properties(tok.prefix) else {
        return false;
    };
    let value = with_pixel_unit(tok.prefix, value);
    for prop in props {
        out.set(prop, value.clone());
    }
    true
}

fn box_properties(prefix: &str) -> Option<&'static [&'static str]> {
    let props: &'static [&'static str] = match prefix {
        "p" => &["padding-top", "padding-right", "padding-bottom", "padding-left"],
        "px" => &["padding-left", "padding-right"],
        "py" => &["padding-top", "padding-bottom"],
        "pt" => &["padding-top"],
        "pr" => &["padding-right"],
        "pb" => &["padding-bottom"],
        "pl" => &["padding-left"],
        "m" => &["margin-top", "margin-right", "margin-bottom", "margin-left"],
        "mx" => &["margin-left", "margin-right"],
        "my" => &["margin-top", "margin-bottom"],
        "mt" => &["margin-top"],
        "mr" => &["margin-right"],
        "mb" => &["margin-bottom"],
        "ml" => &["margin-left"],
        "w" => &["width"],
        "h" => &["height"],
        "top" => &["top"],
        "right" => &["right"],
        "bottom" => &["bottom"],
        "left" => &["left"],
        _ => return None,
    };
    Some(props)
}

/// `text-[color/opacity]`, `text-[#hex]`, `text-[rgb(...)]`, else a font size.
/// Returns false when the colour part of `color/opacity` is empty.
fn apply_text(out: &mut ExtractedStyles, value: String) -> bool {
    if let Some(slash) = value.rfind('/') {
        let color = value[..slash].trim();
        if color.is_empty() {
            return false;
        }
        out.set("color", color.to_string());
        let opacity = value[slash + 1..].trim();
        if !opacity.is_empty() {
            out.set("opacity", opacity_value(opacity));
        }
    } else if value.starts_with('#') || value.starts_with("rgb") {
        out.set("color", value);
    } else if is_bare_integer(&value) {
        out.set("font-size", format!("{}px", value));
    } else {
        out.set("font-size", value);
    }
    true
}

/// `50` → `0.5`; fractional and unit-suffixed values are kept.
fn opacity_value(raw: &str) -> String {
    match raw.parse::<u32>() {
        Ok(pct) if pct > 1 => format!("{}", pct as f64 / 100.0),
        _ => raw.to_string(),
    }
}

/// Underscores stand for spaces inside arbitrary values; runs of whitespace
/// collapse to one space.
fn css_value(raw: &str) -> String {
    raw.replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
