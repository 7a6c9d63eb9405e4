//! Deterministic post-processing of model completions.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static FRAC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\\[dt]?frac\s*\{([^{}]*)\}\s*\{([^{}]*)\}").unwrap());

static SQRT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\sqrt\s*\{([^{}]*)\}").unwrap());

static MATH_DELIMITER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\[()\[\]\\,;!]").unwrap());

static COMMAND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\\([a-zA-Z]+)").unwrap());

static MARKUP_CHAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[{}$\\]|\*\*").unwrap());

static PAREN_GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^()]*)\)").unwrap());

static STEP_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[\n.:!?])\s*(\d{1,2})\.\s+").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([.,:;!?])(\s|\x01|$)").unwrap());

static BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\x01").unwrap());

// Placeholder for a paragraph break; survives whitespace collapsing.
const BREAK: &str = "\x01";

/// Keeps at most `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Turns a raw step-by-step completion into plain text: markup removed,
/// whitespace collapsed, and a blank line before every numbered step.
pub fn normalize_steps(raw: &str) -> String {
    let text = strip_markup(raw);
    let text = collapse_paren_groups(&text);

    let text = STEP_MARKER_RE.replace_all(&text, |caps: &Captures| {
        format!("{}{BREAK}{}. ", &caps[1], &caps[2])
    });
    let text = WHITESPACE_RE.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCT_RE.replace_all(&text, "$1$2");
    let text = BREAK_RE.replace_all(&text, "\n\n");

    text.trim().to_string()
}

fn strip_markup(text: &str) -> String {
    let text = rewrite_fractions(text);
    let text = MATH_DELIMITER_RE.replace_all(&text, " ");
    let text = COMMAND_RE.replace_all(&text, |caps: &Captures| {
        match operator_symbol(&caps[1]) {
            Some(symbol) => format!(" {symbol} "),
            None => String::new(),
        }
    });
    MARKUP_CHAR_RE.replace_all(&text, "").into_owned()
}

/// Rewrites `\sqrt{x}` and `\frac{a}{b}` innermost first until none are
/// left, so nested forms keep their structure.
fn rewrite_fractions(text: &str) -> String {
    let mut text = text.to_string();
    loop {
        let roots = SQRT_RE.replace_all(&text, "sqrt($1)").into_owned();
        let next = FRAC_RE
            .replace_all(&roots, |caps: &Captures| {
                format!(
                    "{}/{}",
                    fraction_operand(&caps[1]),
                    fraction_operand(&caps[2])
                )
            })
            .into_owned();
        if next == text {
            return next;
        }
        text = next;
    }
}

// Compound operands are parenthesized: (1/2)/3, (x+1)/2.
fn fraction_operand(operand: &str) -> String {
    let operand = operand.trim();
    if operand.contains(|c: char| c.is_whitespace() || "+-*/".contains(c)) {
        format!("({operand})")
    } else {
        operand.to_string()
    }
}

fn operator_symbol(command: &str) -> Option<&'static str> {
    let symbol = match command {
        "times" | "cdot" | "ast" => "*",
        "div" => "/",
        "pm" => "+/-",
        "neq" | "ne" => "!=",
        "leq" | "le" => "<=",
        "geq" | "ge" => ">=",
        "approx" => "~",
        "infty" => "infinity",
        "pi" => "pi",
        _ => return None,
    };
    Some(symbol)
}

fn collapse_paren_groups(text: &str) -> String {
    PAREN_GROUP_RE
        .replace_all(text, |caps: &Captures| {
            let inner: Vec<&str> = caps[1].split_whitespace().collect();
            format!("({})", inner.join(" "))
        })
        .into_owned()
}
