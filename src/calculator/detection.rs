//! Input classification for the free-text calculator.
//!
//! Normalizes raw input, answers canned easter-egg phrases, and decides
//! whether input is a candidate for graphing before any evaluation runs.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

/// The single free variable a graphable expression may use.
pub const GRAPH_VARIABLE: &str = "x";

/// Fixed phrase to canned-response table, keyed by lower-cased input.
const EASTER_EGGS: &[(&str, &str)] = &[
    ("what is the meaning of life", "42"),
    ("hello", "Hello there!"),
    (
        "tell me a joke",
        "Why don't scientists trust atoms? Because they make up everything!",
    ),
    ("magic", "✨ Abracadabra! ✨"),
    ("dyad", "You're chatting with me right now!"),
];

lazy_static! {
    /// A root glyph directly followed by a number or identifier operand.
    static ref ROOT_OPERAND: Regex = Regex::new(
        r"√\s*([0-9]*\.?[0-9]+|[A-Za-z_][A-Za-z0-9_]*)"
    ).unwrap();

    /// `x` standing alone as an identifier.
    static ref VARIABLE_TOKEN: Regex = Regex::new(r"\bx\b").unwrap();
}

/// Raw input split into the three forms the evaluator needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NormalizedInput {
    /// Trimmed user text, kept verbatim for history.
    pub original: String,
    /// Text handed to the math engine.
    pub normalized: String,
    /// Lower-cased normalized text used for classification.
    pub lookup_key: String,
}

/// Trim input and rewrite the root glyph into a `sqrt` call.
pub fn normalize(input: &str) -> NormalizedInput {
    let original = input.trim().to_string();
    let normalized = ROOT_OPERAND
        .replace_all(&original, "sqrt($1)")
        .replace('√', "sqrt");
    let lookup_key = normalized.to_lowercase();

    NormalizedInput {
        original,
        normalized,
        lookup_key,
    }
}

/// Look up the canned reply for an exact (already lower-cased) phrase.
pub fn easter_egg(lookup_key: &str) -> Option<&'static str> {
    EASTER_EGGS
        .iter()
        .find(|(phrase, _)| *phrase == lookup_key)
        .map(|(_, reply)| *reply)
}

/// How the graph probe decides that input mentions the variable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableMatch {
    /// Any occurrence of the letter, including inside longer names like `max`.
    #[default]
    Substring,
    /// Only `x` as a standalone identifier.
    Token,
}

impl VariableMatch {
    pub fn mentions_variable(self, lookup_key: &str) -> bool {
        match self {
            Self::Substring => lookup_key.contains(GRAPH_VARIABLE),
            Self::Token => VARIABLE_TOKEN.is_match(lookup_key),
        }
    }
}

/// Check if input should be probed as a graphable function.
///
/// This is only the textual pre-check; the evaluator still has to
/// evaluate the expression at `x = 1` before treating it as a graph.
pub fn looks_graphable(lookup_key: &str, mode: VariableMatch) -> bool {
    mode.mentions_variable(lookup_key) && !lookup_key.contains("matrix")
}
