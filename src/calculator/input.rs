//! Virtual keypad input for touch screens.
//!
//! Edits a free-text expression the way an on-screen keypad does:
//! keys insert at the caret (replacing any selection), function keys
//! such as `sin()` leave the caret between the parentheses.

/// An on-screen key: the label shown and the text it inserts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyDef {
    pub label: &'static str,
    pub value: &'static str,
}

const fn key(label: &'static str, value: &'static str) -> KeyDef {
    KeyDef { label, value }
}

pub const SCIENTIFIC_KEYS: &[KeyDef] = &[
    key("sin", "sin()"),
    key("cos", "cos()"),
    key("tan", "tan()"),
    key("log", "log()"),
    key("ln", "ln()"),
    key("√", "sqrt()"),
    key("x²", "^2"),
    key("xʸ", "^"),
    key("(", "("),
    key(")", ")"),
    key("π", "pi"),
    key("e", "e"),
];

pub const NUMERIC_KEYS: &[KeyDef] = &[
    key("7", "7"),
    key("8", "8"),
    key("9", "9"),
    key("÷", "/"),
    key("4", "4"),
    key("5", "5"),
    key("6", "6"),
    key("×", "*"),
    key("1", "1"),
    key("2", "2"),
    key("3", "3"),
    key("-", "-"),
    key("0", "0"),
    key(".", "."),
    key("=", "="),
    key("+", "+"),
    key("C", "C"),
];

/// Example inputs offered as one-tap chips.
pub const SUGGESTIONS: &[&str] = &[
    "sqrt(144) + 2^3",
    "15% of 300",
    "5 feet to cm",
    "cos(45 deg)",
    "1 BTC in USD",
    "1998-03-24 to days",
];

/// What a key press asks of the calculator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputKey {
    /// Insert text at the caret.
    Text(String),
    /// Wipe the input and any shown result or graph.
    Clear,
    /// Submit the current input.
    Equals,
}

impl InputKey {
    /// Interpret the value carried by a [`KeyDef`].
    pub fn from_value(value: &str) -> Self {
        match value {
            "=" => Self::Equals,
            "C" => Self::Clear,
            text => Self::Text(text.to_string()),
        }
    }
}

/// Editable expression text with a caret and optional selection.
///
/// Positions count characters, not bytes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpressionInput {
    text: String,
    selection_start: usize,
    selection_end: usize,
}

impl ExpressionInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.selection_end
    }

    pub fn selection(&self) -> (usize, usize) {
        (self.selection_start, self.selection_end)
    }

    /// Replace the whole text and move the caret to its end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        let end = self.len();
        self.selection_start = end;
        self.selection_end = end;
    }

    pub fn clear(&mut self) {
        self.set_text(String::new());
    }

    pub fn set_caret(&mut self, position: usize) {
        self.select(position, position);
    }

    /// Select the characters in `start..end`, clamped to the text.
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.len();
        let (start, end) = (start.min(len), end.min(len));
        self.selection_start = start.min(end);
        self.selection_end = start.max(end);
    }

    /// Insert `key` over the current selection.
    ///
    /// Keys ending in `()` leave the caret between the parentheses.
    pub fn insert(&mut self, key: &str) {
        let start = self.byte_offset(self.selection_start);
        let end = self.byte_offset(self.selection_end);
        self.text.replace_range(start..end, key);

        let inserted = key.chars().count();
        let offset = if key.ends_with("()") {
            inserted - 1
        } else {
            inserted
        };
        let caret = self.selection_start + offset;
        self.selection_start = caret;
        self.selection_end = caret;
    }

    fn len(&self) -> usize {
        self.text.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.text
            .char_indices()
            .nth(chars)
            .map_or(self.text.len(), |(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_at_caret() {
        let mut input = ExpressionInput::new();
        input.set_text("1+3");
        input.set_caret(2);
        input.insert("2*");
        assert_eq!(input.text(), "1+2*3");
        assert_eq!(input.caret(), 4);
    }

    #[test]
    fn test_function_key_places_caret_inside_parens() {
        let mut input = ExpressionInput::new();
        input.insert("sin()");
        assert_eq!(input.text(), "sin()");
        assert_eq!(input.caret(), 4);
        input.insert("x");
        assert_eq!(input.text(), "sin(x)");
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut input = ExpressionInput::new();
        input.set_text("2+2");
        input.select(3, 2);
        assert_eq!(input.selection(), (2, 3));
        input.insert("√9");
        assert_eq!(input.text(), "2+√9");
        assert_eq!(input.selection(), (4, 4));

        input.select(1, 99);
        assert_eq!(input.selection(), (1, 4));
    }

    #[test]
    fn test_multibyte_positions() {
        let mut input = ExpressionInput::new();
        input.set_text("√9");
        input.insert("+1");
        assert_eq!(input.text(), "√9+1");
        input.set_caret(1);
        input.insert("(");
        assert_eq!(input.text(), "√(9+1");
    }

    #[test]
    fn test_key_values() {
        assert_eq!(InputKey::from_value("="), InputKey::Equals);
        assert_eq!(InputKey::from_value("C"), InputKey::Clear);
        assert_eq!(
            InputKey::from_value("sqrt()"),
            InputKey::Text("sqrt()".to_string())
        );
        assert!(SCIENTIFIC_KEYS.iter().any(|k| k.value == "sqrt()"));
        assert!(NUMERIC_KEYS.iter().any(|k| k.value == "="));
    }
}
