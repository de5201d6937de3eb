//! Free-text calculator driven by typed text or the on-screen keypad.

use super::evaluation::{Evaluator, Outcome};
use super::graph::Plot;
use super::input::{ExpressionInput, InputKey};
use crate::store::KeyValueStore;

pub struct FreeTextCalculator<S> {
    evaluator: Evaluator<S>,
    input: ExpressionInput,
    last: Option<Outcome>,
}

impl<S: KeyValueStore> FreeTextCalculator<S> {
    pub fn new(evaluator: Evaluator<S>) -> Self {
        Self {
            evaluator,
            input: ExpressionInput::new(),
            last: None,
        }
    }

    pub fn input(&self) -> &ExpressionInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut ExpressionInput {
        &mut self.input
    }

    /// The outcome currently on screen.
    pub fn result(&self) -> Option<&Outcome> {
        self.last.as_ref()
    }

    pub fn plot(&self) -> Option<&Plot> {
        self.last.as_ref().and_then(Outcome::plot)
    }

    pub fn evaluator(&self) -> &Evaluator<S> {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut Evaluator<S> {
        &mut self.evaluator
    }

    /// Handle one on-screen key. Returns the new outcome when the key submitted.
    pub fn press(&mut self, key: InputKey) -> Option<&Outcome> {
        match key {
            InputKey::Text(text) => {
                self.input.insert(&text);
                None
            }
            InputKey::Clear => {
                self.clear();
                None
            }
            InputKey::Equals => Some(self.submit()),
        }
    }

    /// Evaluate the current input. Input that produced an answer is cleared;
    /// input that failed stays for editing.
    pub fn submit(&mut self) -> &Outcome {
        let outcome = self.evaluator.submit(self.input.text());
        if outcome.is_recorded() {
            self.input.clear();
        }
        self.last.insert(outcome)
    }

    /// Replace the input with a suggestion and submit it.
    pub fn select_suggestion(&mut self, suggestion: &str) -> &Outcome {
        self.input.set_text(suggestion);
        self.submit()
    }

    /// Wipe the input and any result or graph on screen.
    pub fn clear(&mut self) {
        self.input.clear();
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::SUGGESTIONS;
    use crate::store::MemoryStore;

    fn calculator() -> FreeTextCalculator<MemoryStore> {
        FreeTextCalculator::new(Evaluator::new(MemoryStore::new()))
    }

    fn press_all(calc: &mut FreeTextCalculator<MemoryStore>, keys: &[&str]) {
        for key in keys {
            calc.press(InputKey::from_value(key));
        }
    }

    #[test]
    fn test_keypad_builds_and_submits() {
        let mut calc = calculator();
        press_all(&mut calc, &["sqrt()", "9", ")"]);
        // caret sat inside the parens, so ")" lands before the closing one
        assert_eq!(calc.input().text(), "sqrt(9))");

        calc.clear();
        press_all(&mut calc, &["sqrt()", "9"]);
        assert_eq!(calc.input().text(), "sqrt(9)");

        let outcome = calc.press(InputKey::Equals).unwrap();
        assert_eq!(outcome.display(), "3");
        assert_eq!(calc.input().text(), "");
    }

    #[test]
    fn test_equals_matches_direct_submit() {
        let mut calc = calculator();
        press_all(&mut calc, &["2", "^", "8"]);
        calc.press(InputKey::Equals);
        let keyed = calc.result().unwrap().display();

        let mut direct = calculator();
        direct.input_mut().set_text("2^8");
        assert_eq!(direct.submit().display(), keyed);
    }

    #[test]
    fn test_clear_key_wipes_graph() {
        let mut calc = calculator();
        calc.input_mut().set_text("x^2");
        calc.submit();
        assert!(calc.plot().is_some());

        calc.press(InputKey::Clear);
        assert!(calc.plot().is_none());
        assert!(calc.result().is_none());
        assert_eq!(calc.input().text(), "");
    }

    #[test]
    fn test_failed_input_kept_for_editing() {
        let mut calc = calculator();
        calc.input_mut().set_text("2 +");
        calc.submit();
        assert_eq!(calc.input().text(), "2 +");
    }

    #[test]
    fn test_suggestion_submits() {
        let mut calc = calculator();
        let outcome = calc.select_suggestion("sqrt(144) + 2^3");
        assert_eq!(outcome.display(), "20");
    }

    #[test]
    fn test_unit_and_date_suggestions_report_errors() {
        // only the arithmetic chip is understood by the engine
        let mut calc = calculator();
        for suggestion in &SUGGESTIONS[1..] {
            let outcome = calc.select_suggestion(suggestion);
            assert_eq!(outcome.input(), *suggestion);
            assert!(matches!(outcome, Outcome::Error { .. }), "{suggestion}");
        }
        assert_eq!(calc.input().text(), SUGGESTIONS[SUGGESTIONS.len() - 1]);
        assert!(calc.evaluator().history().is_empty());
    }
}
