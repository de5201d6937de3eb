//! Free-text expression evaluation.
//!
//! Classifies input as an easter egg, a graphable function of `x`, or a
//! direct calculation, runs it through the math engine, and records the
//! outcome in the persisted history.

use std::time::{Duration, Instant};

use tracing::debug;

use super::detection::{GRAPH_VARIABLE, VariableMatch, easter_egg, looks_graphable, normalize};
use super::engine::{MathEngine, Scope, Value, format_value};
use super::graph::{self, Plot};
use crate::config::EvaluatorConfig;
use crate::error::CalcError;
use crate::store::{History, HistoryItem, HistoryStore, KeyValueStore, Settings};

/// History result recorded for inputs that produced a graph.
pub const GRAPH_MARKER: &str = "[Graph]";

/// Result of submitting one line of input.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// A fixed reply to a known phrase.
    Canned {
        input: String,
        response: &'static str,
    },
    /// The input was a function of `x`. Sampling may still fail.
    Graph {
        input: String,
        plot: Result<Plot, CalcError>,
    },
    /// Successful calculation.
    Value {
        input: String,
        value: f64,
        /// Formatted at the current precision.
        display: String,
    },
    /// The input named a function without calling it.
    Incomplete { input: String },
    /// Parsing or evaluation failed.
    Error { input: String, error: CalcError },
}

impl Outcome {
    /// Get the input as the user typed it (trimmed).
    pub fn input(&self) -> &str {
        match self {
            Self::Canned { input, .. }
            | Self::Graph { input, .. }
            | Self::Value { input, .. }
            | Self::Incomplete { input }
            | Self::Error { input, .. } => input,
        }
    }

    /// Check if this outcome was written to history.
    pub fn is_recorded(&self) -> bool {
        matches!(
            self,
            Self::Canned { .. } | Self::Graph { .. } | Self::Value { .. }
        )
    }

    /// Get the text to show as the result.
    pub fn display(&self) -> String {
        match self {
            Self::Canned { response, .. } => response.to_string(),
            Self::Graph { plot: Ok(_), .. } => GRAPH_MARKER.to_string(),
            Self::Graph { plot: Err(e), .. } => e.to_string(),
            Self::Value { display, .. } => display.clone(),
            Self::Incomplete { .. } => CalcError::Incomplete.to_string(),
            Self::Error {
                error: CalcError::EmptyInput,
                ..
            } => CalcError::EmptyInput.to_string(),
            Self::Error { error, .. } => format!("Error: {}", error),
        }
    }

    /// Get the plotted series, if sampling succeeded.
    pub fn plot(&self) -> Option<&Plot> {
        match self {
            Self::Graph { plot: Ok(plot), .. } => Some(plot),
            _ => None,
        }
    }
}

/// A one-shot success effect that switches itself off after a fixed time.
#[derive(Clone, Copy, Debug)]
pub struct Celebration {
    started: Instant,
    duration: Duration,
}

impl Celebration {
    fn start(duration: Duration) -> Self {
        Self {
            started: Instant::now(),
            duration,
        }
    }

    pub fn is_active(&self) -> bool {
        self.started.elapsed() < self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.started.elapsed())
    }
}

/// The free-text calculator pipeline.
pub struct Evaluator<S> {
    engine: MathEngine,
    records: HistoryStore<S>,
    variable_match: VariableMatch,
    celebration_duration: Duration,
    celebration: Option<Celebration>,
}

impl<S: KeyValueStore> Evaluator<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &EvaluatorConfig::default())
    }

    pub fn with_config(store: S, config: &EvaluatorConfig) -> Self {
        Self {
            engine: MathEngine::new(),
            records: HistoryStore::load(store),
            variable_match: config.variable_match,
            celebration_duration: Duration::from_millis(config.celebration_ms),
            celebration: None,
        }
    }

    /// Classify and evaluate one line of input.
    pub fn submit(&mut self, text: &str) -> Outcome {
        let input = normalize(text);

        if input.original.is_empty() {
            return Outcome::Error {
                input: input.original,
                error: CalcError::EmptyInput,
            };
        }

        if let Some(response) = easter_egg(&input.lookup_key) {
            debug!(input = %input.original, "matched easter egg");
            self.records
                .record(HistoryItem::new(&input.original, response));
            return Outcome::Canned {
                input: input.original,
                response,
            };
        }

        if looks_graphable(&input.lookup_key, self.variable_match) && self.probe(&input.normalized)
        {
            debug!(input = %input.original, "classified as graph");
            let plot = graph::sample(&self.engine, &input.original, &input.normalized);
            self.records
                .record(HistoryItem::new(&input.original, GRAPH_MARKER));
            return Outcome::Graph {
                input: input.original,
                plot,
            };
        }

        match self.engine.evaluate(&input.normalized, &Scope::new()) {
            Ok(Value::Function(name)) => {
                debug!(input = %input.original, function = %name, "incomplete expression");
                Outcome::Incomplete {
                    input: input.original,
                }
            }
            Ok(Value::Number(value)) => {
                let display = format_value(value, self.records.settings().precision);
                self.records
                    .record(HistoryItem::new(&input.original, &display));
                self.celebration = Some(Celebration::start(self.celebration_duration));
                Outcome::Value {
                    input: input.original,
                    value,
                    display,
                }
            }
            Err(error) => {
                debug!(input = %input.original, %error, "evaluation failed");
                Outcome::Error {
                    input: input.original,
                    error,
                }
            }
        }
    }

    /// Evaluate at `x = 1` to confirm the input really is a function of `x`.
    fn probe(&self, normalized: &str) -> bool {
        let mut scope = Scope::new();
        scope.insert(GRAPH_VARIABLE.to_string(), 1.0);
        matches!(
            self.engine.evaluate(normalized, &scope),
            Ok(Value::Number(_))
        )
    }

    pub fn history(&self) -> &History {
        self.records.history()
    }

    pub fn clear_history(&mut self) {
        self.records.clear();
    }

    pub fn settings(&self) -> Settings {
        self.records.settings()
    }

    pub fn set_precision(&mut self, precision: u8) {
        self.records.set_precision(precision);
    }

    /// The success effect, while it is still running.
    pub fn celebration(&self) -> Option<Celebration> {
        self.celebration.filter(Celebration::is_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{HISTORY_LIMIT, MemoryStore};
    use std::sync::Arc;

    fn evaluator() -> Evaluator<MemoryStore> {
        Evaluator::new(MemoryStore::new())
    }

    #[test]
    fn test_basic_evaluation() {
        let mut calc = evaluator();
        let outcome = calc.submit("2 + 2");
        assert_eq!(outcome.display(), "4");
        assert_eq!(calc.history().latest(), Some(&HistoryItem::new("2 + 2", "4")));

        let celebration = calc.celebration().unwrap();
        assert!(celebration.remaining() > Duration::ZERO);
        assert!(celebration.remaining() <= Duration::from_millis(5000));
    }

    #[test]
    fn test_root_glyph_evaluates() {
        let mut calc = evaluator();
        let outcome = calc.submit("  √16 + 1 ");
        assert_eq!(outcome.display(), "5");
        assert_eq!(outcome.input(), "√16 + 1");
        // History keeps the glyph.
        assert_eq!(calc.history().latest().unwrap().input, "√16 + 1");
    }

    #[test]
    fn test_easter_egg() {
        let mut calc = evaluator();
        let outcome = calc.submit("  Hello ");
        assert_eq!(
            outcome,
            Outcome::Canned {
                input: "Hello".to_string(),
                response: "Hello there!",
            }
        );
        assert_eq!(calc.history().latest(), Some(&HistoryItem::new("Hello", "Hello there!")));
        assert!(calc.celebration().is_none());

        let outcome = calc.submit("hello there");
        assert!(matches!(outcome, Outcome::Error { .. }));
    }

    #[test]
    fn test_graph_classification() {
        let mut calc = evaluator();
        let outcome = calc.submit("sin(x)");
        let plot = outcome.plot().expect("sin(x) should plot");
        assert!(plot.points.len() >= 2);
        assert_eq!(plot.points.first().unwrap().x, -10.0);
        assert_eq!(plot.points.last().unwrap().x, 10.0);
        assert_eq!(calc.history().latest(), Some(&HistoryItem::new("sin(x)", GRAPH_MARKER)));
    }

    #[test]
    fn test_matrix_is_never_graphed() {
        let mut calc = evaluator();
        let outcome = calc.submit("5 matrix x");
        assert!(matches!(outcome, Outcome::Error { .. }));
        assert!(outcome.display().starts_with("Error: "));
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_failed_probe_falls_through() {
        let mut calc = evaluator();
        let outcome = calc.submit("x +* 2");
        assert!(matches!(
            outcome,
            Outcome::Error {
                error: CalcError::Parse(_),
                ..
            }
        ));
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_substring_matching_graphs_longer_names() {
        // `max` contains the letter and evaluates fine at x = 1.
        let mut calc = evaluator();
        assert!(calc.submit("max(3, 7)").plot().is_some());
    }

    #[test]
    fn test_token_matching_skips_probe() {
        let config = EvaluatorConfig {
            variable_match: VariableMatch::Token,
            ..EvaluatorConfig::default()
        };
        let mut calc = Evaluator::with_config(MemoryStore::new(), &config);
        assert_eq!(calc.submit("max(3, 7)").display(), "7");
        assert_eq!(calc.submit("exp(0)").display(), "1");
        assert!(calc.submit("x^2").plot().is_some());
    }

    #[test]
    fn test_graph_with_too_few_points_still_recorded() {
        let mut calc = evaluator();
        let outcome = calc.submit("sqrt(-1 - x*x)");
        assert!(matches!(
            outcome,
            Outcome::Graph {
                plot: Err(CalcError::NotEnoughPoints),
                ..
            }
        ));
        assert_eq!(calc.history().latest().unwrap().result, GRAPH_MARKER);
    }

    #[test]
    fn test_incomplete_expression() {
        let mut calc = evaluator();
        let outcome = calc.submit("sin");
        assert_eq!(outcome.display(), "Please provide a full expression to calculate.");
        assert!(!outcome.is_recorded());
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_parse_error_not_recorded() {
        let mut calc = evaluator();
        let outcome = calc.submit("2 +* 2");
        assert!(matches!(
            outcome,
            Outcome::Error {
                error: CalcError::Parse(_),
                ..
            }
        ));
        assert!(calc.history().is_empty());
        assert!(calc.celebration().is_none());
    }

    #[test]
    fn test_empty_input_rejected() {
        let mut calc = evaluator();
        let outcome = calc.submit("   ");
        assert_eq!(outcome.display(), "Please enter a calculation or question.");
        assert!(calc.history().is_empty());
    }

    #[test]
    fn test_precision_applies() {
        let mut calc = evaluator();
        calc.set_precision(3);
        assert_eq!(calc.submit("2/3").display(), "0.667");
        calc.set_precision(14);
        assert_eq!(calc.submit("2/3").display(), "0.66666666666667");
    }

    #[test]
    fn test_history_never_exceeds_limit() {
        let mut calc = evaluator();
        for i in 0..30 {
            calc.submit(&format!("{i} * 2"));
            assert!(calc.history().len() <= HISTORY_LIMIT);
            assert_eq!(calc.history().latest().unwrap().input, format!("{i} * 2"));
        }
        assert_eq!(calc.history().len(), HISTORY_LIMIT);
    }

    #[test]
    fn test_history_reloaded_from_store() {
        let backing = Arc::new(MemoryStore::new());
        let mut calc = Evaluator::new(Arc::clone(&backing));
        calc.submit("1+1");
        calc.set_precision(6);

        let reloaded = Evaluator::new(backing);
        assert_eq!(reloaded.history().latest(), Some(&HistoryItem::new("1+1", "2")));
        assert_eq!(reloaded.settings().precision, 6);
    }

    #[test]
    fn test_celebration_expires() {
        let config = EvaluatorConfig {
            celebration_ms: 0,
            ..EvaluatorConfig::default()
        };
        let mut calc = Evaluator::with_config(MemoryStore::new(), &config);
        calc.submit("1+1");
        assert!(calc.celebration().is_none());
    }
}
