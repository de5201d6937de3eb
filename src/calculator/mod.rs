//! Calculator core.
//!
//! This module provides functionality to:
//! - Accumulate keypad presses into results (basic and scientific keypads)
//! - Classify and evaluate free-text input using fasteval
//! - Sample functions of `x` for plotting
//! - Edit input through an on-screen keypad

mod accumulator;
mod detection;
mod engine;
mod evaluation;
mod graph;
mod input;
mod session;

pub use accumulator::{
    AccumulatorState, ERROR_SENTINEL, Keypad, KeypadEvent, Operator, ScientificFn, Variant,
    calculate, number_text,
};
pub use detection::{
    GRAPH_VARIABLE, NormalizedInput, VariableMatch, easter_egg, looks_graphable, normalize,
};
pub use engine::{CompiledExpr, FUNCTION_NAMES, MathEngine, Scope, Value, format_value};
pub use evaluation::{Celebration, Evaluator, GRAPH_MARKER, Outcome};
pub use graph::{MIN_POINTS, Plot, PlotPoint, X_MAX, X_MIN, X_STEP, sample};
pub use input::{ExpressionInput, InputKey, KeyDef, NUMERIC_KEYS, SCIENTIFIC_KEYS, SUGGESTIONS};
pub use session::FreeTextCalculator;
