//! User-defined formula library.
//!
//! A formula is a named expression over declared variables, e.g.
//! `Area of a Circle = pi * r^2` with variables `r`. The library is
//! persisted as a whole on every add or remove.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculator::{MathEngine, Scope, Value, format_value};
use crate::error::CalcError;
use crate::store::{FORMULAS_KEY, KeyValueStore, load_json, save_json};

/// Precision used for formula results, independent of the user setting.
pub const FORMULA_PRECISION: u8 = 14;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("Formula name is required")]
    MissingName,

    #[error("Expression is required")]
    MissingExpression,

    #[error("Define at least one variable (comma-separated, e.g., x,y,z)")]
    MissingVariables,

    #[error("'{0}' is not a valid variable name")]
    InvalidVariableName(String),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("No formula at position {0}")]
    NotFound(usize),

    #[error("Variable '{0}' cannot be empty.")]
    EmptyVariable(String),

    #[error("Invalid number for variable '{0}'.")]
    InvalidNumber(String),

    #[error(transparent)]
    Calc(#[from] CalcError),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,
    pub expression: String,
    pub variables: Vec<String>,
}

impl Formula {
    /// Build a formula from form fields; `variables` is a comma-separated list.
    pub fn define(name: &str, expression: &str, variables: &str) -> Result<Self, FormulaError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FormulaError::MissingName);
        }

        let expression = expression.trim();
        if expression.is_empty() {
            return Err(FormulaError::MissingExpression);
        }

        let variables = parse_variables(variables);
        if variables.is_empty() {
            return Err(FormulaError::MissingVariables);
        }
        if let Some(bad) = variables.iter().find(|v| !IDENTIFIER.is_match(v)) {
            return Err(FormulaError::InvalidVariableName(bad.clone()));
        }

        Ok(Self {
            name: name.to_string(),
            expression: expression.to_string(),
            variables,
        })
    }

    /// Evaluate with one raw text value per declared variable.
    ///
    /// Only declared variables are in scope, so an expression that uses
    /// anything else fails to evaluate.
    pub fn evaluate(
        &self,
        engine: &MathEngine,
        inputs: &HashMap<String, String>,
    ) -> Result<String, FormulaError> {
        let mut scope = Scope::new();
        for variable in &self.variables {
            let raw = inputs.get(variable).map(|v| v.trim()).unwrap_or_default();
            if raw.is_empty() {
                return Err(FormulaError::EmptyVariable(variable.clone()));
            }
            let value = raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| FormulaError::InvalidNumber(variable.clone()))?;
            scope.insert(variable.clone(), value);
        }

        match engine.evaluate(&self.expression, &scope)? {
            Value::Number(value) => Ok(format_value(value, FORMULA_PRECISION)),
            Value::Function(_) => Err(CalcError::Incomplete.into()),
        }
    }
}

/// Split a comma-separated declaration, trimming and dropping empties.
pub fn parse_variables(declaration: &str) -> Vec<String> {
    declaration
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Ordered, persisted list of formulas.
pub struct FormulaLibrary<S> {
    store: S,
    engine: MathEngine,
    formulas: Vec<Formula>,
}

impl<S: KeyValueStore> FormulaLibrary<S> {
    pub fn load(store: S) -> Self {
        let formulas = load_json(&store, FORMULAS_KEY).unwrap_or_default();
        Self {
            store,
            engine: MathEngine::new(),
            formulas,
        }
    }

    pub fn formulas(&self) -> &[Formula] {
        &self.formulas
    }

    pub fn get(&self, index: usize) -> Option<&Formula> {
        self.formulas.get(index)
    }

    /// Append a formula whose expression parses.
    pub fn add(&mut self, formula: Formula) -> Result<(), FormulaError> {
        self.engine
            .parse(&formula.expression)
            .map_err(|e| FormulaError::InvalidExpression(e.to_string()))?;

        debug!(name = %formula.name, "adding formula");
        self.formulas.push(formula);
        self.persist();
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Formula, FormulaError> {
        if index >= self.formulas.len() {
            return Err(FormulaError::NotFound(index));
        }
        let removed = self.formulas.remove(index);
        self.persist();
        Ok(removed)
    }

    pub fn evaluate(
        &self,
        index: usize,
        inputs: &HashMap<String, String>,
    ) -> Result<String, FormulaError> {
        let formula = self.get(index).ok_or(FormulaError::NotFound(index))?;
        formula.evaluate(&self.engine, inputs)
    }

    fn persist(&self) {
        save_json(&self.store, FORMULAS_KEY, &self.formulas);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn inputs(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_define_splits_variables() {
        let formula = Formula::define("Box", "l * w * h", " l, w ,,h ").unwrap();
        assert_eq!(formula.variables, vec!["l", "w", "h"]);
    }

    #[test]
    fn test_define_validation() {
        assert_eq!(Formula::define(" ", "x", "x"), Err(FormulaError::MissingName));
        assert_eq!(Formula::define("n", "", "x"), Err(FormulaError::MissingExpression));
        assert_eq!(Formula::define("n", "x", " , "), Err(FormulaError::MissingVariables));
        assert_eq!(
            Formula::define("n", "x", "x, 2y"),
            Err(FormulaError::InvalidVariableName("2y".to_string()))
        );
    }

    #[test]
    fn test_evaluate_circle_area() {
        let formula = Formula::define("Area of a Circle", "pi * r^2", "r").unwrap();
        let result = formula
            .evaluate(&MathEngine::new(), &inputs(&[("r", "2")]))
            .unwrap();
        assert_eq!(result, "12.566370614359");
    }

    #[test]
    fn test_evaluate_input_errors() {
        let engine = MathEngine::new();
        let formula = Formula::define("Sum", "a + b", "a, b").unwrap();

        let err = formula.evaluate(&engine, &inputs(&[("a", "1")])).unwrap_err();
        assert_eq!(err.to_string(), "Variable 'b' cannot be empty.");

        let err = formula
            .evaluate(&engine, &inputs(&[("a", "1"), ("b", "two")]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid number for variable 'b'.");
    }

    #[test]
    fn test_non_finite_inputs_rejected() {
        let engine = MathEngine::new();
        let formula = Formula::define("Double", "2 * v", "v").unwrap();

        for raw in ["nan", "NaN", "inf", "-infinity"] {
            let result = formula.evaluate(&engine, &inputs(&[("v", raw)]));
            assert_eq!(result, Err(FormulaError::InvalidNumber("v".to_string())), "{raw}");
        }
    }

    #[test]
    fn test_undeclared_variable_fails() {
        let formula = Formula::define("Bad", "a + z", "a").unwrap();
        let result = formula.evaluate(&MathEngine::new(), &inputs(&[("a", "1")]));
        assert!(matches!(result, Err(FormulaError::Calc(CalcError::Eval(_)))));
    }

    #[test]
    fn test_library_add_remove_persisted() {
        let backing = Arc::new(MemoryStore::new());
        let mut library = FormulaLibrary::load(Arc::clone(&backing));
        library
            .add(Formula::define("Double", "2 * n", "n").unwrap())
            .unwrap();
        library
            .add(Formula::define("Square", "n^2", "n").unwrap())
            .unwrap();

        let reloaded = FormulaLibrary::load(Arc::clone(&backing));
        assert_eq!(reloaded.formulas().len(), 2);
        assert_eq!(reloaded.evaluate(1, &inputs(&[("n", "3")])).unwrap(), "9");

        let removed = library.remove(0).unwrap();
        assert_eq!(removed.name, "Double");
        assert_eq!(FormulaLibrary::load(backing).formulas()[0].name, "Square");
    }

    #[test]
    fn test_library_rejects_unparseable() {
        let mut library = FormulaLibrary::load(MemoryStore::new());
        let result = library.add(Formula::define("Broken", "2 +* n", "n").unwrap());
        assert!(matches!(result, Err(FormulaError::InvalidExpression(_))));
        assert!(library.formulas().is_empty());
        assert_eq!(library.remove(0), Err(FormulaError::NotFound(0)));
    }
}
