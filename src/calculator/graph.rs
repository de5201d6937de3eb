//! Plot sampling for single-variable functions.

use serde::Serialize;
use tracing::trace;

use super::detection::GRAPH_VARIABLE;
use super::engine::{MathEngine, Scope, Value};
use crate::error::{CalcError, Result};

/// Left edge of the sampled interval.
pub const X_MIN: f64 = -10.0;
/// Right edge of the sampled interval (inclusive).
pub const X_MAX: f64 = 10.0;
/// Distance between consecutive samples.
pub const X_STEP: f64 = 0.5;
/// Fewest surviving samples that still make a line.
pub const MIN_POINTS: usize = 2;

/// A single sample of the plotted function.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PlotPoint {
    pub x: f64,
    pub y: f64,
}

/// An ordered series of finite samples, ready to be charted.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Plot {
    /// The function as the user wrote it.
    pub expression: String,
    pub points: Vec<PlotPoint>,
}

/// Sample `expression` over `[X_MIN, X_MAX]`.
///
/// Samples that fail to evaluate or come out non-finite are dropped,
/// so functions with domain gaps (`log(x)`, `1/x`) still plot.
pub fn sample(engine: &MathEngine, label: &str, expression: &str) -> Result<Plot> {
    let compiled = engine
        .parse(expression)
        .map_err(|e| CalcError::InvalidFunction(e.to_string()))?;

    let steps = ((X_MAX - X_MIN) / X_STEP).round() as usize;
    let mut scope = Scope::new();
    let mut points = Vec::with_capacity(steps + 1);

    for i in 0..=steps {
        let x = X_MIN + i as f64 * X_STEP;
        scope.insert(GRAPH_VARIABLE.to_string(), x);

        match compiled.evaluate(&scope) {
            Ok(Value::Number(y)) if y.is_finite() => points.push(PlotPoint {
                x,
                y: round_to(y, 4),
            }),
            Ok(other) => trace!(x, ?other, "discarding non-finite sample"),
            Err(e) => trace!(x, error = %e, "discarding failed sample"),
        }
    }

    if points.len() < MIN_POINTS {
        return Err(CalcError::NotEnoughPoints);
    }

    Ok(Plot {
        expression: label.to_string(),
        points,
    })
}

/// Values too large to scale by `10^places` are already integral and
/// come back unchanged.
fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / factor
}
