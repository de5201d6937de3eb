//! Math engine adapter over fasteval.
//!
//! Parses and compiles an expression once, evaluates it against a scope
//! of named numbers, and formats results at a chosen precision. The
//! namespace adds a few constants and one-argument functions that
//! fasteval does not ship as builtins (`pi`, `e`, `sqrt`, `ln`, ...).

use std::collections::BTreeMap;
use std::f64::consts::{E, PI, TAU};

use fasteval::{Compiler, Evaler, Instruction, Parser, Slab};

use crate::error::{CalcError, Result};

/// Variable bindings for a single evaluation.
pub type Scope = BTreeMap<String, f64>;

/// Function names the engine understands when called with arguments.
pub const FUNCTION_NAMES: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "sinh", "cosh", "tanh", "asinh", "acosh", "atanh",
    "sqrt", "cbrt", "abs", "ceil", "floor", "round", "int", "sign", "log", "ln", "exp", "min", "max",
];

/// Result of evaluating an expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    /// A bare function name with no arguments applied.
    Function(String),
}

/// Stateless front door to the expression parser.
pub struct MathEngine {
    parser: Parser,
}

impl Default for MathEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MathEngine {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Parse and compile `text`.
    pub fn parse(&self, text: &str) -> Result<CompiledExpr> {
        let text = text.trim();

        if is_function_name(text) {
            return Ok(CompiledExpr {
                body: Body::Function(text.to_string()),
            });
        }

        let mut slab = Slab::new();
        let instruction = self
            .parser
            .parse(text, &mut slab.ps)
            .map_err(|e| CalcError::parse(describe(&e)))?
            .from(&slab.ps)
            .compile(&slab.ps, &mut slab.cs);

        Ok(CompiledExpr {
            body: Body::Compiled {
                slab: Box::new(slab),
                instruction,
            },
        })
    }

    /// Parse `text` and evaluate it once against `scope`.
    pub fn evaluate(&self, text: &str, scope: &Scope) -> Result<Value> {
        self.parse(text)?.evaluate(scope)
    }
}

enum Body {
    Function(String),
    Compiled {
        slab: Box<Slab>,
        instruction: Instruction,
    },
}

/// A parsed expression that can be evaluated repeatedly with different scopes.
pub struct CompiledExpr {
    body: Body,
}

impl CompiledExpr {
    pub fn evaluate(&self, scope: &Scope) -> Result<Value> {
        match &self.body {
            Body::Function(name) => Ok(Value::Function(name.clone())),
            Body::Compiled { slab, instruction } => {
                let mut namespace =
                    |name: &str, args: Vec<f64>| -> Option<f64> { lookup(scope, name, &args) };
                instruction
                    .eval(slab, &mut namespace)
                    .map(Value::Number)
                    .map_err(|e| CalcError::eval(describe(&e)))
            }
        }
    }
}

/// Readable text for the parser and evaluator errors users actually hit.
fn describe(error: &fasteval::Error) -> String {
    use fasteval::Error;

    match error {
        Error::Undefined(name) => format!("Undefined symbol {name}"),
        Error::UnparsedTokensRemaining(rest) => format!("Unexpected \"{}\"", rest.trim()),
        Error::EOF | Error::EofWhileParsing(_) => "Unexpected end of expression".to_string(),
        Error::WrongArgs(call) => format!("Wrong number of arguments in {call}"),
        Error::InvalidValue => "Invalid value".to_string(),
        other => format!("{:?}", other),
    }
}

fn is_function_name(text: &str) -> bool {
    FUNCTION_NAMES.contains(&text)
}

/// Resolve a variable or non-builtin function call.
fn lookup(scope: &Scope, name: &str, args: &[f64]) -> Option<f64> {
    if args.is_empty()
        && let Some(value) = scope.get(name)
    {
        return Some(*value);
    }

    match (name, args) {
        ("pi", []) => Some(PI),
        ("e", []) => Some(E),
        ("tau", []) => Some(TAU),
        ("sqrt", [v]) => Some(v.sqrt()),
        ("cbrt", [v]) => Some(v.cbrt()),
        ("ln", [v]) => Some(v.ln()),
        ("exp", [v]) => Some(v.exp()),
        _ => None,
    }
}

/// Format a number with `precision` significant digits.
///
/// A precision of 0 keeps every digit needed to round-trip the value.
/// Decimal exponents below -3 or at/above 5 switch to exponential
/// notation (`1.5e+6`).
pub fn format_value(value: f64, precision: u8) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let text = if value.is_sign_positive() {
            "Infinity"
        } else {
            "-Infinity"
        };
        return text.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let scientific = if precision == 0 {
        format!("{:e}", value)
    } else {
        format!("{:.*e}", usize::from(precision - 1), value)
    };
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    let sign = if mantissa.starts_with('-') { "-" } else { "" };
    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let digits = match digits.trim_end_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };

    if !(-3..5).contains(&exponent) {
        let (lead, rest) = digits.split_at(1);
        let mantissa = if rest.is_empty() {
            lead.to_string()
        } else {
            format!("{lead}.{rest}")
        };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exp_sign}{}", exponent.unsigned_abs());
    }

    let body = if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        format!("0.{zeros}{digits}")
    } else {
        let int_len = exponent as usize + 1;
        if digits.len() <= int_len {
            format!("{digits}{}", "0".repeat(int_len - digits.len()))
        } else {
            format!("{}.{}", &digits[..int_len], &digits[int_len..])
        }
    };

    format!("{sign}{body}")
}
