//! Keypad accumulator for the basic and scientific calculators.
//!
//! State lives in [`AccumulatorState`]; every key press is a pure
//! transition `apply(&state, event) -> state`. Arithmetic failures never
//! escape as errors. They latch the `"Error"` display sentinel, and only
//! [`KeypadEvent::Clear`] releases it.

use std::f64::consts::PI;

/// Display text shown after division by zero or a domain violation.
pub const ERROR_SENTINEL: &str = "Error";

/// Binary operators that can be pending between two operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
    /// Scientific keypad only.
    Pow,
}

impl Operator {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "+" => Some(Self::Add),
            "-" => Some(Self::Sub),
            "*" | "×" => Some(Self::Mul),
            "/" | "÷" => Some(Self::Div),
            "^" => Some(Self::Pow),
            _ => None,
        }
    }
}

/// One-operand functions on the scientific keypad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScientificFn {
    /// Trig functions take degrees.
    Sin,
    Cos,
    Tan,
    /// Base-10 logarithm.
    Log,
    Ln,
    Sqrt,
    Square,
    Pi,
}

/// A discrete key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeypadEvent {
    Digit(u8),
    Decimal,
    Operator(Operator),
    Scientific(ScientificFn),
    Equals,
    Backspace,
    Clear,
}

impl KeypadEvent {
    /// Map a physical keyboard key to a keypad event.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "." => Some(Self::Decimal),
            "Enter" | "=" => Some(Self::Equals),
            "Backspace" => Some(Self::Backspace),
            "Escape" => Some(Self::Clear),
            _ => {
                if let Some(op) = Operator::from_symbol(key) {
                    return Some(Self::Operator(op));
                }
                match key.as_bytes() {
                    [d @ b'0'..=b'9'] => Some(Self::Digit(d - b'0')),
                    _ => None,
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AccumulatorState {
    pub display: String,
    pub first_operand: Option<f64>,
    pub pending_operator: Option<Operator>,
    pub awaiting_second_operand: bool,
}

impl Default for AccumulatorState {
    fn default() -> Self {
        Self {
            display: "0".to_string(),
            first_operand: None,
            pending_operator: None,
            awaiting_second_operand: false,
        }
    }
}

impl AccumulatorState {
    pub fn is_error(&self) -> bool {
        self.display == ERROR_SENTINEL
    }

    /// Compute the state that follows `event`.
    pub fn apply(&self, event: KeypadEvent) -> Self {
        if self.is_error() && event != KeypadEvent::Clear {
            return self.clone();
        }

        let mut next = self.clone();
        match event {
            KeypadEvent::Digit(d) => next.input_digit(d),
            KeypadEvent::Decimal => next.input_decimal(),
            KeypadEvent::Operator(op) => next.perform_operation(op),
            KeypadEvent::Scientific(f) => next.scientific_unary(f),
            KeypadEvent::Equals => next.equals(),
            KeypadEvent::Backspace => next.backspace(),
            KeypadEvent::Clear => next = Self::default(),
        }
        next
    }

    fn input_digit(&mut self, digit: u8) {
        let digit = char::from(b'0' + digit.min(9));
        if self.awaiting_second_operand {
            self.display = digit.to_string();
            self.awaiting_second_operand = false;
        } else if self.display == "0" {
            self.display = digit.to_string();
        } else {
            self.display.push(digit);
        }
    }

    fn input_decimal(&mut self) {
        if self.awaiting_second_operand {
            self.display = "0.".to_string();
            self.awaiting_second_operand = false;
        } else if !self.display.contains('.') {
            self.display.push('.');
        }
    }

    fn perform_operation(&mut self, op: Operator) {
        let input = self.parsed_display();

        match (self.first_operand, self.pending_operator) {
            (None, _) => self.first_operand = Some(input),
            (Some(first), Some(pending)) => {
                let result = calculate(first, input, pending);
                self.display = display_text(result);
                self.first_operand = result;
            }
            (Some(_), None) => {}
        }

        self.awaiting_second_operand = true;
        self.pending_operator = Some(op);
    }

    fn equals(&mut self) {
        let (Some(first), Some(op)) = (self.first_operand, self.pending_operator) else {
            return;
        };

        let result = calculate(first, self.parsed_display(), op);
        self.display = display_text(result);
        self.first_operand = None;
        self.pending_operator = None;
        self.awaiting_second_operand = false;
    }

    fn scientific_unary(&mut self, f: ScientificFn) {
        let value = self.parsed_display();
        let result = match f {
            ScientificFn::Sin => Some(degrees_to_radians(value).sin()),
            ScientificFn::Cos => Some(degrees_to_radians(value).cos()),
            ScientificFn::Tan => Some(degrees_to_radians(value).tan()),
            ScientificFn::Log => (value > 0.0).then(|| value.log10()),
            ScientificFn::Ln => (value > 0.0).then(|| value.ln()),
            ScientificFn::Sqrt => (value >= 0.0).then(|| value.sqrt()),
            ScientificFn::Square => Some(value.powi(2)),
            ScientificFn::Pi => Some(PI),
        };

        self.display = display_text(result);
        self.awaiting_second_operand = true;
    }

    fn backspace(&mut self) {
        if self.display.chars().count() > 1 {
            self.display.pop();
        } else {
            self.display = "0".to_string();
        }
    }

    /// Parse the display the way a lenient float reader would: `"0."` is 0,
    /// unparseable text is NaN.
    fn parsed_display(&self) -> f64 {
        self.display.parse().unwrap_or(f64::NAN)
    }
}

fn degrees_to_radians(degrees: f64) -> f64 {
    (degrees * PI) / 180.0
}

/// Apply a binary operator. `None` means the result is the error sentinel.
pub fn calculate(a: f64, b: f64, op: Operator) -> Option<f64> {
    match op {
        Operator::Add => Some(a + b),
        Operator::Sub => Some(a - b),
        Operator::Mul => Some(a * b),
        Operator::Div if b == 0.0 => None,
        Operator::Div => Some(a / b),
        Operator::Pow => Some(a.powf(b)),
    }
}

fn display_text(result: Option<f64>) -> String {
    result.map_or_else(|| ERROR_SENTINEL.to_string(), number_text)
}

/// Shortest text that reads back as `value`.
pub fn number_text(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let text = format!("{:e}", value);
        return match text.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => text,
        };
    }

    format!("{}", value)
}

/// Which keypad a [`Keypad`] emulates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Variant {
    #[default]
    Basic,
    Scientific,
}

impl Variant {
    fn supports(self, event: KeypadEvent) -> bool {
        match self {
            Self::Scientific => true,
            Self::Basic => !matches!(
                event,
                KeypadEvent::Operator(Operator::Pow)
                    | KeypadEvent::Scientific(_)
                    | KeypadEvent::Backspace
            ),
        }
    }
}

/// A mounted calculator: one variant plus its current state.
#[derive(Clone, Debug, Default)]
pub struct Keypad {
    variant: Variant,
    state: AccumulatorState,
}

impl Keypad {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            state: AccumulatorState::default(),
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn state(&self) -> &AccumulatorState {
        &self.state
    }

    pub fn display(&self) -> &str {
        &self.state.display
    }

    /// Feed one event. Events the variant has no key for are ignored.
    pub fn press(&mut self, event: KeypadEvent) -> &str {
        if self.variant.supports(event) {
            self.state = self.state.apply(event);
        }
        self.display()
    }

    pub fn press_all(&mut self, events: impl IntoIterator<Item = KeypadEvent>) -> &str {
        for event in events {
            if self.variant.supports(event) {
                self.state = self.state.apply(event);
            }
        }
        self.display()
    }
}
