//! Parameter expressions for gate angles and phases.
//!
//! Constant subexpressions are folded by [`ParameterExpression::simplify`];
//! anything that still mentions a [`ParameterExpression::Symbol`] stays
//! symbolic and is carried through conversions untouched.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::f64::consts::PI;
use std::fmt;

/// Built-in scalar functions allowed inside parameter expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathFunction {
    Sin,
    Cos,
    Tan,
    Arcsin,
    Arccos,
    Arctan,
    Exp,
    Ln,
    Sqrt,
}

impl MathFunction {
    /// Look up a function by its OpenQASM name.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => MathFunction::Sin,
            "cos" => MathFunction::Cos,
            "tan" => MathFunction::Tan,
            "arcsin" | "asin" => MathFunction::Arcsin,
            "arccos" | "acos" => MathFunction::Arccos,
            "arctan" | "atan" => MathFunction::Arctan,
            "exp" => MathFunction::Exp,
            "ln" => MathFunction::Ln,
            "sqrt" => MathFunction::Sqrt,
            _ => return None,
        })
    }

    /// The OpenQASM spelling.
    pub fn name(self) -> &'static str {
        match self {
            MathFunction::Sin => "sin",
            MathFunction::Cos => "cos",
            MathFunction::Tan => "tan",
            MathFunction::Arcsin => "arcsin",
            MathFunction::Arccos => "arccos",
            MathFunction::Arctan => "arctan",
            MathFunction::Exp => "exp",
            MathFunction::Ln => "ln",
            MathFunction::Sqrt => "sqrt",
        }
    }

    /// Evaluate the function. Returns `None` outside the real domain.
    pub fn apply(self, x: f64) -> Option<f64> {
        let value = match self {
            MathFunction::Sin => x.sin(),
            MathFunction::Cos => x.cos(),
            MathFunction::Tan => x.tan(),
            MathFunction::Arcsin => x.asin(),
            MathFunction::Arccos => x.acos(),
            MathFunction::Arctan => x.atan(),
            MathFunction::Exp => x.exp(),
            MathFunction::Ln => x.ln(),
            MathFunction::Sqrt => x.sqrt(),
        };
        value.is_finite().then_some(value)
    }
}

/// A symbolic or concrete parameter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParameterExpression {
    /// A constant numeric value.
    Constant(f64),
    /// A free symbolic parameter.
    Symbol(String),
    /// The constant π.
    Pi,
    /// Negation.
    Neg(Box<ParameterExpression>),
    /// Addition.
    Add(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Subtraction.
    Sub(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Multiplication.
    Mul(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Division.
    Div(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Exponentiation.
    Pow(Box<ParameterExpression>, Box<ParameterExpression>),
    /// Built-in function call.
    Function(MathFunction, Box<ParameterExpression>),
}

impl ParameterExpression {
    /// Create a constant parameter.
    pub fn constant(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }

    /// Create a symbolic parameter.
    pub fn symbol(name: impl Into<String>) -> Self {
        ParameterExpression::Symbol(name.into())
    }

    /// Create a π constant.
    pub fn pi() -> Self {
        ParameterExpression::Pi
    }

    /// Apply a built-in function, folding constants eagerly.
    pub fn function(func: MathFunction, arg: ParameterExpression) -> Self {
        match arg.as_f64().and_then(|v| func.apply(v)) {
            Some(v) => ParameterExpression::Constant(v),
            None => ParameterExpression::Function(func, Box::new(arg)),
        }
    }

    /// Check if this expression contains any symbols.
    pub fn is_symbolic(&self) -> bool {
        match self {
            ParameterExpression::Symbol(_) => true,
            ParameterExpression::Constant(_) | ParameterExpression::Pi => false,
            ParameterExpression::Neg(e) | ParameterExpression::Function(_, e) => e.is_symbolic(),
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b)
            | ParameterExpression::Pow(a, b) => a.is_symbolic() || b.is_symbolic(),
        }
    }

    /// Try to evaluate as a concrete f64 value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterExpression::Constant(v) => Some(*v),
            ParameterExpression::Symbol(_) => None,
            ParameterExpression::Pi => Some(PI),
            ParameterExpression::Neg(e) => e.as_f64().map(|v| -v),
            ParameterExpression::Add(a, b) => Some(a.as_f64()? + b.as_f64()?),
            ParameterExpression::Sub(a, b) => Some(a.as_f64()? - b.as_f64()?),
            ParameterExpression::Mul(a, b) => Some(a.as_f64()? * b.as_f64()?),
            ParameterExpression::Div(a, b) => {
                let divisor = b.as_f64()?;
                if divisor == 0.0 {
                    return None;
                }
                Some(a.as_f64()? / divisor)
            }
            ParameterExpression::Pow(a, b) => {
                let value = a.as_f64()?.powf(b.as_f64()?);
                value.is_finite().then_some(value)
            }
            ParameterExpression::Function(func, e) => func.apply(e.as_f64()?),
        }
    }

    /// Get all symbol names in this expression, sorted.
    pub fn symbols(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        self.collect_symbols(&mut set);
        set
    }

    fn collect_symbols(&self, set: &mut BTreeSet<String>) {
        match self {
            ParameterExpression::Constant(_) | ParameterExpression::Pi => {}
            ParameterExpression::Symbol(name) => {
                set.insert(name.clone());
            }
            ParameterExpression::Neg(e) | ParameterExpression::Function(_, e) => {
                e.collect_symbols(set);
            }
            ParameterExpression::Add(a, b)
            | ParameterExpression::Sub(a, b)
            | ParameterExpression::Mul(a, b)
            | ParameterExpression::Div(a, b)
            | ParameterExpression::Pow(a, b) => {
                a.collect_symbols(set);
                b.collect_symbols(set);
            }
        }
    }

    /// Bind a symbol to a value, returning a new expression.
    pub fn bind(&self, name: &str, value: f64) -> Self {
        let bind = |e: &ParameterExpression| Box::new(e.bind(name, value));
        match self {
            ParameterExpression::Symbol(n) if n == name => ParameterExpression::Constant(value),
            ParameterExpression::Constant(_)
            | ParameterExpression::Pi
            | ParameterExpression::Symbol(_) => self.clone(),
            ParameterExpression::Neg(e) => ParameterExpression::Neg(bind(e)),
            ParameterExpression::Function(func, e) => ParameterExpression::Function(*func, bind(e)),
            ParameterExpression::Add(a, b) => ParameterExpression::Add(bind(a), bind(b)),
            ParameterExpression::Sub(a, b) => ParameterExpression::Sub(bind(a), bind(b)),
            ParameterExpression::Mul(a, b) => ParameterExpression::Mul(bind(a), bind(b)),
            ParameterExpression::Div(a, b) => ParameterExpression::Div(bind(a), bind(b)),
            ParameterExpression::Pow(a, b) => ParameterExpression::Pow(bind(a), bind(b)),
        }
    }

    /// Simplify the expression by evaluating constant subexpressions.
    pub fn simplify(&self) -> Self {
        if let Some(v) = self.as_f64() {
            return ParameterExpression::Constant(v);
        }
        let fold = |a: &ParameterExpression,
                    b: &ParameterExpression,
                    make: fn(Box<Self>, Box<Self>) -> Self| {
            let node = make(Box::new(a.simplify()), Box::new(b.simplify()));
            match node.as_f64() {
                Some(v) => ParameterExpression::Constant(v),
                None => node,
            }
        };
        match self {
            ParameterExpression::Neg(e) => {
                let e = e.simplify();
                match e.as_f64() {
                    Some(v) => ParameterExpression::Constant(-v),
                    None => ParameterExpression::Neg(Box::new(e)),
                }
            }
            ParameterExpression::Function(func, e) => Self::function(*func, e.simplify()),
            ParameterExpression::Add(a, b) => fold(a, b, ParameterExpression::Add),
            ParameterExpression::Sub(a, b) => fold(a, b, ParameterExpression::Sub),
            ParameterExpression::Mul(a, b) => fold(a, b, ParameterExpression::Mul),
            ParameterExpression::Div(a, b) => fold(a, b, ParameterExpression::Div),
            ParameterExpression::Pow(a, b) => fold(a, b, ParameterExpression::Pow),
            _ => self.clone(),
        }
    }

    /// Multiply by a constant factor, folding when the expression is concrete.
    pub fn scaled(&self, factor: f64) -> Self {
        match self.as_f64() {
            Some(v) => ParameterExpression::Constant(v * factor),
            None => ParameterExpression::Mul(
                Box::new(ParameterExpression::Constant(factor)),
                Box::new(self.clone()),
            ),
        }
    }

    /// Add a constant offset, folding when the expression is concrete.
    pub fn offset(&self, delta: f64) -> Self {
        match self.as_f64() {
            Some(v) => ParameterExpression::Constant(v + delta),
            None => ParameterExpression::Add(
                Box::new(self.clone()),
                Box::new(ParameterExpression::Constant(delta)),
            ),
        }
    }

    /// Arithmetic negation, folding when the expression is concrete.
    pub fn negated(&self) -> Self {
        match self {
            ParameterExpression::Neg(inner) => (**inner).clone(),
            _ => match self.as_f64() {
                Some(v) => ParameterExpression::Constant(-v),
                None => ParameterExpression::Neg(Box::new(self.clone())),
            },
        }
    }
}

/// Renders OpenQASM-compatible syntax (`pi`, `**`, function calls).
impl fmt::Display for ParameterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterExpression::Constant(v) => write!(f, "{v}"),
            ParameterExpression::Symbol(name) => write!(f, "{name}"),
            ParameterExpression::Pi => write!(f, "pi"),
            ParameterExpression::Neg(e) => write!(f, "-({e})"),
            ParameterExpression::Add(a, b) => write!(f, "({a} + {b})"),
            ParameterExpression::Sub(a, b) => write!(f, "({a} - {b})"),
            ParameterExpression::Mul(a, b) => write!(f, "({a} * {b})"),
            ParameterExpression::Div(a, b) => write!(f, "({a} / {b})"),
            ParameterExpression::Pow(a, b) => write!(f, "({a} ** {b})"),
            ParameterExpression::Function(func, e) => write!(f, "{}({e})", func.name()),
        }
    }
}

impl From<f64> for ParameterExpression {
    fn from(value: f64) -> Self {
        ParameterExpression::Constant(value)
    }
}

impl From<i32> for ParameterExpression {
    fn from(value: i32) -> Self {
        ParameterExpression::Constant(f64::from(value))
    }
}

impl std::ops::Add for ParameterExpression {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        ParameterExpression::Add(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Sub for ParameterExpression {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        ParameterExpression::Sub(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Mul for ParameterExpression {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        ParameterExpression::Mul(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Div for ParameterExpression {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        ParameterExpression::Div(Box::new(self), Box::new(rhs))
    }
}

impl std::ops::Neg for ParameterExpression {
    type Output = Self;

    fn neg(self) -> Self::Output {
        ParameterExpression::Neg(Box::new(self))
    }
}
