//! Abstract Syntax Tree for `OpenQASM` 2 and 3.
//!
//! Both language versions parse into the same tree. QASM2 `qreg`/`creg`
//! declarations become [`Statement::QubitDecl`]/[`Statement::BitDecl`]
//! and `measure a -> b;` becomes [`Statement::Measure`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// A complete QASM program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Version from the `OPENQASM` header (e.g. "3.0"), if present.
    pub version: Option<String>,
    /// Statements in the program.
    pub statements: Vec<Statement>,
}

impl Program {
    /// Major language version, if the header was present.
    pub fn major_version(&self) -> Option<u32> {
        self.version
            .as_deref()
            .and_then(|v| v.split('.').next())
            .and_then(|major| major.parse().ok())
    }
}

/// Scalar classical types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarType {
    Int,
    Uint,
    Float,
    Angle,
    Bool,
    Bit,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Int => "int",
            ScalarType::Uint => "uint",
            ScalarType::Float => "float",
            ScalarType::Angle => "angle",
            ScalarType::Bool => "bool",
            ScalarType::Bit => "bit",
        };
        f.write_str(name)
    }
}

/// A statement in a QASM program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Include statement.
    Include(String),

    /// Qubit declaration: `qubit[n] name;`, `qubit name;` or `qreg name[n];`
    QubitDecl {
        name: String,
        size: Option<Expression>,
    },

    /// Classical bit declaration: `bit[n] name;` or `creg name[n];`,
    /// optionally initialised by `= measure q`.
    BitDecl {
        name: String,
        size: Option<Expression>,
        measure: Option<Vec<QubitRef>>,
    },

    /// Classical scalar declaration: `const int n = 3;`, `float x;`
    ClassicalDecl {
        ty: ScalarType,
        designator: Option<Expression>,
        name: String,
        value: Option<Expression>,
        is_const: bool,
    },

    /// `input float theta;`
    InputDecl {
        ty: ScalarType,
        designator: Option<Expression>,
        name: String,
    },

    /// `output bit c;`
    OutputDecl {
        ty: ScalarType,
        designator: Option<Expression>,
        name: String,
    },

    /// Gate application.
    Gate(GateCall),

    /// Measurement: `measure q -> c;`, `c = measure q;` or `measure q;`
    Measure {
        qubits: Vec<QubitRef>,
        bits: Vec<BitRef>,
    },

    /// Reset: `reset q;`
    Reset { qubits: Vec<QubitRef> },

    /// Barrier: `barrier q;` (empty means all qubits)
    Barrier { qubits: Vec<QubitRef> },

    /// Delay: `delay[duration] q;`
    Delay {
        duration: Expression,
        qubits: Vec<QubitRef>,
    },

    /// If statement.
    If {
        condition: Expression,
        then_body: Vec<Statement>,
        else_body: Option<Vec<Statement>>,
    },

    /// For loop.
    For {
        variable: String,
        ty: Option<ScalarType>,
        iterable: ForIterable,
        body: Vec<Statement>,
    },

    /// While loop.
    While {
        condition: Expression,
        body: Vec<Statement>,
    },

    /// Gate definition.
    GateDef {
        name: String,
        params: Vec<String>,
        qubits: Vec<String>,
        body: Vec<Statement>,
    },

    /// Opaque gate declaration.
    OpaqueDef {
        name: String,
        params: Vec<String>,
        qubits: Vec<String>,
    },

    /// Subroutine definition: `def name(qubit a, float x) { ... }`
    SubroutineDef {
        name: String,
        params: Vec<SubroutineParam>,
        return_type: Option<ScalarType>,
        body: Vec<Statement>,
    },

    /// Subroutine call used as a statement: `name(args);`
    Call { name: String, args: Vec<Expression> },

    /// `return;` or `return expr;`
    Return(Option<Expression>),

    /// Classical assignment: `x = expr;`, `x += expr;`, `c[0] = expr;`
    Assignment {
        target: String,
        index: Option<Expression>,
        op: Option<BinOp>,
        value: Expression,
    },
}

/// What a `for` loop iterates over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ForIterable {
    /// `[start:end]` or `[start:step:end]`
    Range(Range),
    /// `{a, b, c}`
    Set(Vec<Expression>),
}

/// A subroutine parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SubroutineParam {
    /// `qubit a` or `qubit[n] a`
    Qubit {
        name: String,
        size: Option<Expression>,
    },
    /// `float x`, `int[32] n`
    Classical {
        ty: ScalarType,
        designator: Option<Expression>,
        name: String,
    },
}

/// A gate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateCall {
    /// Gate name.
    pub name: String,
    /// Gate parameters (angles, etc.).
    pub params: Vec<Expression>,
    /// Qubits the gate acts on.
    pub qubits: Vec<QubitRef>,
    /// Modifiers, outermost first.
    pub modifiers: Vec<GateModifier>,
}

/// Gate modifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateModifier {
    /// Control modifier: `ctrl @ gate` or `ctrl(n) @ gate`
    Ctrl(Option<Expression>),
    /// Negated control: `negctrl @ gate`
    NegCtrl(Option<Expression>),
    /// Inverse: `inv @ gate`
    Inv,
    /// Power: `pow(k) @ gate`
    Pow(Expression),
}

/// Reference to a qubit or qubit register element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QubitRef {
    /// Single qubit: `q` (entire register) or `q[i]` (single element).
    Single {
        register: String,
        index: Option<Expression>,
    },
    /// Slice of a register: `q[start:end]` or `q[start:step:end]`.
    Range { register: String, range: Range },
}

impl QubitRef {
    /// Create a reference to a single qubit.
    pub fn single(register: impl Into<String>, index: i64) -> Self {
        QubitRef::Single {
            register: register.into(),
            index: Some(Expression::Int(index)),
        }
    }

    /// Create a reference to an entire register.
    pub fn register(register: impl Into<String>) -> Self {
        QubitRef::Single {
            register: register.into(),
            index: None,
        }
    }

    /// Get the register name.
    pub fn register_name(&self) -> &str {
        match self {
            QubitRef::Single { register, .. } | QubitRef::Range { register, .. } => register,
        }
    }
}

/// Reference to a classical bit or bit register element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BitRef {
    /// Single bit: `c` or `c[i]`.
    Single {
        register: String,
        index: Option<Expression>,
    },
    /// Slice of a register: `c[start:end]`.
    Range { register: String, range: Range },
}

impl BitRef {
    /// Create a reference to a single bit.
    pub fn single(register: impl Into<String>, index: i64) -> Self {
        BitRef::Single {
            register: register.into(),
            index: Some(Expression::Int(index)),
        }
    }

    /// Create a reference to an entire register.
    pub fn register(register: impl Into<String>) -> Self {
        BitRef::Single {
            register: register.into(),
            index: None,
        }
    }
}

/// An inclusive range `start:step:end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub start: Expression,
    pub step: Option<Expression>,
    pub end: Expression,
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// Boolean literal.
    Bool(bool),
    /// Duration literal such as `100ns`.
    Duration(String),
    /// Identifier.
    Identifier(String),
    /// Pi constant.
    Pi,
    /// Tau constant (2π).
    Tau,
    /// Euler's number.
    Euler,
    /// Arithmetic negation.
    Neg(Box<Expression>),
    /// Logical not.
    Not(Box<Expression>),
    /// Binary operation.
    BinOp {
        left: Box<Expression>,
        op: BinOp,
        right: Box<Expression>,
    },
    /// Function call.
    FnCall { name: String, args: Vec<Expression> },
    /// Index expression: `arr[i]`.
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
    },
    /// Parenthesized expression.
    Paren(Box<Expression>),
}

impl Expression {
    /// Build a binary operation.
    pub fn binary(left: Expression, op: BinOp, right: Expression) -> Self {
        Expression::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Try to evaluate as a constant f64 without any variable bindings.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Expression::Int(v) => Some(*v as f64),
            Expression::Float(v) => Some(*v),
            Expression::Pi => Some(std::f64::consts::PI),
            Expression::Tau => Some(std::f64::consts::TAU),
            Expression::Euler => Some(std::f64::consts::E),
            Expression::Neg(e) => e.as_f64().map(|v| -v),
            Expression::BinOp { left, op, right } => {
                let l = left.as_f64()?;
                let r = right.as_f64()?;
                match op {
                    BinOp::Add => Some(l + r),
                    BinOp::Sub => Some(l - r),
                    BinOp::Mul => Some(l * r),
                    BinOp::Div if r != 0.0 => Some(l / r),
                    BinOp::Pow => Some(l.powf(r)),
                    BinOp::Mod if r != 0.0 => Some(l % r),
                    _ => None,
                }
            }
            Expression::Paren(e) => e.as_f64(),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            Expression::BinOp { op, .. } => op.precedence(),
            Expression::Neg(_) | Expression::Not(_) => BinOp::Pow.precedence(),
            _ => u8::MAX,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Int(v) => write!(f, "{v}"),
            Expression::Float(v) => write!(f, "{v:?}"),
            Expression::Bool(v) => write!(f, "{v}"),
            Expression::Duration(s) | Expression::Identifier(s) => f.write_str(s),
            Expression::Pi => f.write_str("pi"),
            Expression::Tau => f.write_str("tau"),
            Expression::Euler => f.write_str("euler"),
            Expression::Neg(e) => {
                if e.precedence() < u8::MAX {
                    write!(f, "-({e})")
                } else {
                    write!(f, "-{e}")
                }
            }
            Expression::Not(e) => {
                if e.precedence() < u8::MAX {
                    write!(f, "!({e})")
                } else {
                    write!(f, "!{e}")
                }
            }
            Expression::BinOp { left, op, right } => {
                let prec = op.precedence();
                let right_assoc = *op == BinOp::Pow;
                let wrap_left = left.precedence() < prec || (right_assoc && left.precedence() == prec);
                let wrap_right =
                    right.precedence() < prec || (!right_assoc && right.precedence() == prec);
                if wrap_left {
                    write!(f, "({left})")?;
                } else {
                    write!(f, "{left}")?;
                }
                write!(f, " {op} ")?;
                if wrap_right {
                    write!(f, "({right})")
                } else {
                    write!(f, "{right}")
                }
            }
            Expression::FnCall { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expression::Index { target, index } => write!(f, "{target}[{index}]"),
            Expression::Paren(e) => write!(f, "({e})"),
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
}

impl BinOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinOp::Or => 1,
            BinOp::And => 2,
            BinOp::BitOr => 3,
            BinOp::BitXor => 4,
            BinOp::BitAnd => 5,
            BinOp::Eq | BinOp::NotEq => 6,
            BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => 7,
            BinOp::LShift | BinOp::RShift => 8,
            BinOp::Add | BinOp::Sub => 9,
            BinOp::Mul | BinOp::Div | BinOp::Mod => 10,
            BinOp::Pow => 11,
        }
    }

    /// Source spelling.
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "**",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
            BinOp::BitAnd => "&",
            BinOp::BitOr => "|",
            BinOp::BitXor => "^",
            BinOp::LShift => "<<",
            BinOp::RShift => ">>",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.step {
            Some(step) => write!(f, "{}:{}:{}", self.start, step, self.end),
            None => write!(f, "{}:{}", self.start, self.end),
        }
    }
}

impl fmt::Display for QubitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QubitRef::Single {
                register,
                index: None,
            } => f.write_str(register),
            QubitRef::Single {
                register,
                index: Some(index),
            } => write!(f, "{register}[{index}]"),
            QubitRef::Range { register, range } => write!(f, "{register}[{range}]"),
        }
    }
}

impl fmt::Display for BitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitRef::Single {
                register,
                index: None,
            } => f.write_str(register),
            BitRef::Single {
                register,
                index: Some(index),
            } => write!(f, "{register}[{index}]"),
            BitRef::Range { register, range } => write!(f, "{register}[{range}]"),
        }
    }
}

impl fmt::Display for GateModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateModifier::Ctrl(None) => f.write_str("ctrl"),
            GateModifier::Ctrl(Some(n)) => write!(f, "ctrl({n})"),
            GateModifier::NegCtrl(None) => f.write_str("negctrl"),
            GateModifier::NegCtrl(Some(n)) => write!(f, "negctrl({n})"),
            GateModifier::Inv => f.write_str("inv"),
            GateModifier::Pow(k) => write!(f, "pow({k})"),
        }
    }
}
