//! Gate/instruction extraction.
//!
//! Walks a parsed [`Program`] once and produces a flat
//! [`NormalizedProgram`]: custom gates and subroutines are inlined,
//! `for` loops unrolled, classical scalars folded and gate modifiers
//! expanded. Registers are flattened into dense indices in declaration
//! order.

use std::f64::consts::FRAC_PI_2;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use qbridge_ir::normalized::MEASURE;
use qbridge_ir::{
    Gate, MathFunction, NormalizedInstruction, NormalizedProgram, ParameterExpression,
    control_sequence, inverse_sequence, power_sequence,
};

use crate::ast::{
    BinOp, BitRef, Expression, ForIterable, GateCall, GateModifier, Program, QubitRef, Range,
    ScalarType, Statement, SubroutineParam,
};
use crate::error::{ParseError, ParseResult};

/// Includes that name the standard gate libraries.
const STANDARD_INCLUDES: [&str; 2] = ["qelib1.inc", "stdgates.inc"];

/// Maximum nesting of gate and subroutine expansion.
const MAX_DEPTH: usize = 64;

/// Maximum total number of unrolled loop iterations.
const MAX_UNROLLED: usize = 1_000_000;

/// Extract a normalized instruction stream from a parsed program.
pub fn extract(program: &Program) -> ParseResult<NormalizedProgram> {
    let mut extractor = Extractor::new();
    if let Flow::Return = extractor.exec_block(&program.statements)? {
        return Err(unsupported("return outside a subroutine"));
    }

    debug!(
        qubits = extractor.num_qubits,
        clbits = extractor.num_clbits,
        instructions = extractor.instructions.len(),
        "extracted program"
    );

    Ok(NormalizedProgram {
        num_qubits: extractor.num_qubits,
        num_clbits: extractor.num_clbits,
        instructions: extractor.instructions,
    })
}

fn unsupported(what: impl Into<String>) -> ParseError {
    ParseError::UnsupportedConstruct(what.into())
}

/// A classical or qubit value bound to a name.
#[derive(Debug, Clone)]
enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Param(ParameterExpression),
    Qubits(Vec<u32>),
}

impl Value {
    fn from_param(expr: ParameterExpression) -> Self {
        match expr.as_f64() {
            Some(v) if !expr.is_symbolic() => Value::Float(v),
            _ => Value::Param(expr),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            _ => None,
        }
    }

    fn to_param(&self) -> ParseResult<ParameterExpression> {
        match self {
            Value::Param(expr) => Ok(expr.clone()),
            Value::Bool(_) | Value::Qubits(_) => {
                Err(ParseError::Generic("gate parameter must be numeric".into()))
            }
            other => Ok(ParameterExpression::Constant(other.as_f64().unwrap_or_default())),
        }
    }
}

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    ty: Option<ScalarType>,
    is_const: bool,
}

impl Binding {
    fn constant(value: Value) -> Self {
        Self {
            value,
            ty: None,
            is_const: true,
        }
    }
}

type Scope = FxHashMap<String, Binding>;

#[derive(Debug, Clone, Copy)]
struct Register {
    start: u32,
    size: u32,
}

impl Register {
    fn indices(self) -> Vec<u32> {
        (self.start..self.start + self.size).collect()
    }
}

#[derive(Clone, Copy)]
struct GateDef<'a> {
    params: &'a [String],
    qubits: &'a [String],
    body: &'a [Statement],
}

#[derive(Clone, Copy)]
struct Subroutine<'a> {
    params: &'a [SubroutineParam],
    return_type: Option<ScalarType>,
    body: &'a [Statement],
}

enum Flow {
    Continue,
    Return,
}

/// A modifier with its arguments evaluated.
#[derive(Debug, Clone, Copy)]
enum Modifier {
    Inv,
    Pow(f64),
    Ctrl(usize),
    NegCtrl(usize),
}

/// Resolved qubit operand of a gate application.
struct Operand {
    qubits: Vec<u32>,
    broadcast: bool,
}

#[derive(Default)]
struct Extractor<'a> {
    qregs: FxHashMap<String, Register>,
    cregs: FxHashMap<String, Register>,
    num_qubits: u32,
    num_clbits: u32,
    gates: FxHashMap<String, GateDef<'a>>,
    subroutines: FxHashMap<String, Subroutine<'a>>,
    scopes: Vec<Scope>,
    /// Index of the innermost scope visible from an isolated body.
    floor: usize,
    /// Inside a gate or subroutine body: globals other than constants
    /// are not visible.
    isolated: bool,
    depth: usize,
    unrolled: usize,
    instructions: Vec<NormalizedInstruction>,
}

impl<'a> Extractor<'a> {
    fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            ..Self::default()
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn exec_block(&mut self, statements: &'a [Statement]) -> ParseResult<Flow> {
        for statement in statements {
            if let Flow::Return = self.exec(statement)? {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Continue)
    }

    fn exec(&mut self, statement: &'a Statement) -> ParseResult<Flow> {
        match statement {
            Statement::Include(path) => {
                if !STANDARD_INCLUDES.contains(&path.as_str()) {
                    return Err(unsupported(format!("include \"{path}\"")));
                }
            }
            Statement::QubitDecl { name, size } => {
                let size = self.eval_size(size.as_ref())?;
                self.check_undeclared(name)?;
                self.qregs.insert(
                    name.clone(),
                    Register {
                        start: self.num_qubits,
                        size,
                    },
                );
                self.num_qubits += size;
            }
            Statement::BitDecl {
                name,
                size,
                measure,
            } => {
                let size = self.eval_size(size.as_ref())?;
                self.check_undeclared(name)?;
                self.cregs.insert(
                    name.clone(),
                    Register {
                        start: self.num_clbits,
                        size,
                    },
                );
                self.num_clbits += size;
                if let Some(qubits) = measure {
                    self.measure(qubits, &[BitRef::register(name.clone())])?;
                }
            }
            Statement::ClassicalDecl {
                ty,
                name,
                value,
                is_const,
                ..
            } => {
                let value = match value {
                    Some(expr) => coerce(*ty, self.eval(expr)?)?,
                    None => coerce(*ty, Value::Int(0))?,
                };
                self.declare(
                    name,
                    Binding {
                        value,
                        ty: Some(*ty),
                        is_const: *is_const,
                    },
                )?;
            }
            Statement::InputDecl { ty, name, .. } => match ty {
                ScalarType::Float | ScalarType::Angle | ScalarType::Int | ScalarType::Uint => {
                    let symbol = ParameterExpression::symbol(name.clone());
                    self.declare(name, Binding::constant(Value::Param(symbol)))?;
                }
                ScalarType::Bool | ScalarType::Bit => {
                    return Err(unsupported(format!("input of type {ty}")));
                }
            },
            Statement::OutputDecl { .. } => return Err(unsupported("output declarations")),
            Statement::Gate(call) => {
                let instructions = self.expand_gate_call(call)?;
                // A phase left uncontrolled at top level is unobservable.
                self.instructions
                    .extend(instructions.into_iter().filter(|i| !i.is_global_phase()));
            }
            Statement::Measure { qubits, bits } => self.measure(qubits, bits)?,
            Statement::Reset { qubits } => {
                for qubit in self.flatten_qubits(qubits)? {
                    self.instructions.push(NormalizedInstruction::reset(qubit));
                }
            }
            Statement::Barrier { qubits } => {
                let qubits = if qubits.is_empty() {
                    (0..self.num_qubits).collect()
                } else {
                    self.flatten_qubits(qubits)?
                };
                self.instructions.push(NormalizedInstruction::barrier(qubits));
            }
            Statement::Delay { .. } => return Err(unsupported("delay")),
            Statement::If { .. } => return Err(unsupported("if statements")),
            Statement::While { .. } => return Err(unsupported("while loops")),
            Statement::For {
                variable,
                iterable,
                body,
                ..
            } => return self.exec_for(variable, iterable, body),
            Statement::GateDef {
                name,
                params,
                qubits,
                body,
            } => {
                if self.gates.contains_key(name) || self.subroutines.contains_key(name) {
                    return Err(ParseError::DuplicateDeclaration(name.clone()));
                }
                trace!(gate = %name, "registered gate definition");
                self.gates.insert(
                    name.clone(),
                    GateDef {
                        params,
                        qubits,
                        body,
                    },
                );
            }
            Statement::OpaqueDef { name, .. } => {
                return Err(unsupported(format!("opaque gate '{name}'")));
            }
            Statement::SubroutineDef {
                name,
                params,
                return_type,
                body,
            } => {
                if self.gates.contains_key(name) || self.subroutines.contains_key(name) {
                    return Err(ParseError::DuplicateDeclaration(name.clone()));
                }
                self.subroutines.insert(
                    name.clone(),
                    Subroutine {
                        params,
                        return_type: *return_type,
                        body,
                    },
                );
            }
            Statement::Call { name, args } => self.call(name, args)?,
            Statement::Return(None) => return Ok(Flow::Return),
            Statement::Return(Some(_)) => return Err(unsupported("return with a value")),
            Statement::Assignment {
                target,
                index,
                op,
                value,
            } => self.assign(target, index.as_ref(), *op, value)?,
        }
        Ok(Flow::Continue)
    }

    fn exec_for(
        &mut self,
        variable: &str,
        iterable: &ForIterable,
        body: &'a [Statement],
    ) -> ParseResult<Flow> {
        let values = match iterable {
            ForIterable::Range(range) => self
                .range_values(range)?
                .into_iter()
                .map(Value::Int)
                .collect(),
            ForIterable::Set(values) => values
                .iter()
                .map(|v| self.eval(v))
                .collect::<ParseResult<Vec<_>>>()?,
        };

        for value in values {
            self.unrolled += 1;
            if self.unrolled > MAX_UNROLLED {
                return Err(unsupported(format!(
                    "more than {MAX_UNROLLED} unrolled loop iterations"
                )));
            }
            let mut scope = Scope::default();
            scope.insert(
                variable.to_string(),
                Binding {
                    value,
                    ty: None,
                    is_const: false,
                },
            );
            self.scopes.push(scope);
            let flow = self.exec_block(body);
            self.scopes.pop();
            if let Flow::Return = flow? {
                return Ok(Flow::Return);
            }
        }
        Ok(Flow::Continue)
    }

    fn measure(&mut self, qubits: &[QubitRef], bits: &[BitRef]) -> ParseResult<()> {
        let qubits = self.flatten_qubits(qubits)?;
        if bits.is_empty() {
            for qubit in qubits {
                self.instructions
                    .push(NormalizedInstruction::new(MEASURE, [qubit]));
            }
            return Ok(());
        }

        let mut clbits = Vec::new();
        for bit in bits {
            clbits.extend(self.resolve_bit_ref(bit)?);
        }
        if clbits.len() != qubits.len() {
            return Err(ParseError::RegisterSizeMismatch {
                gate: MEASURE.into(),
                sizes: vec![qubits.len(), clbits.len()],
            });
        }
        for (qubit, clbit) in qubits.into_iter().zip(clbits) {
            self.instructions
                .push(NormalizedInstruction::measure(qubit, clbit));
        }
        Ok(())
    }

    fn assign(
        &mut self,
        target: &str,
        index: Option<&Expression>,
        op: Option<BinOp>,
        value: &Expression,
    ) -> ParseResult<()> {
        if self.lookup(target).is_none() && self.cregs.contains_key(target) {
            return Err(unsupported("classical bit assignment"));
        }
        if index.is_some() {
            return Err(unsupported(format!("indexed assignment to '{target}'")));
        }

        let value = self.eval(value)?;
        let floor = self.floor;
        let binding = self.scopes[floor..]
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(target))
            .ok_or_else(|| ParseError::UndefinedIdentifier(target.to_string()))?;
        if binding.is_const {
            return Err(ParseError::Generic(format!(
                "cannot assign to constant '{target}'"
            )));
        }

        let value = match op {
            Some(op) => binary(op, binding.value.clone(), value)?,
            None => value,
        };
        binding.value = match binding.ty {
            Some(ty) => coerce(ty, value)?,
            None => value,
        };
        Ok(())
    }

    // =========================================================================
    // Gate applications
    // =========================================================================

    fn expand_gate_call(&mut self, call: &GateCall) -> ParseResult<Vec<NormalizedInstruction>> {
        let params = call
            .params
            .iter()
            .map(|p| self.eval(p)?.to_param())
            .collect::<ParseResult<Vec<_>>>()?;
        let modifiers = call
            .modifiers
            .iter()
            .map(|m| self.eval_modifier(m))
            .collect::<ParseResult<Vec<_>>>()?;

        let num_controls: usize = modifiers
            .iter()
            .map(|m| match m {
                Modifier::Ctrl(n) | Modifier::NegCtrl(n) => *n,
                _ => 0,
            })
            .sum();
        let arity = self.gate_arity(&call.name)?;
        let expected = num_controls + arity;

        let operands = call
            .qubits
            .iter()
            .map(|q| self.resolve_qubit_ref(q))
            .collect::<ParseResult<Vec<_>>>()?;

        // `z q[0], q[1];` applies a built-in single-qubit gate to each
        // operand in turn.
        if modifiers.is_empty()
            && arity == 1
            && operands.len() > 1
            && !self.gates.contains_key(&call.name)
        {
            let mut out = Vec::new();
            for operand in &operands {
                for qubits in broadcast(&call.name, std::slice::from_ref(operand))? {
                    out.extend(self.expand_application(&call.name, &params, &qubits)?);
                }
            }
            return Ok(out);
        }

        if operands.len() != expected {
            return Err(ParseError::WrongQubitCount {
                gate: call.name.clone(),
                expected,
                got: operands.len(),
            });
        }

        let mut out = Vec::new();
        for qubits in broadcast(&call.name, &operands)? {
            out.extend(self.apply_modified(&call.name, &params, &modifiers, &qubits)?);
        }
        Ok(out)
    }

    fn eval_modifier(&self, modifier: &GateModifier) -> ParseResult<Modifier> {
        let count = |n: &Option<Expression>| -> ParseResult<usize> {
            let Some(n) = n else {
                return Ok(1);
            };
            match self.eval(n)?.as_int() {
                Some(k) if k >= 1 => Ok(usize::try_from(k).unwrap_or(usize::MAX)),
                _ => Err(ParseError::Generic(format!(
                    "control count must be a positive integer, got {n}"
                ))),
            }
        };
        Ok(match modifier {
            GateModifier::Inv => Modifier::Inv,
            GateModifier::Pow(k) => match self.eval(k)? {
                Value::Param(_) => return Err(unsupported(format!("symbolic exponent pow({k})"))),
                value => Modifier::Pow(value.as_f64().ok_or_else(|| {
                    ParseError::Generic(format!("pow exponent must be numeric, got {k}"))
                })?),
            },
            GateModifier::Ctrl(n) => Modifier::Ctrl(count(n)?),
            GateModifier::NegCtrl(n) => Modifier::NegCtrl(count(n)?),
        })
    }

    /// Apply `modifiers` (outermost first) to one application of `name`.
    /// Control operands are taken from the front of `qubits` in modifier
    /// order.
    fn apply_modified(
        &mut self,
        name: &str,
        params: &[ParameterExpression],
        modifiers: &[Modifier],
        qubits: &[u32],
    ) -> ParseResult<Vec<NormalizedInstruction>> {
        let mut plan = Vec::with_capacity(modifiers.len());
        let mut offset = 0;
        for modifier in modifiers {
            let width = match modifier {
                Modifier::Ctrl(n) | Modifier::NegCtrl(n) => *n,
                _ => 0,
            };
            plan.push((*modifier, &qubits[offset..offset + width]));
            offset += width;
        }

        let mut sequence = self.expand_application(name, params, &qubits[offset..])?;
        for (modifier, controls) in plan.into_iter().rev() {
            sequence = match modifier {
                Modifier::Inv => inverse_sequence(&sequence)?,
                Modifier::Pow(k) => power_sequence(&sequence, k)?,
                Modifier::Ctrl(_) => control_sequence(&sequence, controls)?,
                Modifier::NegCtrl(_) => {
                    let flips: Vec<_> = controls
                        .iter()
                        .map(|&c| NormalizedInstruction::new("x", [c]))
                        .collect();
                    let mut out = flips.clone();
                    out.extend(control_sequence(&sequence, controls)?);
                    out.extend(flips);
                    out
                }
            };
        }
        Ok(sequence)
    }

    /// Qubit count of a gate by name. Parameter counts are left to the
    /// consumers of the instruction stream.
    fn gate_arity(&self, name: &str) -> ParseResult<usize> {
        if let Some(def) = self.gates.get(name) {
            return Ok(def.qubits.len());
        }
        let lower = name.to_ascii_lowercase();
        match lower.as_str() {
            "gphase" => Ok(0),
            "u0" => Ok(1),
            "rccx" => Ok(3),
            "c3x" | "c3sqrtx" | "rc3x" => Ok(4),
            "c4x" => Ok(5),
            _ => Gate::arity(&lower)
                .map(|n| n as usize)
                .ok_or_else(|| ParseError::UnknownGate(name.to_string())),
        }
    }

    /// Expand one unmodified application into primitive instructions.
    fn expand_application(
        &mut self,
        name: &str,
        params: &[ParameterExpression],
        qubits: &[u32],
    ) -> ParseResult<Vec<NormalizedInstruction>> {
        if let Some(def) = self.gates.get(name).copied() {
            return self.inline_gate(name, def, params, qubits);
        }

        let lower = name.to_ascii_lowercase();
        let expect = |n: usize| -> ParseResult<()> {
            if params.len() == n {
                Ok(())
            } else {
                Err(ParseError::WrongParameterCount {
                    gate: name.to_string(),
                    expected: n,
                    got: params.len(),
                })
            }
        };
        if lower == "gphase" {
            expect(1)?;
            return Ok(vec![NormalizedInstruction::global_phase(params[0].clone())]);
        }

        let Some((&target, controls)) = qubits.split_last() else {
            return Ok(vec![]);
        };
        let instructions = match lower.as_str() {
            "c3x" | "c4x" => {
                vec![NormalizedInstruction::new("x", [target]).with_controls(controls.to_vec())]
            }
            "c3sqrtx" => {
                vec![NormalizedInstruction::new("sx", [target]).with_controls(controls.to_vec())]
            }
            "cu" if params.len() == 4 => vec![
                NormalizedInstruction::new("p", [qubits[0]]).with_params([params[3].clone()]),
                NormalizedInstruction::new("u", [target])
                    .with_controls([qubits[0]])
                    .with_params(params[..3].iter().cloned()),
            ],
            "u0" => {
                expect(1)?;
                vec![NormalizedInstruction::new("id", [target])]
            }
            "rccx" => relative_phase_toffoli(qubits[0], qubits[1], target),
            "rc3x" => relative_phase_c3x(qubits[0], qubits[1], qubits[2], target),
            // stdgates.inc: u2 and u3 carry gphase(-(φ+λ)/2) relative to U.
            "u2" if params.len() == 2 => vec![
                NormalizedInstruction::global_phase(
                    (params[0].clone() + params[1].clone()).scaled(-0.5),
                ),
                NormalizedInstruction::new(lower.as_str(), [target]).with_params(params.to_vec()),
            ],
            "u3" if params.len() == 3 => vec![
                NormalizedInstruction::global_phase(
                    (params[1].clone() + params[2].clone()).scaled(-0.5),
                ),
                NormalizedInstruction::new(lower.as_str(), [target]).with_params(params.to_vec()),
            ],
            _ => vec![NormalizedInstruction::new(lower, qubits.to_vec()).with_params(params.to_vec())],
        };
        Ok(instructions)
    }

    fn inline_gate(
        &mut self,
        name: &str,
        def: GateDef<'a>,
        params: &[ParameterExpression],
        qubits: &[u32],
    ) -> ParseResult<Vec<NormalizedInstruction>> {
        if params.len() != def.params.len() {
            return Err(ParseError::WrongParameterCount {
                gate: name.to_string(),
                expected: def.params.len(),
                got: params.len(),
            });
        }

        let mut scope = Scope::default();
        for (param, value) in def.params.iter().zip(params) {
            scope.insert(param.clone(), Binding::constant(Value::from_param(value.clone())));
        }
        for (qubit, &index) in def.qubits.iter().zip(qubits) {
            scope.insert(qubit.clone(), Binding::constant(Value::Qubits(vec![index])));
        }

        let saved = self.enter(scope, name)?;
        let result = self.collect_gate_body(def.body);
        self.leave(saved);
        result
    }

    fn collect_gate_body(&mut self, body: &'a [Statement]) -> ParseResult<Vec<NormalizedInstruction>> {
        let mut out = Vec::new();
        for statement in body {
            match statement {
                Statement::Gate(call) => out.extend(self.expand_gate_call(call)?),
                Statement::Barrier { .. } => {}
                Statement::Call { name, args } if name == "gphase" => {
                    let [arg] = args.as_slice() else {
                        return Err(ParseError::WrongParameterCount {
                            gate: name.clone(),
                            expected: 1,
                            got: args.len(),
                        });
                    };
                    let theta = self.eval(arg)?.to_param()?;
                    out.push(NormalizedInstruction::global_phase(theta));
                }
                other => {
                    return Err(unsupported(format!(
                        "statement in gate body: {}",
                        statement_kind(other)
                    )));
                }
            }
        }
        Ok(out)
    }

    fn call(&mut self, name: &str, args: &[Expression]) -> ParseResult<()> {
        let Some(sub) = self.subroutines.get(name).copied() else {
            if name == "gphase" {
                // Global phase has no observable effect at top level.
                let [arg] = args else {
                    return Err(ParseError::WrongParameterCount {
                        gate: name.to_string(),
                        expected: 1,
                        got: args.len(),
                    });
                };
                self.eval(arg)?.to_param()?;
                return Ok(());
            }
            return match self.gate_arity(name) {
                Ok(expected) => Err(ParseError::WrongQubitCount {
                    gate: name.to_string(),
                    expected,
                    got: 0,
                }),
                _ => Err(ParseError::UndefinedIdentifier(name.to_string())),
            };
        };

        if sub.return_type.is_some() {
            return Err(unsupported(format!("subroutine '{name}' with a return value")));
        }
        if args.len() != sub.params.len() {
            return Err(ParseError::Generic(format!(
                "Subroutine '{name}' expects {} arguments, got {}",
                sub.params.len(),
                args.len()
            )));
        }

        let mut scope = Scope::default();
        for (param, arg) in sub.params.iter().zip(args) {
            match param {
                SubroutineParam::Qubit { name: pname, size } => {
                    let operand = self.resolve_qubit_ref(&qubit_arg(arg)?)?;
                    let expected = match size {
                        Some(size) => self.eval_size(Some(size))? as usize,
                        None => 1,
                    };
                    if operand.qubits.len() != expected {
                        return Err(ParseError::WrongQubitCount {
                            gate: name.to_string(),
                            expected,
                            got: operand.qubits.len(),
                        });
                    }
                    scope.insert(pname.clone(), Binding::constant(Value::Qubits(operand.qubits)));
                }
                SubroutineParam::Classical { ty, name: pname, .. } => {
                    let value = coerce(*ty, self.eval(arg)?)?;
                    scope.insert(
                        pname.clone(),
                        Binding {
                            value,
                            ty: Some(*ty),
                            is_const: false,
                        },
                    );
                }
            }
        }

        let saved = self.enter(scope, name)?;
        let result = self.exec_block(sub.body);
        self.leave(saved);
        result.map(|_| ())
    }

    /// Push an isolated scope for a gate or subroutine body.
    fn enter(&mut self, scope: Scope, name: &str) -> ParseResult<(usize, bool)> {
        if self.depth >= MAX_DEPTH {
            return Err(unsupported(format!(
                "expansion of '{name}' exceeds nesting depth {MAX_DEPTH}"
            )));
        }
        self.depth += 1;
        let saved = (self.floor, self.isolated);
        self.scopes.push(scope);
        self.floor = self.scopes.len() - 1;
        self.isolated = true;
        Ok(saved)
    }

    fn leave(&mut self, (floor, isolated): (usize, bool)) {
        self.scopes.pop();
        self.floor = floor;
        self.isolated = isolated;
        self.depth -= 1;
    }

    // =========================================================================
    // Names and operands
    // =========================================================================

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes[self.floor.min(self.scopes.len())..]
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .or_else(|| {
                // Bodies still see global constants.
                self.scopes
                    .first()
                    .and_then(|global| global.get(name))
                    .filter(|b| self.isolated && b.is_const)
            })
    }

    fn declare(&mut self, name: &str, binding: Binding) -> ParseResult<()> {
        self.check_undeclared(name)?;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), binding);
        }
        Ok(())
    }

    fn check_undeclared(&self, name: &str) -> ParseResult<()> {
        let in_scope = self.scopes.last().is_some_and(|s| s.contains_key(name));
        let is_register = self.qregs.contains_key(name) || self.cregs.contains_key(name);
        if in_scope || is_register {
            return Err(ParseError::DuplicateDeclaration(name.to_string()));
        }
        Ok(())
    }

    fn lookup_qubits(&self, name: &str) -> ParseResult<(Vec<u32>, bool)> {
        match self.lookup(name) {
            Some(Binding {
                value: Value::Qubits(qubits),
                ..
            }) => return Ok((qubits.clone(), qubits.len() > 1)),
            Some(_) => {
                return Err(ParseError::Generic(format!("'{name}' is not a qubit")));
            }
            None => {}
        }
        match self.qregs.get(name) {
            Some(reg) if !self.isolated => Ok((reg.indices(), true)),
            _ => Err(ParseError::UndefinedIdentifier(name.to_string())),
        }
    }

    fn resolve_qubit_ref(&self, qubit: &QubitRef) -> ParseResult<Operand> {
        match qubit {
            QubitRef::Single { register, index } => {
                let (qubits, broadcast) = self.lookup_qubits(register)?;
                match index {
                    None => Ok(Operand { qubits, broadcast }),
                    Some(index) => {
                        let i = self.eval_index(index, register, qubits.len())?;
                        Ok(Operand {
                            qubits: vec![qubits[i]],
                            broadcast: false,
                        })
                    }
                }
            }
            QubitRef::Range { register, range } => {
                let (qubits, _) = self.lookup_qubits(register)?;
                let indices = self.eval_slice(range, register, qubits.len())?;
                Ok(Operand {
                    qubits: indices.into_iter().map(|i| qubits[i]).collect(),
                    broadcast: true,
                })
            }
        }
    }

    fn flatten_qubits(&self, qubits: &[QubitRef]) -> ParseResult<Vec<u32>> {
        let mut out = Vec::new();
        for qubit in qubits {
            out.extend(self.resolve_qubit_ref(qubit)?.qubits);
        }
        Ok(out)
    }

    fn resolve_bit_ref(&self, bit: &BitRef) -> ParseResult<Vec<u32>> {
        let lookup = |name: &str| -> ParseResult<Vec<u32>> {
            match self.cregs.get(name) {
                Some(reg) if !self.isolated => Ok(reg.indices()),
                _ => Err(ParseError::UndefinedIdentifier(name.to_string())),
            }
        };
        match bit {
            BitRef::Single { register, index } => {
                let bits = lookup(register)?;
                match index {
                    None => Ok(bits),
                    Some(index) => {
                        let i = self.eval_index(index, register, bits.len())?;
                        Ok(vec![bits[i]])
                    }
                }
            }
            BitRef::Range { register, range } => {
                let bits = lookup(register)?;
                let indices = self.eval_slice(range, register, bits.len())?;
                Ok(indices.into_iter().map(|i| bits[i]).collect())
            }
        }
    }

    /// Evaluate an index; negative values count from the end.
    fn eval_index(&self, index: &Expression, register: &str, size: usize) -> ParseResult<usize> {
        let raw = self.eval_int(index)?;
        normalize_index(raw, register, size)
    }

    fn eval_slice(&self, range: &Range, register: &str, size: usize) -> ParseResult<Vec<usize>> {
        let start = normalize_index(self.eval_int(&range.start)?, register, size)?;
        let end = normalize_index(self.eval_int(&range.end)?, register, size)?;
        let step = match &range.step {
            Some(step) => self.eval_int(step)?,
            None => 1,
        };
        Ok(inclusive_range(start as i64, step, end as i64)?
            .into_iter()
            .map(|i| i as usize)
            .collect())
    }

    fn range_values(&self, range: &Range) -> ParseResult<Vec<i64>> {
        let start = self.eval_int(&range.start)?;
        let end = self.eval_int(&range.end)?;
        let step = match &range.step {
            Some(step) => self.eval_int(step)?,
            None => 1,
        };
        inclusive_range(start, step, end)
    }

    fn eval_size(&self, size: Option<&Expression>) -> ParseResult<u32> {
        let Some(size) = size else {
            return Ok(1);
        };
        let n = self.eval_int(size)?;
        u32::try_from(n)
            .ok()
            .filter(|&n| n > 0)
            .ok_or_else(|| ParseError::Generic(format!("invalid register size {n}")))
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn eval_int(&self, expr: &Expression) -> ParseResult<i64> {
        self.eval(expr)?
            .as_int()
            .ok_or_else(|| ParseError::Generic(format!("expected an integer, got '{expr}'")))
    }

    fn eval(&self, expr: &Expression) -> ParseResult<Value> {
        match expr {
            Expression::Int(v) => Ok(Value::Int(*v)),
            Expression::Float(v) => Ok(Value::Float(*v)),
            Expression::Bool(v) => Ok(Value::Bool(*v)),
            Expression::Pi => Ok(Value::Float(std::f64::consts::PI)),
            Expression::Tau => Ok(Value::Float(std::f64::consts::TAU)),
            Expression::Euler => Ok(Value::Float(std::f64::consts::E)),
            Expression::Duration(d) => Err(unsupported(format!("duration literal {d}"))),
            Expression::Identifier(name) => match self.lookup(name) {
                Some(Binding {
                    value: Value::Qubits(_),
                    ..
                }) => Err(ParseError::Generic(format!(
                    "qubit '{name}' used in a classical expression"
                ))),
                Some(binding) => Ok(binding.value.clone()),
                None => Err(ParseError::UndefinedIdentifier(name.clone())),
            },
            Expression::Paren(inner) => self.eval(inner),
            Expression::Neg(inner) => match self.eval(inner)? {
                Value::Int(v) => v
                    .checked_neg()
                    .map(Value::Int)
                    .ok_or_else(|| ParseError::Generic("integer overflow".into())),
                Value::Float(v) => Ok(Value::Float(-v)),
                Value::Param(p) => Ok(Value::Param(p.negated())),
                _ => Err(ParseError::Generic(format!("cannot negate '{inner}'"))),
            },
            Expression::Not(inner) => match self.eval(inner)? {
                Value::Bool(v) => Ok(Value::Bool(!v)),
                _ => Err(ParseError::Generic(format!("'!' needs a boolean, got '{inner}'"))),
            },
            Expression::BinOp { left, op, right } => {
                binary(*op, self.eval(left)?, self.eval(right)?)
            }
            Expression::FnCall { name, args } => {
                let Some(func) = MathFunction::from_name(name) else {
                    return Err(unsupported(format!("call to '{name}' in an expression")));
                };
                let [arg] = args.as_slice() else {
                    return Err(ParseError::Generic(format!(
                        "{name} takes 1 argument, got {}",
                        args.len()
                    )));
                };
                match self.eval(arg)? {
                    Value::Param(p) => Ok(Value::Param(ParameterExpression::function(func, p))),
                    value => {
                        let x = value.as_f64().ok_or_else(|| {
                            ParseError::Generic(format!("{name} needs a number, got '{arg}'"))
                        })?;
                        func.apply(x).map(Value::Float).ok_or_else(|| {
                            ParseError::Generic(format!("{name}({x}) is undefined"))
                        })
                    }
                }
            }
            Expression::Index { .. } => Err(unsupported(format!("indexed expression '{expr}'"))),
        }
    }
}

/// Zip broadcast operands; single operands repeat.
/// `rccx` from `qelib1.inc`: a Toffoli up to a relative phase. Each
/// `u2(0, pi)` of the definition is an `h` with phase `-pi/2`.
fn relative_phase_toffoli(a: u32, b: u32, c: u32) -> Vec<NormalizedInstruction> {
    let on = |gate: &str| NormalizedInstruction::new(gate, [c]);
    let cx = |control: u32| NormalizedInstruction::new("cx", [control, c]);
    let u2 = || {
        [
            NormalizedInstruction::global_phase(ParameterExpression::Constant(-FRAC_PI_2)),
            on("h"),
        ]
    };
    let mut out = Vec::with_capacity(11);
    out.extend(u2());
    out.extend([on("t"), cx(b), on("tdg"), cx(a), on("t"), cx(b), on("tdg")]);
    out.extend(u2());
    out
}

/// `rc3x` from `qelib1.inc`: a three-control X up to relative phases.
fn relative_phase_c3x(a: u32, b: u32, c: u32, d: u32) -> Vec<NormalizedInstruction> {
    let on = |gate: &str| NormalizedInstruction::new(gate, [d]);
    let cx = |control: u32| NormalizedInstruction::new("cx", [control, d]);
    let u2 = || {
        [
            NormalizedInstruction::global_phase(ParameterExpression::Constant(-FRAC_PI_2)),
            on("h"),
        ]
    };
    let mut out = Vec::with_capacity(22);
    out.extend(u2());
    out.extend([on("t"), cx(c), on("tdg")]);
    out.extend(u2());
    out.extend([cx(a), on("t"), cx(b), on("tdg"), cx(a), on("t"), cx(b), on("tdg")]);
    out.extend(u2());
    out.extend([on("t"), cx(c), on("tdg")]);
    out.extend(u2());
    out
}

fn broadcast(gate: &str, operands: &[Operand]) -> ParseResult<Vec<Vec<u32>>> {
    let sizes: Vec<usize> = operands
        .iter()
        .filter(|o| o.broadcast)
        .map(|o| o.qubits.len())
        .collect();
    let width = match sizes.first() {
        None => 1,
        Some(&n) => {
            if sizes.iter().any(|&s| s != n) {
                return Err(ParseError::RegisterSizeMismatch {
                    gate: gate.to_string(),
                    sizes,
                });
            }
            n
        }
    };

    let mut applications = Vec::with_capacity(width);
    for i in 0..width {
        let qubits: Vec<u32> = operands
            .iter()
            .map(|o| if o.broadcast { o.qubits[i] } else { o.qubits[0] })
            .collect();
        if qubits.iter().enumerate().any(|(j, q)| qubits[..j].contains(q)) {
            return Err(ParseError::DuplicateOperand {
                gate: gate.to_string(),
            });
        }
        applications.push(qubits);
    }
    Ok(applications)
}

fn normalize_index(raw: i64, register: &str, size: usize) -> ParseResult<usize> {
    let len = i64::try_from(size).unwrap_or(i64::MAX);
    let index = if raw < 0 { len + raw } else { raw };
    if (0..len).contains(&index) {
        Ok(index as usize)
    } else {
        Err(ParseError::IndexOutOfBounds {
            register: register.to_string(),
            index: raw,
            size,
        })
    }
}

/// `start:step:end` with an inclusive end.
fn inclusive_range(start: i64, step: i64, end: i64) -> ParseResult<Vec<i64>> {
    if step == 0 {
        return Err(ParseError::Generic("range step cannot be zero".into()));
    }
    let span = if step > 0 {
        end.saturating_sub(start)
    } else {
        start.saturating_sub(end)
    };
    if span < 0 {
        return Ok(vec![]);
    }
    let count = span / step.abs() + 1;
    if count > MAX_UNROLLED as i64 {
        return Err(unsupported(format!(
            "range {start}:{step}:{end} with more than {MAX_UNROLLED} values"
        )));
    }
    Ok((0..count).map(|k| start + k * step).collect())
}

/// Interpret a subroutine argument as a qubit reference.
fn qubit_arg(arg: &Expression) -> ParseResult<QubitRef> {
    match arg {
        Expression::Identifier(name) => Ok(QubitRef::register(name.clone())),
        Expression::Index { target, index } => match target.as_ref() {
            Expression::Identifier(name) => Ok(QubitRef::Single {
                register: name.clone(),
                index: Some(index.as_ref().clone()),
            }),
            _ => Err(ParseError::Generic(format!("'{arg}' is not a qubit argument"))),
        },
        _ => Err(ParseError::Generic(format!("'{arg}' is not a qubit argument"))),
    }
}

/// Convert a value to a declared scalar type.
#[allow(clippy::cast_possible_truncation)]
fn coerce(ty: ScalarType, value: Value) -> ParseResult<Value> {
    match (ty, value) {
        (ScalarType::Int | ScalarType::Uint, Value::Int(v)) => {
            if ty == ScalarType::Uint && v < 0 {
                return Err(ParseError::Generic(format!("negative value {v} for uint")));
            }
            Ok(Value::Int(v))
        }
        (ScalarType::Int | ScalarType::Uint, Value::Float(v)) => Ok(Value::Int(v.trunc() as i64)),
        (ScalarType::Int | ScalarType::Uint, Value::Bool(v)) => Ok(Value::Int(i64::from(v))),
        (ScalarType::Float | ScalarType::Angle, Value::Param(p)) => Ok(Value::Param(p)),
        (ScalarType::Float | ScalarType::Angle, Value::Bool(v)) => {
            Ok(Value::Float(if v { 1.0 } else { 0.0 }))
        }
        (ScalarType::Float | ScalarType::Angle, value @ (Value::Int(_) | Value::Float(_))) => {
            Ok(Value::Float(value.as_f64().unwrap_or_default()))
        }
        (ScalarType::Bool, Value::Bool(v)) => Ok(Value::Bool(v)),
        (ScalarType::Bool, value @ (Value::Int(_) | Value::Float(_))) => {
            Ok(Value::Bool(value.as_f64().is_some_and(|v| v != 0.0)))
        }
        (ScalarType::Bit, _) => Err(unsupported("classical bit variables")),
        (ty, _) => Err(ParseError::Generic(format!(
            "value cannot be converted to {ty}"
        ))),
    }
}

/// Evaluate a binary operation. `/` is always real division.
#[allow(clippy::cast_precision_loss)]
fn binary(op: BinOp, left: Value, right: Value) -> ParseResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_binary(op, a, b),
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinOp::And => Ok(Value::Bool(a && b)),
            BinOp::Or => Ok(Value::Bool(a || b)),
            BinOp::Eq => Ok(Value::Bool(a == b)),
            BinOp::NotEq => Ok(Value::Bool(a != b)),
            _ => Err(ParseError::Generic(format!("'{op}' is not defined on booleans"))),
        },
        (l @ Value::Param(_), r) | (l, r @ Value::Param(_)) => {
            let (a, b) = (l.to_param()?, r.to_param()?);
            match op {
                BinOp::Add => Ok(Value::Param(a + b)),
                BinOp::Sub => Ok(Value::Param(a - b)),
                BinOp::Mul => Ok(Value::Param(a * b)),
                BinOp::Div => Ok(Value::Param(a / b)),
                BinOp::Pow => Ok(Value::Param(ParameterExpression::Pow(
                    Box::new(a),
                    Box::new(b),
                ))),
                _ => Err(unsupported(format!("'{op}' on symbolic parameters"))),
            }
        }
        (l, r) => {
            let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else {
                return Err(ParseError::Generic(format!("invalid operands for '{op}'")));
            };
            float_binary(op, a, b)
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn int_binary(op: BinOp, a: i64, b: i64) -> ParseResult<Value> {
    let overflow = || ParseError::Generic(format!("integer overflow in {a} {op} {b}"));
    Ok(match op {
        BinOp::Add => Value::Int(a.checked_add(b).ok_or_else(overflow)?),
        BinOp::Sub => Value::Int(a.checked_sub(b).ok_or_else(overflow)?),
        BinOp::Mul => Value::Int(a.checked_mul(b).ok_or_else(overflow)?),
        BinOp::Div => return float_binary(op, a as f64, b as f64),
        BinOp::Mod => {
            if b == 0 {
                return Err(ParseError::Generic("modulo by zero".into()));
            }
            Value::Int(a % b)
        }
        BinOp::Pow => match u32::try_from(b) {
            Ok(exp) => Value::Int(a.checked_pow(exp).ok_or_else(overflow)?),
            Err(_) => return float_binary(op, a as f64, b as f64),
        },
        BinOp::BitAnd => Value::Int(a & b),
        BinOp::BitOr => Value::Int(a | b),
        BinOp::BitXor => Value::Int(a ^ b),
        BinOp::LShift | BinOp::RShift => {
            let shift = u32::try_from(b).ok().filter(|&s| s < 64).ok_or_else(overflow)?;
            if op == BinOp::LShift {
                Value::Int(a << shift)
            } else {
                Value::Int(a >> shift)
            }
        }
        _ => return float_binary(op, a as f64, b as f64),
    })
}

fn float_binary(op: BinOp, a: f64, b: f64) -> ParseResult<Value> {
    Ok(match op {
        BinOp::Add => Value::Float(a + b),
        BinOp::Sub => Value::Float(a - b),
        BinOp::Mul => Value::Float(a * b),
        BinOp::Div | BinOp::Mod if b == 0.0 => {
            return Err(ParseError::Generic(format!("division by zero in {a} {op} {b}")));
        }
        BinOp::Div => Value::Float(a / b),
        BinOp::Mod => Value::Float(a % b),
        BinOp::Pow => Value::Float(a.powf(b)),
        BinOp::Eq => Value::Bool(a == b),
        BinOp::NotEq => Value::Bool(a != b),
        BinOp::Lt => Value::Bool(a < b),
        BinOp::LtEq => Value::Bool(a <= b),
        BinOp::Gt => Value::Bool(a > b),
        BinOp::GtEq => Value::Bool(a >= b),
        _ => return Err(ParseError::Generic(format!("'{op}' is not defined on floats"))),
    })
}

fn statement_kind(statement: &Statement) -> &'static str {
    match statement {
        Statement::Include(_) => "include",
        Statement::QubitDecl { .. } => "qubit declaration",
        Statement::BitDecl { .. } => "bit declaration",
        Statement::ClassicalDecl { .. } => "classical declaration",
        Statement::InputDecl { .. } => "input declaration",
        Statement::OutputDecl { .. } => "output declaration",
        Statement::Gate(_) => "gate call",
        Statement::Measure { .. } => "measure",
        Statement::Reset { .. } => "reset",
        Statement::Barrier { .. } => "barrier",
        Statement::Delay { .. } => "delay",
        Statement::If { .. } => "if",
        Statement::For { .. } => "for",
        Statement::While { .. } => "while",
        Statement::GateDef { .. } => "gate definition",
        Statement::OpaqueDef { .. } => "opaque declaration",
        Statement::SubroutineDef { .. } => "subroutine definition",
        Statement::Call { .. } => "subroutine call",
        Statement::Return(_) => "return",
        Statement::Assignment { .. } => "assignment",
    }
}
