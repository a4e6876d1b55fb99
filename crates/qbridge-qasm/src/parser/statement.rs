//! Statement parsing.

use super::Parser;
use crate::ast::{
    BinOp, BitRef, Expression, ForIterable, GateCall, GateModifier, QubitRef, Range, ScalarType,
    Statement, SubroutineParam,
};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Statement> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        match token {
            Token::Include => self.parse_include(),
            Token::Qubit => self.parse_qubit_decl(),
            Token::Qreg => self.parse_qreg(),
            Token::Bit => self.parse_bit_decl(),
            Token::Creg => self.parse_creg(),
            Token::Int | Token::Uint | Token::Float | Token::Angle | Token::Bool => {
                self.parse_classical_decl(false)
            }
            Token::Const => {
                self.advance();
                self.parse_classical_decl(true)
            }
            Token::Input => self.parse_io_decl(true),
            Token::Output => self.parse_io_decl(false),
            Token::Measure => self.parse_measure(),
            Token::Reset => self.parse_reset(),
            Token::Barrier => self.parse_barrier(),
            Token::Delay => self.parse_delay(),
            Token::If => self.parse_if(),
            Token::For => self.parse_for(),
            Token::While => self.parse_while(),
            Token::Gate => self.parse_gate_def(),
            Token::Opaque => self.parse_opaque(),
            Token::Def => self.parse_subroutine_def(),
            Token::Return => self.parse_return(),
            Token::Ctrl | Token::NegCtrl | Token::Inv | Token::Pow => self.parse_modified_gate(),
            Token::Identifier(_) => self.parse_identifier_statement(),
            _ => Err(self.unexpected("statement", &token)),
        }
    }

    /// Parse include statement.
    fn parse_include(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Include)?;
        let path = match self.advance() {
            Some(Token::StringLiteral(s)) => s,
            Some(other) => return Err(self.unexpected("string literal", &other)),
            None => return Err(ParseError::UnexpectedEof("include path".into())),
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Include(path))
    }

    /// Parse an optional `[expr]` designator.
    fn parse_designator(&mut self) -> ParseResult<Option<Expression>> {
        if self.consume(&Token::LBracket) {
            let size = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            Ok(Some(size))
        } else {
            Ok(None)
        }
    }

    /// Parse qubit declaration: `qubit[n] q;`
    fn parse_qubit_decl(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Qubit)?;
        let size = self.parse_designator()?;
        let name = self.parse_identifier()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::QubitDecl { name, size })
    }

    /// Parse QASM2 quantum register: `qreg q[n];`
    fn parse_qreg(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Qreg)?;
        let name = self.parse_identifier()?;
        let size = self.parse_designator()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::QubitDecl { name, size })
    }

    /// Parse bit declaration: `bit[n] c;` or `bit[n] c = measure q;`
    fn parse_bit_decl(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Bit)?;
        let size = self.parse_designator()?;
        let name = self.parse_identifier()?;
        let measure = if self.consume(&Token::Eq) {
            self.expect(Token::Measure)?;
            Some(self.parse_qubit_refs()?)
        } else {
            None
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::BitDecl {
            name,
            size,
            measure,
        })
    }

    /// Parse QASM2 classical register: `creg c[n];`
    fn parse_creg(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Creg)?;
        let name = self.parse_identifier()?;
        let size = self.parse_designator()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::BitDecl {
            name,
            size,
            measure: None,
        })
    }

    /// Parse a scalar type keyword.
    pub(super) fn parse_scalar_type(&mut self) -> ParseResult<ScalarType> {
        let ty = match self.advance() {
            Some(Token::Int) => ScalarType::Int,
            Some(Token::Uint) => ScalarType::Uint,
            Some(Token::Float) => ScalarType::Float,
            Some(Token::Angle) => ScalarType::Angle,
            Some(Token::Bool) => ScalarType::Bool,
            Some(Token::Bit) => ScalarType::Bit,
            Some(other) => return Err(self.unexpected("type", &other)),
            None => return Err(ParseError::UnexpectedEof("type".into())),
        };
        Ok(ty)
    }

    /// Parse `int[32] n = 3;` (after an optional `const`).
    fn parse_classical_decl(&mut self, is_const: bool) -> ParseResult<Statement> {
        let ty = self.parse_scalar_type()?;
        let designator = self.parse_designator()?;
        let name = self.parse_identifier()?;
        let value = if self.consume(&Token::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect(Token::Semicolon)?;

        if is_const && value.is_none() {
            return Err(ParseError::Generic(format!(
                "const '{name}' must be initialised"
            )));
        }

        Ok(Statement::ClassicalDecl {
            ty,
            designator,
            name,
            value,
            is_const,
        })
    }

    /// Parse `input float theta;` or `output bit c;`
    fn parse_io_decl(&mut self, input: bool) -> ParseResult<Statement> {
        self.advance();
        let ty = self.parse_scalar_type()?;
        let designator = self.parse_designator()?;
        let name = self.parse_identifier()?;
        self.expect(Token::Semicolon)?;
        if input {
            Ok(Statement::InputDecl {
                ty,
                designator,
                name,
            })
        } else {
            Ok(Statement::OutputDecl {
                ty,
                designator,
                name,
            })
        }
    }

    /// Parse measure statement: `measure q -> c;` or `measure q;`
    fn parse_measure(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Measure)?;
        let qubits = self.parse_qubit_refs()?;
        let bits = if self.consume(&Token::Arrow) {
            self.parse_bit_refs()?
        } else {
            vec![]
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Measure { qubits, bits })
    }

    /// Parse reset statement.
    fn parse_reset(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Reset)?;
        let qubits = self.parse_qubit_refs()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Reset { qubits })
    }

    /// Parse barrier statement.
    fn parse_barrier(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Barrier)?;
        let qubits = if self.check(&Token::Semicolon) {
            vec![]
        } else {
            self.parse_qubit_refs()?
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Barrier { qubits })
    }

    /// Parse delay statement: `delay[100ns] q;`
    fn parse_delay(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Delay)?;
        self.expect(Token::LBracket)?;
        let duration = self.parse_expression()?;
        self.expect(Token::RBracket)?;
        let qubits = if self.check(&Token::Semicolon) {
            vec![]
        } else {
            self.parse_qubit_refs()?
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Delay { duration, qubits })
    }

    /// Parse if statement.
    fn parse_if(&mut self) -> ParseResult<Statement> {
        self.expect(Token::If)?;
        self.expect(Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RParen)?;

        let then_body = self.parse_block_or_statement()?;
        let else_body = if self.consume(&Token::Else) {
            Some(self.parse_block_or_statement()?)
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_body,
            else_body,
        })
    }

    /// Parse for loop: `for [type] i in [a:b] { ... }` or `in {a, b}`.
    fn parse_for(&mut self) -> ParseResult<Statement> {
        self.expect(Token::For)?;
        let ty = if self.check(&Token::Identifier(String::new())) {
            None
        } else {
            let ty = self.parse_scalar_type()?;
            self.parse_designator()?;
            Some(ty)
        };
        let variable = self.parse_identifier()?;
        self.expect(Token::In)?;

        let iterable = if self.consume(&Token::LBracket) {
            let start = self.parse_expression()?;
            self.expect(Token::Colon)?;
            let range = self.parse_range_tail(start)?;
            self.expect(Token::RBracket)?;
            ForIterable::Range(range)
        } else if self.consume(&Token::LBrace) {
            let mut values = vec![self.parse_expression()?];
            while self.consume(&Token::Comma) {
                values.push(self.parse_expression()?);
            }
            self.expect(Token::RBrace)?;
            ForIterable::Set(values)
        } else {
            let found = self
                .advance()
                .ok_or_else(|| ParseError::UnexpectedEof("loop range".into()))?;
            return Err(self.unexpected("range or set", &found));
        };

        let body = self.parse_block_or_statement()?;

        Ok(Statement::For {
            variable,
            ty,
            iterable,
            body,
        })
    }

    /// Parse the rest of `start:end` or `start:step:end` after the first colon.
    fn parse_range_tail(&mut self, start: Expression) -> ParseResult<Range> {
        let second = self.parse_expression()?;
        if self.consume(&Token::Colon) {
            let end = self.parse_expression()?;
            Ok(Range {
                start,
                step: Some(second),
                end,
            })
        } else {
            Ok(Range {
                start,
                step: None,
                end: second,
            })
        }
    }

    /// Parse while loop.
    fn parse_while(&mut self) -> ParseResult<Statement> {
        self.expect(Token::While)?;
        self.expect(Token::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(Token::RParen)?;
        let body = self.parse_block_or_statement()?;
        Ok(Statement::While { condition, body })
    }

    /// Parse `name(params) a, b` shared by gate and opaque definitions.
    fn parse_gate_signature(&mut self) -> ParseResult<(String, Vec<String>, Vec<String>)> {
        let name = self.parse_identifier()?;
        let params = if self.consume(&Token::LParen) {
            let p = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.parse_identifier_list()?
            };
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };
        let qubits = self.parse_identifier_list()?;
        Ok((name, params, qubits))
    }

    /// Parse gate definition.
    fn parse_gate_def(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Gate)?;
        let (name, params, qubits) = self.parse_gate_signature()?;
        let body = self.parse_block()?;
        Ok(Statement::GateDef {
            name,
            params,
            qubits,
            body,
        })
    }

    /// Parse opaque declaration.
    fn parse_opaque(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Opaque)?;
        let (name, params, qubits) = self.parse_gate_signature()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::OpaqueDef {
            name,
            params,
            qubits,
        })
    }

    /// Parse subroutine definition.
    fn parse_subroutine_def(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Def)?;
        let name = self.parse_identifier()?;
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        if !self.check(&Token::RParen) {
            loop {
                params.push(self.parse_subroutine_param()?);
                if !self.consume(&Token::Comma) {
                    break;
                }
            }
        }
        self.expect(Token::RParen)?;

        let return_type = if self.consume(&Token::Arrow) {
            let ty = self.parse_scalar_type()?;
            self.parse_designator()?;
            Some(ty)
        } else {
            None
        };

        let body = self.parse_block()?;
        Ok(Statement::SubroutineDef {
            name,
            params,
            return_type,
            body,
        })
    }

    fn parse_subroutine_param(&mut self) -> ParseResult<SubroutineParam> {
        if self.consume(&Token::Qubit) {
            let size = self.parse_designator()?;
            let name = self.parse_identifier()?;
            return Ok(SubroutineParam::Qubit { name, size });
        }
        let ty = self.parse_scalar_type()?;
        let designator = self.parse_designator()?;
        let name = self.parse_identifier()?;
        Ok(SubroutineParam::Classical {
            ty,
            designator,
            name,
        })
    }

    /// Parse `return;` or `return expr;`
    fn parse_return(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Return)?;
        let value = if self.check(&Token::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(Token::Semicolon)?;
        Ok(Statement::Return(value))
    }

    /// Parse `ctrl(2) @ inv @ name(params) qubits;`
    fn parse_modified_gate(&mut self) -> ParseResult<Statement> {
        let mut modifiers = Vec::new();
        loop {
            let modifier = match self.peek().cloned() {
                Some(Token::Ctrl) => {
                    self.advance();
                    GateModifier::Ctrl(self.parse_modifier_arg()?)
                }
                Some(Token::NegCtrl) => {
                    self.advance();
                    GateModifier::NegCtrl(self.parse_modifier_arg()?)
                }
                Some(Token::Inv) => {
                    self.advance();
                    GateModifier::Inv
                }
                Some(Token::Pow) => {
                    self.advance();
                    self.expect(Token::LParen)?;
                    let exponent = self.parse_expression()?;
                    self.expect(Token::RParen)?;
                    GateModifier::Pow(exponent)
                }
                _ => break,
            };
            self.expect(Token::At)?;
            modifiers.push(modifier);
        }

        let name = self.parse_identifier()?;
        let mut call = self.parse_gate_call(name)?;
        call.modifiers = modifiers;
        Ok(Statement::Gate(call))
    }

    fn parse_modifier_arg(&mut self) -> ParseResult<Option<Expression>> {
        if self.consume(&Token::LParen) {
            let n = self.parse_expression()?;
            self.expect(Token::RParen)?;
            Ok(Some(n))
        } else {
            Ok(None)
        }
    }

    /// Parse statement starting with identifier: gate call, subroutine
    /// call or assignment.
    fn parse_identifier_statement(&mut self) -> ParseResult<Statement> {
        let name = self.parse_identifier()?;

        match self.peek().cloned() {
            Some(Token::LBracket | Token::Eq) => return self.parse_assignment(name, None),
            Some(Token::PlusEq) => return self.parse_assignment(name, Some(BinOp::Add)),
            Some(Token::MinusEq) => return self.parse_assignment(name, Some(BinOp::Sub)),
            Some(Token::StarEq) => return self.parse_assignment(name, Some(BinOp::Mul)),
            Some(Token::SlashEq) => return self.parse_assignment(name, Some(BinOp::Div)),
            _ => {}
        }

        let call = self.parse_gate_call(name)?;
        Ok(match call {
            GateCall { name, params, qubits, .. } if qubits.is_empty() => Statement::Call {
                name,
                args: params,
            },
            call => Statement::Gate(call),
        })
    }

    /// Parse assignment statement. `op` is set for compound assignments.
    fn parse_assignment(&mut self, target: String, op: Option<BinOp>) -> ParseResult<Statement> {
        let index = if op.is_none() && self.consume(&Token::LBracket) {
            let index = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            Some(index)
        } else {
            None
        };

        match op {
            None => self.expect(Token::Eq)?,
            Some(_) => {
                self.advance();
            }
        }

        if op.is_none() && self.consume(&Token::Measure) {
            let qubits = self.parse_qubit_refs()?;
            self.expect(Token::Semicolon)?;
            let bits = vec![BitRef::Single {
                register: target,
                index,
            }];
            return Ok(Statement::Measure { qubits, bits });
        }

        let value = self.parse_expression()?;
        self.expect(Token::Semicolon)?;

        Ok(Statement::Assignment {
            target,
            index,
            op,
            value,
        })
    }

    /// Parse the remainder of a gate call: `(params) qubits;`. A call
    /// with parameters but no operands is returned with empty `qubits`.
    fn parse_gate_call(&mut self, name: String) -> ParseResult<GateCall> {
        let params = if self.consume(&Token::LParen) {
            let p = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            p
        } else {
            vec![]
        };

        let qubits = if self.check(&Token::Semicolon) {
            vec![]
        } else {
            self.parse_qubit_refs()?
        };
        self.expect(Token::Semicolon)?;

        Ok(GateCall {
            name,
            params,
            qubits,
            modifiers: vec![],
        })
    }

    /// Parse `{ statements }`.
    fn parse_block(&mut self) -> ParseResult<Vec<Statement>> {
        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.check(&Token::RBrace) {
            if self.is_eof() {
                return Err(ParseError::UnexpectedEof("'}'".into()));
            }
            body.push(self.parse_statement()?);
        }
        self.expect(Token::RBrace)?;
        Ok(body)
    }

    /// Parse a block or single statement.
    pub(super) fn parse_block_or_statement(&mut self) -> ParseResult<Vec<Statement>> {
        if self.check(&Token::LBrace) {
            self.parse_block()
        } else {
            Ok(vec![self.parse_statement()?])
        }
    }

    /// Parse `register` or `register[index]` or `register[a:b]` after
    /// the register name, returning the index part.
    fn parse_operand_index(&mut self) -> ParseResult<OperandIndex> {
        if !self.consume(&Token::LBracket) {
            return Ok(OperandIndex::Whole);
        }
        let first = self.parse_expression()?;
        let index = if self.consume(&Token::Colon) {
            OperandIndex::Range(self.parse_range_tail(first)?)
        } else {
            OperandIndex::Single(first)
        };
        self.expect(Token::RBracket)?;
        Ok(index)
    }

    /// Parse qubit references.
    pub(super) fn parse_qubit_refs(&mut self) -> ParseResult<Vec<QubitRef>> {
        let mut refs = vec![self.parse_qubit_ref()?];
        while self.consume(&Token::Comma) {
            refs.push(self.parse_qubit_ref()?);
        }
        Ok(refs)
    }

    /// Parse a single qubit reference.
    fn parse_qubit_ref(&mut self) -> ParseResult<QubitRef> {
        let register = self.parse_identifier()?;
        Ok(match self.parse_operand_index()? {
            OperandIndex::Whole => QubitRef::Single {
                register,
                index: None,
            },
            OperandIndex::Single(index) => QubitRef::Single {
                register,
                index: Some(index),
            },
            OperandIndex::Range(range) => QubitRef::Range { register, range },
        })
    }

    /// Parse bit references.
    fn parse_bit_refs(&mut self) -> ParseResult<Vec<BitRef>> {
        let mut refs = vec![self.parse_bit_ref()?];
        while self.consume(&Token::Comma) {
            refs.push(self.parse_bit_ref()?);
        }
        Ok(refs)
    }

    /// Parse a single bit reference.
    fn parse_bit_ref(&mut self) -> ParseResult<BitRef> {
        let register = self.parse_identifier()?;
        Ok(match self.parse_operand_index()? {
            OperandIndex::Whole => BitRef::Single {
                register,
                index: None,
            },
            OperandIndex::Single(index) => BitRef::Single {
                register,
                index: Some(index),
            },
            OperandIndex::Range(range) => BitRef::Range { register, range },
        })
    }
}

enum OperandIndex {
    Whole,
    Single(Expression),
    Range(Range),
}
