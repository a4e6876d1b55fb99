//! Recursive-descent parser for `OpenQASM` 2 and 3.

mod expression;
mod statement;

use crate::ast::Program;
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Parse a QASM source string into an AST [`Program`].
///
/// The `OPENQASM` header is optional here; a missing header leaves
/// [`Program::version`] empty.
pub fn parse_program(source: &str) -> ParseResult<Program> {
    let mut parser = Parser::new(source)?;
    parser.parse_program()
}

/// Parser state.
pub(super) struct Parser {
    pub(super) tokens: Vec<SpannedToken>,
    pub(super) pos: usize,
}

impl Parser {
    /// Create a new parser from source.
    fn new(source: &str) -> ParseResult<Self> {
        let mut tokens = Vec::new();
        for result in tokenize(source) {
            match result {
                Ok(t) => tokens.push(t),
                Err((span, msg)) => {
                    return Err(ParseError::LexerError {
                        position: span.start,
                        message: msg,
                    });
                }
            }
        }
        Ok(Self { tokens, pos: 0 })
    }

    /// Line of the most recently consumed token.
    pub(super) fn line(&self) -> usize {
        self.tokens
            .get(self.pos.saturating_sub(1))
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    /// Check if we've reached the end.
    pub(super) fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token.
    pub(super) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance and return the current token.
    pub(super) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    /// Build an unexpected-token error at the current line.
    pub(super) fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            line: self.line(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Expect a specific token.
    #[allow(clippy::needless_pass_by_value)]
    pub(super) fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {expected}")))?;

        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(self.unexpected(&expected.to_string(), &found));
        }
        Ok(())
    }

    /// Check if current token matches.
    pub(super) fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    /// Consume token if it matches.
    pub(super) fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Parse the entire program.
    fn parse_program(&mut self) -> ParseResult<Program> {
        let version = if self.consume(&Token::OpenQasm) {
            let version = self.parse_version()?;
            self.expect(Token::Semicolon)?;
            Some(version)
        } else {
            None
        };

        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program {
            version,
            statements,
        })
    }

    /// Parse version number.
    fn parse_version(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::FloatLiteral(v)) if v.fract() == 0.0 => Ok(format!("{v:.1}")),
            Some(Token::FloatLiteral(v)) => Ok(format!("{v}")),
            Some(Token::IntLiteral(v)) => Ok(format!("{v}.0")),
            Some(other) => Err(ParseError::InvalidVersion(other.to_string())),
            None => Err(ParseError::UnexpectedEof("version number".into())),
        }
    }

    /// Parse identifier list.
    pub(super) fn parse_identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.parse_identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.parse_identifier()?);
        }
        Ok(ids)
    }

    /// Parse an identifier.
    pub(super) fn parse_identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            Some(other) => Err(self.unexpected("identifier", &other)),
            None => Err(ParseError::UnexpectedEof("identifier".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, QubitRef, Statement};

    #[test]
    fn test_parse_bell_state() {
        let source = r"
            OPENQASM 3.0;
            qubit[2] q;
            bit[2] c;
            h q[0];
            cx q[0], q[1];
            c = measure q;
        ";

        let program = parse_program(source).unwrap();
        assert_eq!(program.version.as_deref(), Some("3.0"));
        assert_eq!(program.statements.len(), 5);
        assert!(matches!(program.statements[4], Statement::Measure { .. }));
    }

    #[test]
    fn test_parse_qasm2() {
        let source = r#"
            OPENQASM 2.0;
            include "qelib1.inc";
            qreg q[2];
            creg c[2];
            h q;
            cx q[0],q[1];
            measure q -> c;
        "#;

        let program = parse_program(source).unwrap();
        assert_eq!(program.major_version(), Some(2));
        assert_eq!(program.statements[0], Statement::Include("qelib1.inc".into()));
        assert_eq!(
            program.statements[1],
            Statement::QubitDecl {
                name: "q".into(),
                size: Some(Expression::Int(2)),
            }
        );
        let Statement::Gate(call) = &program.statements[3] else {
            panic!("expected gate call");
        };
        assert_eq!(call.qubits, vec![QubitRef::register("q")]);
    }

    #[test]
    fn test_parse_without_header() {
        let program = parse_program("qubit q; x q;").unwrap();
        assert!(program.version.is_none());
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_parse_error_reports_line() {
        let source = "OPENQASM 3.0;\nqubit q;\nh q\nx q;";
        let err = parse_program(source).unwrap_err();
        match err {
            ParseError::UnexpectedToken { line, .. } => assert_eq!(line, 4),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_version() {
        let err = parse_program("OPENQASM foo;").unwrap_err();
        assert!(matches!(err, ParseError::InvalidVersion(_)));
    }

    #[test]
    fn test_lexer_error() {
        let err = parse_program("OPENQASM 3.0; qubit q; h q$;").unwrap_err();
        assert!(matches!(err, ParseError::LexerError { .. }));
    }
}
