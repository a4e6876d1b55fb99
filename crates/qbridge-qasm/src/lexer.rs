//! Lexer for `OpenQASM` 2 and 3.

use logos::Logos;

/// Tokens for `OpenQASM` 2 and 3.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*[^*]*\*+(?:[^/*][^*]*\*+)*/")]
pub enum Token {
    // Keywords
    #[token("OPENQASM")]
    OpenQasm,

    #[token("include")]
    Include,

    #[token("qubit")]
    Qubit,

    #[token("qreg")]
    Qreg,

    #[token("bit")]
    Bit,

    #[token("creg")]
    Creg,

    #[token("int")]
    Int,

    #[token("uint")]
    Uint,

    #[token("float")]
    Float,

    #[token("angle")]
    Angle,

    #[token("bool")]
    Bool,

    #[token("const")]
    Const,

    #[token("gate")]
    Gate,

    #[token("opaque")]
    Opaque,

    #[token("def")]
    Def,

    #[token("if")]
    If,

    #[token("else")]
    Else,

    #[token("for")]
    For,

    #[token("while")]
    While,

    #[token("in")]
    In,

    #[token("return")]
    Return,

    #[token("measure")]
    Measure,

    #[token("reset")]
    Reset,

    #[token("barrier")]
    Barrier,

    #[token("delay")]
    Delay,

    #[token("input")]
    Input,

    #[token("output")]
    Output,

    // Gate modifiers
    #[token("ctrl")]
    Ctrl,

    #[token("negctrl")]
    NegCtrl,

    #[token("inv")]
    Inv,

    #[token("pow")]
    Pow,

    // Constants
    #[token("pi")]
    #[token("π")]
    Pi,

    #[token("tau")]
    #[token("τ")]
    Tau,

    #[token("euler")]
    #[token("ℇ")]
    Euler,

    #[token("true")]
    True,

    #[token("false")]
    False,

    // Literals
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    FloatLiteral(f64),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<u64>().ok())]
    IntLiteral(u64),

    #[regex(r"([0-9]+|[0-9]+\.[0-9]+)(dt|ns|us|µs|ms|s)", |lex| lex.slice().to_string())]
    DurationLiteral(String),

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        Some(s[1..s.len()-1].to_string())
    })]
    StringLiteral(String),

    // Identifiers
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Identifier(String),

    // Operators and punctuation
    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("**")]
    Power,

    #[token("==")]
    EqEq,

    #[token("!=")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("&&")]
    And,

    #[token("||")]
    Or,

    #[token("!")]
    Not,

    #[token("~")]
    Tilde,

    #[token("&")]
    Ampersand,

    #[token("|")]
    Pipe,

    #[token("^")]
    Caret,

    #[token("<<")]
    LShift,

    #[token(">>")]
    RShift,

    #[token("=")]
    Eq,

    #[token("+=")]
    PlusEq,

    #[token("-=")]
    MinusEq,

    #[token("*=")]
    StarEq,

    #[token("/=")]
    SlashEq,

    #[token("->")]
    Arrow,

    #[token("@")]
    At,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenQasm => write!(f, "OPENQASM"),
            Token::Include => write!(f, "include"),
            Token::Qubit => write!(f, "qubit"),
            Token::Qreg => write!(f, "qreg"),
            Token::Bit => write!(f, "bit"),
            Token::Creg => write!(f, "creg"),
            Token::Int => write!(f, "int"),
            Token::Uint => write!(f, "uint"),
            Token::Float => write!(f, "float"),
            Token::Angle => write!(f, "angle"),
            Token::Bool => write!(f, "bool"),
            Token::Const => write!(f, "const"),
            Token::Gate => write!(f, "gate"),
            Token::Opaque => write!(f, "opaque"),
            Token::Def => write!(f, "def"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::For => write!(f, "for"),
            Token::While => write!(f, "while"),
            Token::In => write!(f, "in"),
            Token::Return => write!(f, "return"),
            Token::Measure => write!(f, "measure"),
            Token::Reset => write!(f, "reset"),
            Token::Barrier => write!(f, "barrier"),
            Token::Delay => write!(f, "delay"),
            Token::Input => write!(f, "input"),
            Token::Output => write!(f, "output"),
            Token::Ctrl => write!(f, "ctrl"),
            Token::NegCtrl => write!(f, "negctrl"),
            Token::Inv => write!(f, "inv"),
            Token::Pow => write!(f, "pow"),
            Token::Pi => write!(f, "pi"),
            Token::Tau => write!(f, "tau"),
            Token::Euler => write!(f, "euler"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::FloatLiteral(v) => write!(f, "{v}"),
            Token::IntLiteral(v) => write!(f, "{v}"),
            Token::DurationLiteral(s) | Token::Identifier(s) => write!(f, "{s}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Power => write!(f, "**"),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::LtEq => write!(f, "<="),
            Token::Gt => write!(f, ">"),
            Token::GtEq => write!(f, ">="),
            Token::And => write!(f, "&&"),
            Token::Or => write!(f, "||"),
            Token::Not => write!(f, "!"),
            Token::Tilde => write!(f, "~"),
            Token::Ampersand => write!(f, "&"),
            Token::Pipe => write!(f, "|"),
            Token::Caret => write!(f, "^"),
            Token::LShift => write!(f, "<<"),
            Token::RShift => write!(f, ">>"),
            Token::Eq => write!(f, "="),
            Token::PlusEq => write!(f, "+="),
            Token::MinusEq => write!(f, "-="),
            Token::StarEq => write!(f, "*="),
            Token::SlashEq => write!(f, "/="),
            Token::Arrow => write!(f, "->"),
            Token::At => write!(f, "@"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::Comma => write!(f, ","),
        }
    }
}

/// A token with its span and 1-based line number.
#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: std::ops::Range<usize>,
    pub line: usize,
}

/// Tokenize a QASM source string.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken, (std::ops::Range<usize>, String)>> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();
    let mut line = 1;
    let mut scanned = 0;

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        line += source[scanned..span.start].matches('\n').count();
        scanned = span.start;
        if let Ok(token) = result {
            tokens.push(Ok(SpannedToken { token, span, line }));
        } else {
            let slice = &source[span.clone()];
            tokens.push(Err((span, format!("Invalid token: '{slice}'"))));
        }
    }

    tokens
}

/// Sniff the major version from an `OPENQASM <major>.<minor>;` header,
/// skipping leading whitespace and comments. Only the first two tokens
/// are lexed.
pub fn header_version(source: &str) -> Option<u32> {
    let mut lexer = Token::lexer(source);
    if !matches!(lexer.next(), Some(Ok(Token::OpenQasm))) {
        return None;
    }
    match lexer.next() {
        Some(Ok(Token::FloatLiteral(v))) if v >= 0.0 => Some(v.trunc() as u32),
        Some(Ok(Token::IntLiteral(v))) => u32::try_from(v).ok(),
        _ => None,
    }
}
