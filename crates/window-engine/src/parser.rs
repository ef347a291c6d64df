//! The rule language.
//!
//! A program binds named windows and returns one of them:
//!
//! ```text
//! from context import on_call
//!
//! let work_hour be when 9:30~13:30 | 14:30~18:30
//! let work_day be when mon | tue | wed | thu | fri
//! let holiday be when 25 & dec | 1 & jan
//!
//! return (work_hour & work_day | on_call) - holiday
//! ```
//!
//! # Grammar
//!
//! ```text
//! program    := statement* "return" expr EOF
//! statement  := "let" NAME "be" "when" expr
//!             | "from" "context" "import" NAME ("," NAME)*
//! expr       := inter (("|" | "^") inter)*
//! inter      := diff ("&" diff)*
//! diff       := unary ("-" unary)*
//! unary      := "~" unary | primary
//! primary    := "(" expr ")" | "always" | "never" | WEEKDAY | MONTH
//!             | DAY | H:MM~H:MM | NAME
//! ```
//!
//! Binary operators are left-associative. Imported context flags become
//! constants at parse time; `let` bodies are shared, not copied, wherever
//! their name is used.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use logos::Logos;

use crate::calendar::{parse_month, parse_weekday, DayOfMonth, Month, WeekDay};
use crate::dst::{BoundaryPinning, DurationPolicy};
use crate::error::{Result, WindowError};
use crate::hour_range::HourRange;
use crate::predicate::Predicate;

/// Options for [`parse_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Pinning stamped on every hour-range literal.
    pub pinning: BoundaryPinning,
    /// Duration policy stamped on every hour-range literal.
    pub duration: DurationPolicy,
}

/// Parse a rule program with default hour-range policies.
///
/// `context` supplies the values of flags named in `from context import`.
///
/// # Errors
///
/// Returns [`WindowError::Syntax`] for malformed input,
/// [`WindowError::UnboundName`] for names that are neither bound nor imported
/// (or imported but missing from `context`), and
/// [`WindowError::InvalidInterval`] for out-of-range literals.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use window_engine::parse;
///
/// let window = parse("let a be when mon | wed\nreturn a", &HashMap::new()).unwrap();
/// assert_eq!(window.to_string(), "(mon | wed)");
/// ```
pub fn parse(source: &str, context: &HashMap<String, bool>) -> Result<Predicate> {
    parse_with_options(source, context, &ParseOptions::default())
}

/// Parse a rule program, applying `options` to every hour range.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_with_options(
    source: &str,
    context: &HashMap<String, bool>,
    options: &ParseOptions,
) -> Result<Predicate> {
    let tokens = lex(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        context,
        options: *options,
        bindings: HashMap::new(),
        imports: 0,
    };
    let root = parser.program()?;
    tracing::debug!(
        bindings = parser.bindings.len(),
        imports = parser.imports,
        "parsed window program"
    );
    Ok(Arc::unwrap_or_clone(root))
}

// ── Tokens ──────────────────────────────────────────────────────────────────

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(error = LexError)]
#[logos(skip r"[ \t\r\n\f]+")]
enum TokenKind {
    #[token("let")]
    Let,
    #[token("be")]
    Be,
    #[token("when")]
    When,
    #[token("return")]
    Return,
    #[token("from")]
    From,
    #[token("import")]
    Import,
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    #[regex(r"[0-9]+", day_literal)]
    Day(u32),
    // Anything shaped like a clock reading is claimed here and validated in
    // the callback, so a malformed range is one error, not a stray `:`.
    #[regex(r"[0-9]+:[0-9]*(~[0-9]*(:[0-9]*)?)?", clock_range)]
    Range(ClockRange),
    #[token("|")]
    Pipe,
    #[token("&")]
    Amp,
    #[token("-")]
    Minus,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(",")]
    Comma,
    Eof,
}

/// The two `(hour, minute)` readings of an `H:MM~H:MM` literal, not yet
/// range-checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClockRange {
    begin: (u32, u32),
    end: (u32, u32),
}

#[derive(Debug, Clone, PartialEq, Default)]
enum LexError {
    #[default]
    UnexpectedCharacter,
    Malformed(String),
}

fn day_literal(lex: &mut logos::Lexer<TokenKind>) -> std::result::Result<u32, LexError> {
    let digits = lex.slice();
    digits
        .parse()
        .map_err(|_| LexError::Malformed(format!("number '{digits}' is too large")))
}

fn clock_range(lex: &mut logos::Lexer<TokenKind>) -> std::result::Result<ClockRange, LexError> {
    let literal = lex.slice();
    let malformed = || LexError::Malformed(format!("malformed hour range '{literal}'"));
    let (begin, end) = literal.split_once('~').ok_or_else(malformed)?;
    Ok(ClockRange {
        begin: clock_reading(begin).ok_or_else(malformed)?,
        end: clock_reading(end).ok_or_else(malformed)?,
    })
}

/// `H:MM` or `HH:MM`.
fn clock_reading(text: &str) -> Option<(u32, u32)> {
    let (hours, minutes) = text.split_once(':')?;
    if !(1..=2).contains(&hours.len()) || minutes.len() != 2 {
        return None;
    }
    Some((hours.parse().ok()?, minutes.parse().ok()?))
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Let => f.write_str("'let'"),
            TokenKind::Be => f.write_str("'be'"),
            TokenKind::When => f.write_str("'when'"),
            TokenKind::Return => f.write_str("'return'"),
            TokenKind::From => f.write_str("'from'"),
            TokenKind::Import => f.write_str("'import'"),
            TokenKind::Ident(name) => write!(f, "'{name}'"),
            TokenKind::Day(day) => write!(f, "'{day}'"),
            TokenKind::Range(ClockRange { begin, end }) => {
                write!(f, "'{}:{:02}~{}:{:02}'", begin.0, begin.1, end.0, end.1)
            }
            TokenKind::Pipe => f.write_str("'|'"),
            TokenKind::Amp => f.write_str("'&'"),
            TokenKind::Minus => f.write_str("'-'"),
            TokenKind::Caret => f.write_str("'^'"),
            TokenKind::Tilde => f.write_str("'~'"),
            TokenKind::LParen => f.write_str("'('"),
            TokenKind::RParen => f.write_str("')'"),
            TokenKind::Comma => f.write_str("','"),
            TokenKind::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    line: usize,
    column: usize,
}

// ── Lexer ───────────────────────────────────────────────────────────────────

/// Tokenize `source`, ending the stream with [`TokenKind::Eof`].
fn lex(source: &str) -> Result<Vec<Token>> {
    let lines = LineIndex::new(source);
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let (line, column) = lines.position(span.start);
        let kind = result.map_err(|error| {
            let message = match error {
                LexError::Malformed(message) => message,
                LexError::UnexpectedCharacter => {
                    let found = source[span.start..].chars().next().unwrap_or_default();
                    format!("unexpected character '{found}'")
                }
            };
            WindowError::Syntax {
                line,
                column,
                message,
            }
        })?;
        tokens.push(Token { kind, line, column });
    }

    let (line, column) = lines.position(source.len());
    tokens.push(Token {
        kind: TokenKind::Eof,
        line,
        column,
    });
    Ok(tokens)
}

/// Byte offset to 1-based line and column (in characters).
struct LineIndex<'a> {
    source: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(source: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { source, starts }
    }

    fn position(&self, offset: usize) -> (usize, usize) {
        let line = self.starts.partition_point(|&start| start <= offset);
        let line_start = self.starts[line - 1];
        let column = self.source[line_start..offset].chars().count() + 1;
        (line, column)
    }
}

// ── Parser ──────────────────────────────────────────────────────────────────

struct Parser<'c> {
    tokens: Vec<Token>,
    pos: usize,
    context: &'c HashMap<String, bool>,
    options: ParseOptions,
    bindings: HashMap<String, Arc<Predicate>>,
    imports: usize,
}

impl Parser<'_> {
    fn program(&mut self) -> Result<Arc<Predicate>> {
        loop {
            match self.peek().kind {
                TokenKind::Let => self.binding()?,
                TokenKind::From => self.import()?,
                TokenKind::Return => {
                    self.advance();
                    let root = self.expression()?;
                    self.expect(TokenKind::Eof)?;
                    return Ok(root);
                }
                _ => return Err(self.unexpected("'let', 'from' or 'return'")),
            }
        }
    }

    fn binding(&mut self) -> Result<()> {
        self.expect(TokenKind::Let)?;
        let name = self.name()?;
        self.expect(TokenKind::Be)?;
        self.expect(TokenKind::When)?;
        let body = self.expression()?;
        self.bindings.insert(name, body);
        Ok(())
    }

    fn import(&mut self) -> Result<()> {
        self.expect(TokenKind::From)?;
        if !matches!(&self.peek().kind, TokenKind::Ident(source) if source == "context") {
            return Err(self.unexpected("'context'"));
        }
        self.advance();
        self.expect(TokenKind::Import)?;
        loop {
            let token = self.peek().clone();
            let name = self.name()?;
            let value = self.context.get(&name).copied().ok_or_else(|| {
                WindowError::UnboundName {
                    name: name.clone(),
                    line: token.line,
                    column: token.column,
                }
            })?;
            self.bindings
                .insert(name, Arc::new(Predicate::Constant(value)));
            self.imports += 1;
            if self.peek().kind != TokenKind::Comma {
                return Ok(());
            }
            self.advance();
        }
    }

    /// A bindable identifier.
    fn name(&mut self) -> Result<String> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(name) if !is_reserved(&name) => {
                self.advance();
                Ok(name)
            }
            TokenKind::Ident(name) => Err(WindowError::Syntax {
                line: token.line,
                column: token.column,
                message: format!("'{name}' is reserved and cannot be used as a name"),
            }),
            _ => Err(self.unexpected("a name")),
        }
    }

    fn expression(&mut self) -> Result<Arc<Predicate>> {
        let mut lhs = self.intersection()?;
        loop {
            let node: fn(Arc<Predicate>, Arc<Predicate>) -> Predicate = match self.peek().kind {
                TokenKind::Pipe => Predicate::Union,
                TokenKind::Caret => Predicate::SymmetricDifference,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.intersection()?;
            lhs = Arc::new(node(lhs, rhs));
        }
    }

    fn intersection(&mut self) -> Result<Arc<Predicate>> {
        let mut lhs = self.difference()?;
        while self.peek().kind == TokenKind::Amp {
            self.advance();
            let rhs = self.difference()?;
            lhs = Arc::new(Predicate::Intersection(lhs, rhs));
        }
        Ok(lhs)
    }

    fn difference(&mut self) -> Result<Arc<Predicate>> {
        let mut lhs = self.unary()?;
        while self.peek().kind == TokenKind::Minus {
            self.advance();
            let rhs = self.unary()?;
            lhs = Arc::new(Predicate::Difference(lhs, rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Arc<Predicate>> {
        if self.peek().kind == TokenKind::Tilde {
            self.advance();
            let inner = self.unary()?;
            return Ok(Arc::new(Predicate::Complement(inner)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Arc<Predicate>> {
        let token = self.peek().clone();
        let node = match token.kind {
            TokenKind::LParen => {
                self.advance();
                let inner = self.expression()?;
                self.expect(TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::Day(day) => Predicate::DayOfMonth(DayOfMonth::new(day)?),
            TokenKind::Range(ClockRange { begin, end }) => {
                let range = HourRange::from_hm(begin.0, begin.1, end.0, end.1)?
                    .with_pinning(self.options.pinning)
                    .with_duration_policy(self.options.duration);
                Predicate::HourRange(range)
            }
            TokenKind::Ident(ref name) => {
                if let Some(atom) = atom_for_word(name) {
                    atom
                } else if let Some(bound) = self.bindings.get(name) {
                    let bound = Arc::clone(bound);
                    self.advance();
                    return Ok(bound);
                } else {
                    return Err(WindowError::UnboundName {
                        name: name.clone(),
                        line: token.line,
                        column: token.column,
                    });
                }
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(Arc::new(node))
    }

    fn peek(&self) -> &Token {
        // The lexer always ends the stream with `Eof`, and `advance` never
        // moves past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<()> {
        if self.peek().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn unexpected(&self, expected: &str) -> WindowError {
        let token = self.peek();
        WindowError::Syntax {
            line: token.line,
            column: token.column,
            message: format!("expected {expected}, found {}", token.kind),
        }
    }
}

/// Built-in atoms spelled as words.
fn atom_for_word(word: &str) -> Option<Predicate> {
    match word {
        "always" => Some(Predicate::Always),
        "never" => Some(Predicate::Never),
        _ => parse_weekday(word)
            .map(|day| Predicate::WeekDay(WeekDay::new(day)))
            .or_else(|| parse_month(word).map(|month| Predicate::Month(Month::new(month)))),
    }
}

fn is_reserved(word: &str) -> bool {
    word == "context" || atom_for_word(word).is_some()
}

// ── Tests ───────────────────────────────────────────────────────────────────
