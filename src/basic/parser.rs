//! BASIC parser - produces an AST
//!
//! The program is parsed one source line at a time. A block THEN pulls its
//! indented continuation lines out of the same [`LineCursor`] the top-level
//! loop reads from, so those lines are never seen by the outer loop.
//!
//! Variable declarations are applied to the [`VariableStore`] while parsing.

use crate::basic::error::BasicError;
use crate::basic::lexer::{Line, Token, TokenKind};
use crate::basic::variables::{Sigil, VariableStore};

/// Reserved words
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Print,
    Cls,
    End,
    GoTo,
    If,
    Then,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "PRINT" => Some(Keyword::Print),
            "CLS" => Some(Keyword::Cls),
            "END" => Some(Keyword::End),
            "GOTO" => Some(Keyword::GoTo),
            "IF" => Some(Keyword::If),
            "THEN" => Some(Keyword::Then),
            _ => None,
        }
    }
}

/// Argument of a PRINT statement
#[derive(Clone, Debug, PartialEq)]
pub enum PrintArg {
    Number(i64),
    Text(String),
    /// Looked up when the statement runs
    Variable(String),
}

/// Comparison operators accepted in IF conditions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Lt,
    Gt,
}

impl Comparator {
    /// Searched in this order; the first one present in a condition wins.
    const PRIORITY: [(char, Comparator); 3] =
        [('=', Comparator::Eq), ('<', Comparator::Lt), ('>', Comparator::Gt)];

    fn is_comparator_char(c: char) -> bool {
        matches!(c, '=' | '<' | '>')
    }
}

/// `left comparator right`, operands kept as written
#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub left: String,
    pub comparator: Comparator,
    pub right: String,
}

impl Condition {
    /// Split condition text. `None` if no comparator is present.
    pub fn parse(text: &str) -> Option<Self> {
        let comparator = Comparator::PRIORITY
            .iter()
            .find(|(c, _)| text.contains(*c))
            .map(|(_, cmp)| *cmp)?;

        let start = text.find(Comparator::is_comparator_char)?;
        let left = &text[..start];
        let rest = text[start..].trim_start_matches(Comparator::is_comparator_char);
        let right = match rest.find(Comparator::is_comparator_char) {
            Some(end) => &rest[..end],
            None => rest,
        };

        Some(Self {
            left: left.to_string(),
            comparator,
            right: right.to_string(),
        })
    }
}

/// What runs when an IF condition holds
#[derive(Clone, Debug, PartialEq)]
pub enum Then {
    /// `IF ... THEN 30`
    Line(i64),
    /// `IF ... THEN` followed by indented lines
    Block(Vec<LineRecord>),
}

/// Statement types
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Print(PrintArg),
    Cls,
    End,
    GoTo(i64),
    If {
        condition: Condition,
        then_branch: Then,
    },
    /// Variable declaration. The value was stored during parsing; at run time
    /// this does nothing but keeps the line addressable as a jump target.
    Declare(String),
}

/// A numbered source line and its statements
#[derive(Clone, Debug, PartialEq)]
pub struct LineRecord {
    pub number: i64,
    pub statements: Vec<Stmt>,
}

/// Parsed program, lines in source order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub lines: Vec<LineRecord>,
}

impl Program {
    /// Index of the first line numbered `number`
    pub fn position_of(&self, number: i64) -> Option<usize> {
        self.lines.iter().position(|line| line.number == number)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Cursor over the lexed lines not yet parsed
#[derive(Debug)]
pub struct LineCursor {
    lines: std::vec::IntoIter<Line>,
}

impl LineCursor {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines: lines.into_iter() }
    }

    pub fn next_line(&mut self) -> Option<Line> {
        self.lines.next()
    }

    /// Take the next line only if it continues a block THEN
    pub fn next_continuation(&mut self) -> Option<Line> {
        if self.lines.as_slice().first().is_some_and(Line::is_continuation) {
            self.lines.next()
        } else {
            None
        }
    }

    pub fn remaining(&self) -> usize {
        self.lines.len()
    }
}

/// Tokens of the line being parsed
struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}

/// Parser for BASIC
pub struct Parser<'v> {
    cursor: LineCursor,
    variables: &'v mut VariableStore,
}

impl<'v> Parser<'v> {
    pub fn new(lines: Vec<Line>, variables: &'v mut VariableStore) -> Self {
        Self { cursor: LineCursor::new(lines), variables }
    }

    /// Parse the entire program
    pub fn parse(&mut self) -> Result<Program, BasicError> {
        let mut program = Program::default();

        while let Some(line) = self.cursor.next_line() {
            let record = self.parse_line(line)?;
            if record.statements.is_empty() {
                continue;
            }
            program.lines.push(record);
        }

        tracing::debug!(lines = program.len(), variables = self.variables.len(), "program parsed");
        Ok(program)
    }

    /// Parse one line. Recursive through block THEN.
    fn parse_line(&mut self, line: Line) -> Result<LineRecord, BasicError> {
        let source_line = line.source_line;
        if let Some(literal) = line.tokens.iter().find_map(|t| match &t.kind {
            TokenKind::Overflow(literal) => Some(literal.clone()),
            _ => None,
        }) {
            return Err(BasicError::NumberRange { source_line, literal });
        }
        let mut tokens = TokenStream::new(line.tokens);
        let mut record = LineRecord { number: 0, statements: Vec::new() };

        match tokens.advance() {
            None => return Ok(record),
            Some(Token { kind: TokenKind::Number(n), .. }) => record.number = n,
            Some(other) => {
                return Err(BasicError::LineNumber { source_line, found: other.text() });
            }
        }

        while let Some(token) = tokens.advance() {
            let stmt = match token.kind {
                TokenKind::Word(word) => match Keyword::from_word(&word) {
                    Some(Keyword::Print) => self.parse_print(record.number, &mut tokens)?,
                    Some(Keyword::Cls) => Self::parse_bare(record.number, &tokens, "CLS", Stmt::Cls)?,
                    Some(Keyword::End) => Self::parse_bare(record.number, &tokens, "END", Stmt::End)?,
                    Some(Keyword::GoTo) => Self::parse_goto(record.number, &mut tokens)?,
                    Some(Keyword::If) => self.parse_if(record.number, &mut tokens)?,
                    Some(Keyword::Then) | None => {
                        // TODO: ask whether stray words should be a syntax error instead
                        tracing::debug!(line = record.number, word = %word, "ignoring unrecognized word");
                        continue;
                    }
                },
                TokenKind::VarNumber(decl) => self.parse_declaration(record.number, &decl, Sigil::Number)?,
                TokenKind::VarString(decl) => self.parse_declaration(record.number, &decl, Sigil::Text)?,
                literal @ (TokenKind::Number(_) | TokenKind::String(_) | TokenKind::Overflow(_)) => {
                    tracing::debug!(line = record.number, token = %token_text(&literal), "ignoring literal");
                    continue;
                }
            };
            record.statements.push(stmt);
        }

        Ok(record)
    }

    fn parse_print(&mut self, line: i64, tokens: &mut TokenStream) -> Result<Stmt, BasicError> {
        let arg = match tokens.advance().map(|t| t.kind) {
            Some(TokenKind::Word(name)) => {
                if !self.variables.contains(&name) {
                    return Err(BasicError::UndefinedVariable { line, name });
                }
                PrintArg::Variable(name)
            }
            Some(TokenKind::Number(n)) => PrintArg::Number(n),
            Some(TokenKind::String(s)) => PrintArg::Text(s),
            _ => {
                return Err(BasicError::syntax(
                    line,
                    "PRINT command must be followed by a number/string/variable",
                ))
            }
        };
        Ok(Stmt::Print(arg))
    }

    /// CLS and END take no arguments
    fn parse_bare(line: i64, tokens: &TokenStream, name: &str, stmt: Stmt) -> Result<Stmt, BasicError> {
        if !tokens.is_empty() {
            return Err(BasicError::syntax(
                line,
                format!("{} command must not be followed by anything", name),
            ));
        }
        Ok(stmt)
    }

    fn parse_goto(line: i64, tokens: &mut TokenStream) -> Result<Stmt, BasicError> {
        match tokens.advance().map(|t| t.kind) {
            Some(TokenKind::Number(n)) if tokens.is_empty() => Ok(Stmt::GoTo(n)),
            _ => Err(BasicError::syntax(line, "GOTO command must be followed only by a number")),
        }
    }

    fn parse_if(&mut self, line: i64, tokens: &mut TokenStream) -> Result<Stmt, BasicError> {
        let condition = match tokens.advance().map(|t| t.kind) {
            Some(TokenKind::Word(text)) | Some(TokenKind::String(text)) => Condition::parse(&text)
                .ok_or_else(|| {
                    BasicError::syntax(line, "IF command must have a condition with a comparator")
                })?,
            _ => return Err(BasicError::syntax(line, "IF command must be followed by a condition")),
        };

        match tokens.advance().map(|t| t.kind) {
            Some(TokenKind::Word(word)) if Keyword::from_word(&word) == Some(Keyword::Then) => {}
            _ => return Err(BasicError::syntax(line, "IF command must have a THEN statement")),
        }

        let then_branch = match tokens.advance().map(|t| t.kind) {
            Some(TokenKind::Number(target)) => Then::Line(target),
            Some(other) => {
                return Err(BasicError::syntax(
                    line,
                    format!("THEN must be followed by a line number, found `{}`", token_text(&other)),
                ))
            }
            None => Then::Block(self.parse_then_block(line)?),
        };

        Ok(Stmt::If { condition, then_branch })
    }

    /// Absorb the indented lines following a bare THEN
    fn parse_then_block(&mut self, line: i64) -> Result<Vec<LineRecord>, BasicError> {
        let mut block = Vec::new();

        while let Some(mut next) = self.cursor.next_continuation() {
            next.strip_indent();
            block.push(self.parse_line(next)?);
        }

        if block.is_empty() {
            return Err(BasicError::EmptyThenBlock { line });
        }
        tracing::debug!(line, absorbed = block.len(), "THEN block parsed");
        Ok(block)
    }

    fn parse_declaration(&mut self, line: i64, decl: &str, sigil: Sigil) -> Result<Stmt, BasicError> {
        let parts: Vec<&str> = decl.split(sigil.separator()).collect();
        let [name, raw] = parts.as_slice() else {
            let name = parts.first().copied().unwrap_or_default();
            return Err(BasicError::syntax(
                line,
                format!("variable declaration unexpected for variable named '{}'", name),
            ));
        };

        self.variables.declare(line, name, sigil, raw)?;
        Ok(Stmt::Declare(name.to_string()))
    }
}

fn token_text(kind: &TokenKind) -> String {
    Token::new(kind.clone()).text()
}
