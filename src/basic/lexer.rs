//! BASIC lexer/tokenizer
//!
//! Source is tokenized one physical line at a time. Tokens are separated by
//! runs of spaces outside double quotes, and each token is classified as a
//! whole rather than scanned character by character.

use std::fmt;

/// Token kinds
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Identifier, keyword, or anything unclassified
    Word(String),
    /// Quoted literal with the quotes removed
    String(String),
    /// Integer literal
    Number(i64),
    /// `NAME$=value`
    VarString(String),
    /// `NAME%=value`
    VarNumber(String),
    /// Integer literal that does not fit in an `i64`
    Overflow(String),
}

/// A token with its continuation marker
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Set on the token that follows the first double-space run of a line.
    pub indented: bool,
}

impl Token {
    pub fn new(kind: TokenKind) -> Self {
        Self { kind, indented: false }
    }

    /// The token's text, as it would be printed
    pub fn text(&self) -> String {
        match &self.kind {
            TokenKind::Number(n) => n.to_string(),
            TokenKind::Word(s)
            | TokenKind::String(s)
            | TokenKind::VarString(s)
            | TokenKind::VarNumber(s)
            | TokenKind::Overflow(s) => s.clone(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// One physical source line
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// 1-based position in the source text
    pub source_line: usize,
    pub tokens: Vec<Token>,
}

impl Line {
    /// True when the line continues a preceding block THEN, i.e. its second
    /// token (the one after the line number) carries the indentation marker.
    pub fn is_continuation(&self) -> bool {
        self.tokens.get(1).is_some_and(|t| t.indented)
    }

    pub fn strip_indent(&mut self) {
        for token in &mut self.tokens {
            token.indented = false;
        }
    }
}

/// The lexer
pub struct Lexer<'a> {
    input: &'a str,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Tokenize entire input, one `Line` per physical line
    pub fn tokenize(&mut self) -> Vec<Line> {
        let lines: Vec<Line> = self
            .input
            .split('\n')
            .enumerate()
            .map(|(idx, raw)| Line {
                source_line: idx + 1,
                tokens: Self::tokenize_line(raw.trim_end_matches('\r')),
            })
            .collect();

        tracing::debug!(lines = lines.len(), "source tokenized");
        lines
    }

    /// Split a line on unquoted spaces and classify each piece
    fn tokenize_line(line: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut marker_placed = false;
        let mut pending_marker = false;
        let mut chars = line.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '"' => {
                    in_quotes = !in_quotes;
                    current.push(c);
                }
                ' ' if !in_quotes => {
                    Self::flush(&mut tokens, &mut current, &mut pending_marker);
                    let doubled = chars.peek() == Some(&' ');
                    while chars.peek() == Some(&' ') {
                        chars.next();
                    }
                    // Only the first double-space run of a line counts
                    if doubled && !marker_placed {
                        marker_placed = true;
                        pending_marker = true;
                    }
                }
                _ => current.push(c),
            }
        }
        Self::flush(&mut tokens, &mut current, &mut pending_marker);

        tokens
    }

    fn flush(tokens: &mut Vec<Token>, current: &mut String, pending_marker: &mut bool) {
        if current.is_empty() {
            return;
        }
        let mut token = Token::new(Self::classify(current));
        token.indented = std::mem::take(pending_marker);
        tokens.push(token);
        current.clear();
    }

    /// Classify a raw token. Declaration markers are detected before the
    /// quotes are stripped from the value.
    fn classify(raw: &str) -> TokenKind {
        if let Ok(n) = raw.parse::<i64>() {
            return TokenKind::Number(n);
        }
        let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return TokenKind::Overflow(raw.to_string());
        }

        if raw.contains('"') {
            if Self::outside_quotes(raw).contains('$') {
                TokenKind::VarString(Self::clear_token(raw))
            } else {
                TokenKind::String(Self::clear_token(raw))
            }
        } else if raw.contains('%') {
            TokenKind::VarNumber(Self::clear_token(raw))
        } else if raw.contains("$=") {
            TokenKind::VarString(Self::clear_token(raw))
        } else {
            TokenKind::Word(Self::clear_token(raw))
        }
    }

    /// The parts of a token that are not inside a closed quoted span
    fn outside_quotes(raw: &str) -> String {
        let mut out = String::new();
        let mut rest = raw;
        while let Some(open) = rest.find('"') {
            out.push_str(&rest[..open]);
            match rest[open + 1..].find('"') {
                Some(close) => rest = &rest[open + 1 + close + 1..],
                None => {
                    // Unterminated quote: keep the tail as-is
                    rest = &rest[open..];
                    break;
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn clear_token(raw: &str) -> String {
        raw.chars().filter(|c| *c != '"' && *c != '\'').collect()
    }
}
