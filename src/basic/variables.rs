//! Variable store shared by the parser and the interpreter

use std::collections::HashMap;
use std::fmt;

use crate::basic::error::BasicError;

/// A BASIC value - a whole number or a piece of text
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Number(i64),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Trailing declaration marker: `%` for numbers, `$` for text
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sigil {
    Number,
    Text,
}

impl Sigil {
    /// The separator between name and value in a declaration token.
    pub fn separator(self) -> &'static str {
        match self {
            Sigil::Number => "%=",
            Sigil::Text => "$=",
        }
    }
}

impl fmt::Display for Sigil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sigil::Number => f.write_str("NUMBER"),
            Sigil::Text => f.write_str("STRING"),
        }
    }
}

/// Whether a raw literal reads as a number.
///
/// Empty and blank text counts as numeric, so `A$=` is rejected the same
/// way `A$=5` is. Otherwise only decimal literals count: an optional sign,
/// digits with at most one `.`, and an optional exponent. Words such as
/// `INF` or `NAN` are text.
pub fn looks_numeric(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    let (mantissa, exponent) = match trimmed.find(['e', 'E']) {
        Some(pos) => (&trimmed[..pos], Some(&trimmed[pos + 1..])),
        None => (trimmed, None),
    };
    let unsigned = |s: &str| s.strip_prefix(['+', '-']).unwrap_or(s).to_string();

    let mantissa = unsigned(mantissa);
    let mut dots = 0;
    let mut digits = 0;
    for c in mantissa.chars() {
        match c {
            '.' => dots += 1,
            c if c.is_ascii_digit() => digits += 1,
            _ => return false,
        }
    }
    if digits == 0 || dots > 1 {
        return false;
    }
    match exponent {
        Some(exp) => {
            let exp = unsigned(exp);
            !exp.is_empty() && exp.chars().all(|c| c.is_ascii_digit())
        }
        None => true,
    }
}

/// Name-to-value mapping. A later declaration overwrites an earlier one of
/// the same name, whatever its type.
#[derive(Clone, Debug, Default)]
pub struct VariableStore {
    variables: HashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `raw` against `sigil` and store it under `name`.
    pub fn declare(
        &mut self,
        line: i64,
        name: &str,
        sigil: Sigil,
        raw: &str,
    ) -> Result<(), BasicError> {
        let value = match sigil {
            Sigil::Number => raw.trim().parse::<i64>().ok().map(Value::Number),
            Sigil::Text if !looks_numeric(raw) => Some(Value::Text(raw.to_string())),
            Sigil::Text => None,
        };

        let value = value.ok_or_else(|| BasicError::VariableType {
            line,
            name: name.to_string(),
            expected: sigil,
            value: raw.to_string(),
        })?;

        tracing::debug!(line, name, %value, "variable declared");
        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Resolve a condition operand: numeric literal, then variable, then the
    /// raw text itself.
    pub fn resolve_operand(&self, operand: &str) -> Value {
        if let Ok(n) = operand.trim().parse::<i64>() {
            return Value::Number(n);
        }
        match self.variables.get(operand) {
            Some(value) => value.clone(),
            None => Value::Text(operand.to_string()),
        }
    }
}
