// ── LDAP search filters ──
//
// A small filter AST with RFC 4515 string rendering and parsing.
// Filters are composed by the console (user filter OR container
// predicate, advanced-view widening, dev-mode classes) and evaluated
// by the in-memory backend.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;
use crate::record::ObjectRecord;

/// Attribute every directory object carries; `(objectClass=*)` matches all.
pub const ATTRIBUTE_OBJECT_CLASS: &str = "objectClass";

/// A parsed LDAP search filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Filter {
    Equals { attribute: String, value: String },
    /// Value pattern containing at least one `*` wildcard.
    Substring { attribute: String, pattern: String },
    Present { attribute: String },
    Not(Box<Filter>),
    And(Vec<Filter>),
    Or(Vec<Filter>),
}

impl Filter {
    // ── Constructors ─────────────────────────────────────────────────

    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn not_equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Not(Box::new(Self::equals(attribute, value)))
    }

    pub fn present(attribute: impl Into<String>) -> Self {
        Self::Present {
            attribute: attribute.into(),
        }
    }

    /// Matches every object.
    pub fn everything() -> Self {
        Self::present(ATTRIBUTE_OBJECT_CLASS)
    }

    /// OR the given filters together, flattening nested ORs.
    /// A single operand is returned as-is.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut operands = Vec::new();
        for filter in filters {
            match filter {
                Self::Or(inner) => operands.extend(inner),
                other => operands.push(other),
            }
        }
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            Self::Or(operands)
        }
    }

    /// AND the given filters together, flattening nested ANDs.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut operands = Vec::new();
        for filter in filters {
            match filter {
                Self::And(inner) => operands.extend(inner),
                other => operands.push(other),
            }
        }
        if operands.len() == 1 {
            operands.remove(0)
        } else {
            Self::And(operands)
        }
    }

    /// `(|(objectClass=a)(objectClass=b)...)`
    pub fn any_class<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::or(
            classes
                .into_iter()
                .map(|class| Self::equals(ATTRIBUTE_OBJECT_CLASS, class)),
        )
    }

    // ── Evaluation ───────────────────────────────────────────────────

    /// Evaluate against a record. Attribute names and values compare
    /// ASCII case-insensitively, as directory servers do for the
    /// string syntaxes the console deals with.
    pub fn matches(&self, record: &ObjectRecord) -> bool {
        match self {
            Self::Equals { attribute, value } => record
                .values(attribute)
                .iter()
                .any(|v| v.eq_ignore_ascii_case(value)),
            Self::Substring { attribute, pattern } => record
                .values(attribute)
                .iter()
                .any(|v| wildcard_match(pattern, v)),
            Self::Present { attribute } => !record.values(attribute).is_empty(),
            Self::Not(inner) => !inner.matches(record),
            Self::And(operands) => operands.iter().all(|f| f.matches(record)),
            Self::Or(operands) => operands.iter().any(|f| f.matches(record)),
        }
    }

    // ── Parsing ──────────────────────────────────────────────────────

    /// Parse an RFC 4515 filter string. Outer parentheses are optional
    /// for a single item (`objectClass=user`).
    pub fn parse(raw: &str) -> Result<Self, DirectoryError> {
        let trimmed = raw.trim();
        let wrapped;
        let input = if trimmed.starts_with('(') {
            trimmed
        } else {
            wrapped = format!("({trimmed})");
            &wrapped
        };

        let mut parser = Parser {
            raw,
            chars: input.chars().collect(),
            pos: 0,
        };
        let filter = parser.filter()?;
        if parser.pos != parser.chars.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(filter)
    }
}

// ── Rendering ────────────────────────────────────────────────────────

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { attribute, value } => {
                write!(f, "({attribute}={})", escape_value(value, false))
            }
            Self::Substring { attribute, pattern } => {
                write!(f, "({attribute}={})", escape_value(pattern, true))
            }
            Self::Present { attribute } => write!(f, "({attribute}=*)"),
            Self::Not(inner) => write!(f, "(!{inner})"),
            Self::And(operands) => {
                f.write_str("(&")?;
                for operand in operands {
                    write!(f, "{operand}")?;
                }
                f.write_str(")")
            }
            Self::Or(operands) => {
                f.write_str("(|")?;
                for operand in operands {
                    write!(f, "{operand}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<Filter> for String {
    fn from(filter: Filter) -> Self {
        filter.to_string()
    }
}

impl TryFrom<String> for Filter {
    type Error = DirectoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl std::str::FromStr for Filter {
    type Err = DirectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn escape_value(value: &str, keep_wildcards: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' if keep_wildcards => out.push('*'),
            '*' => out.push_str("\\2a"),
            '(' => out.push_str("\\28"),
            ')' => out.push_str("\\29"),
            '\\' => out.push_str("\\5c"),
            '\0' => out.push_str("\\00"),
            other => out.push(other),
        }
    }
    out
}

/// Case-insensitive `*` glob match.
fn wildcard_match(pattern: &str, value: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let value = value.to_ascii_lowercase();
    let parts: Vec<&str> = pattern.split('*').collect();

    let mut rest = value.as_str();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(after) => rest = after,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(at) => rest = &rest[at + part.len()..],
                None => return false,
            }
        }
    }
    // Pattern ended with `*` (or was only wildcards).
    true
}

// ── Parser ───────────────────────────────────────────────────────────

struct Parser<'a> {
    raw: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> DirectoryError {
        DirectoryError::InvalidFilter {
            value: self.raw.to_owned(),
            reason: format!("{reason} at position {}", self.pos),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expect(&mut self, expected: char) -> Result<(), DirectoryError> {
        if self.peek() == Some(expected) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{expected}'")))
        }
    }

    fn filter(&mut self) -> Result<Filter, DirectoryError> {
        self.expect('(')?;
        let filter = match self.peek() {
            Some('&') => {
                self.pos += 1;
                Filter::And(self.list()?)
            }
            Some('|') => {
                self.pos += 1;
                Filter::Or(self.list()?)
            }
            Some('!') => {
                self.pos += 1;
                Filter::Not(Box::new(self.filter()?))
            }
            Some(_) => self.item()?,
            None => return Err(self.error("unexpected end of input")),
        };
        self.expect(')')?;
        Ok(filter)
    }

    fn list(&mut self) -> Result<Vec<Filter>, DirectoryError> {
        let mut out = Vec::new();
        while self.peek() == Some('(') {
            out.push(self.filter()?);
        }
        Ok(out)
    }

    fn item(&mut self) -> Result<Filter, DirectoryError> {
        let mut attribute = String::new();
        loop {
            match self.peek() {
                Some('=') => break,
                Some('>' | '<' | '~') => return Err(self.error("unsupported comparison operator")),
                Some('(' | ')') | None => return Err(self.error("expected '='")),
                Some(ch) => {
                    attribute.push(ch);
                    self.pos += 1;
                }
            }
        }
        self.pos += 1;

        let attribute = attribute.trim().to_owned();
        if attribute.is_empty() {
            return Err(self.error("empty attribute name"));
        }

        let mut value = String::new();
        let mut has_wildcard = false;
        loop {
            match self.peek() {
                Some(')') => break,
                None | Some('(') => return Err(self.error("unterminated value")),
                Some('\\') => {
                    let hex: String = self.chars.iter().skip(self.pos + 1).take(2).collect();
                    let byte = u8::from_str_radix(&hex, 16)
                        .map_err(|_| self.error("invalid escape sequence"))?;
                    value.push(char::from(byte));
                    self.pos += 3;
                }
                Some('*') => {
                    has_wildcard = true;
                    value.push('*');
                    self.pos += 1;
                }
                Some(ch) => {
                    value.push(ch);
                    self.pos += 1;
                }
            }
        }

        Ok(if value == "*" {
            Filter::Present { attribute }
        } else if has_wildcard {
            Filter::Substring {
                attribute,
                pattern: value,
            }
        } else {
            Filter::Equals { attribute, value }
        })
    }
}
