//! Declared field types, before the registry classifies them.
//!
//! A declaration is either written with the constructors here or parsed from text:
//!
//! ```text
//! int                    builtin leaf
//! Point                  a type visible at declaration time
//! 'Point'  "Point"       forward reference, resolved when the registry is built
//! list[T]  List[T]  Vec<T>
//! dict[K, V]  Dict[K, V]  Map<K, V>  HashMap<K, V>
//! ```
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    Forward(String),
    Generic { origin: String, args: Vec<TypeExpr> },
}

/// Shape family of a generic origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    List,
    Mapping,
    Other,
}

impl Origin {
    pub fn classify(origin: &str) -> Self {
        // `typing.List`, `std::collections::HashMap`, …
        let base = origin.rsplit(['.', ':']).next().unwrap_or(origin);
        match base {
            "list" | "List" | "Vec" | "Sequence" | "VecDeque" => Origin::List,
            "dict" | "Dict" | "Map" | "Mapping" | "HashMap" | "BTreeMap" | "IndexMap" => Origin::Mapping,
            _ => Origin::Other,
        }
    }
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }
    pub fn forward(name: impl Into<String>) -> Self {
        TypeExpr::Forward(name.into())
    }
    pub fn list(item: TypeExpr) -> Self {
        TypeExpr::Generic { origin: "list".into(), args: vec![item] }
    }
    pub fn dict(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Generic { origin: "dict".into(), args: vec![key, value] }
    }
    pub fn generic(origin: impl Into<String>, args: Vec<TypeExpr>) -> Self {
        TypeExpr::Generic { origin: origin.into(), args }
    }

    pub fn parse(src: &str) -> Result<Self> {
        let mut p = Parser { src, pos: 0 };
        let expr = p.expr()?;
        p.skip_ws();
        if p.pos != src.len() {
            return Err(p.error(format!("unexpected trailing input at byte {}", p.pos)));
        }
        Ok(expr)
    }
}

impl FromStr for TypeExpr {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        TypeExpr::parse(s)
    }
}

impl From<&str> for TypeExpr {
    /// Bare name, no parsing. Use [`TypeExpr::parse`] for full syntax.
    fn from(name: &str) -> Self {
        TypeExpr::Named(name.to_string())
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Forward(name) => write!(f, "'{name}'"),
            TypeExpr::Generic { origin, args } => {
                write!(f, "{origin}[")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str("]")
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PARSER
// ————————————————————————————————————————————————————————————————————————————

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn expr(&mut self) -> Result<TypeExpr> {
        self.skip_ws();
        match self.peek() {
            Some(q @ ('\'' | '"')) => {
                self.pos += 1;
                let name = self.ident()?;
                if self.peek() != Some(q) {
                    return Err(self.error(format!("unterminated forward reference `{name}`")));
                }
                self.pos += 1;
                Ok(TypeExpr::Forward(name))
            }
            Some(_) => {
                let name = self.ident()?;
                self.skip_ws();
                let close = match self.peek() {
                    Some('[') => ']',
                    Some('<') => '>',
                    _ => return Ok(TypeExpr::Named(name)),
                };
                self.pos += 1;
                let mut args = vec![self.expr()?];
                loop {
                    self.skip_ws();
                    match self.peek() {
                        Some(',') => {
                            self.pos += 1;
                            args.push(self.expr()?);
                        }
                        Some(c) if c == close => {
                            self.pos += 1;
                            break;
                        }
                        _ => return Err(self.error(format!("expected `,` or `{close}` in `{name}`"))),
                    }
                }
                Ok(TypeExpr::Generic { origin: name, args })
            }
            None => Err(self.error("expected a type".into())),
        }
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        let rest = &self.src[start..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || matches!(c, '_' | '.' | ':')))
            .unwrap_or(rest.len());
        if len == 0 || rest.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error(format!("expected a type name at byte {start}")));
        }
        self.pos += len;
        Ok(rest[..len].to_string())
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = &self.src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn error(&self, message: String) -> Error {
        Error::TypeSyntax { expr: self.src.to_string(), message }
    }
}
