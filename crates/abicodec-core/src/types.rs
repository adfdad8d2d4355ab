//! The ABI type grammar.
//!
//! Every parameter of a schema carries a `TypeDescriptor`. The set of kinds is
//! closed: codec logic matches on it exhaustively. Descriptors are parsed from
//! canonical Solidity type strings such as `uint256`, `address[]` or
//! `(uint256,address)[3]`.

use crate::error::SchemaError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Default bound on composite nesting (arrays and tuples), shared by the type
/// parser, the codec and the EIP-712 engine.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Size of one ABI word in bytes.
pub const WORD: usize = 32;

/// A Solidity ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeDescriptor {
    /// `uint<bits>`, bits ∈ {8, 16, …, 256}
    Uint(u16),
    /// `int<bits>`, two's complement
    Int(u16),
    /// 20-byte account address
    Address,
    Bool,
    /// `bytes<n>`, 1 ≤ n ≤ 32
    FixedBytes(u8),
    /// Variable-length byte string
    Bytes,
    /// UTF-8 string
    String,
    /// `T[]`
    Array(Box<TypeDescriptor>),
    /// `T[len]`, len ≥ 1
    FixedArray(Box<TypeDescriptor>, usize),
    /// `(T1,T2,…)` with component names (positional names when unnamed)
    Tuple(Vec<(String, TypeDescriptor)>),
}

impl TypeDescriptor {
    /// Parse a type string with the default nesting bound.
    pub fn parse(s: &str) -> Result<Self, SchemaError> {
        Self::parse_with_depth(s, DEFAULT_MAX_DEPTH)
    }

    /// Parse a type string, rejecting nesting deeper than `max_depth`.
    pub fn parse_with_depth(s: &str, max_depth: usize) -> Result<Self, SchemaError> {
        let mut parser = Parser {
            src: s,
            pos: 0,
            max_depth,
        };
        parser.skip_ws();
        let ty = parser.parse_type(0)?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(parser.error(format!(
                "unexpected trailing input `{}`",
                &s[parser.pos..]
            )));
        }
        ty.validate()?;
        Ok(ty)
    }

    /// Wrap `self` in the array dimensions described by `suffix`
    /// (e.g. `"[]"`, `"[3][]"`). An empty suffix returns `self` unchanged.
    pub fn with_array_suffix(self, suffix: &str) -> Result<Self, SchemaError> {
        let mut parser = Parser {
            src: suffix,
            pos: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        };
        let ty = parser.parse_suffixes(self, 0)?;
        if parser.pos != suffix.len() {
            return Err(parser.error("invalid array suffix".into()));
        }
        ty.validate()?;
        Ok(ty)
    }

    /// Check the grammar invariants for descriptors built by hand.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let bad = |reason: String| SchemaError::MalformedSignature {
            signature: self.to_string(),
            reason,
        };
        match self {
            TypeDescriptor::Uint(bits) | TypeDescriptor::Int(bits) => {
                if *bits == 0 || *bits > 256 || bits % 8 != 0 {
                    return Err(bad(format!("invalid integer width {bits}")));
                }
            }
            TypeDescriptor::FixedBytes(n) => {
                if *n == 0 || *n > 32 {
                    return Err(bad(format!("invalid fixed bytes size {n}")));
                }
            }
            TypeDescriptor::Address
            | TypeDescriptor::Bool
            | TypeDescriptor::Bytes
            | TypeDescriptor::String => {}
            TypeDescriptor::Array(elem) => elem.validate()?,
            TypeDescriptor::FixedArray(elem, len) => {
                if *len == 0 {
                    return Err(bad("fixed array length must be at least 1".into()));
                }
                elem.validate()?;
            }
            TypeDescriptor::Tuple(fields) => {
                if fields.is_empty() {
                    return Err(bad("empty tuple".into()));
                }
                for (_, ty) in fields {
                    ty.validate()?;
                }
            }
        }
        if self.static_size().is_none() {
            return Err(bad("static size overflows".into()));
        }
        Ok(())
    }

    /// `true` for `bytes`, `string`, `T[]` and anything containing one of them.
    pub fn is_dynamic(&self) -> bool {
        match self {
            TypeDescriptor::Bytes | TypeDescriptor::String | TypeDescriptor::Array(_) => true,
            TypeDescriptor::FixedArray(elem, _) => elem.is_dynamic(),
            TypeDescriptor::Tuple(fields) => fields.iter().any(|(_, t)| t.is_dynamic()),
            _ => false,
        }
    }

    /// Elementary types that occupy exactly one word and are stored verbatim
    /// in an event topic.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Uint(_)
                | TypeDescriptor::Int(_)
                | TypeDescriptor::Address
                | TypeDescriptor::Bool
                | TypeDescriptor::FixedBytes(_)
        )
    }

    /// Number of bytes this type occupies in the head of its enclosing block:
    /// one word for dynamic types, the full inline size for static ones.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            WORD
        } else {
            self.static_size().unwrap_or(usize::MAX)
        }
    }

    /// Inline size of a static type, `None` on overflow. Dynamic components
    /// count as one offset word.
    fn static_size(&self) -> Option<usize> {
        match self {
            TypeDescriptor::Bytes | TypeDescriptor::String | TypeDescriptor::Array(_) => {
                Some(WORD)
            }
            TypeDescriptor::FixedArray(elem, len) => elem.static_size()?.checked_mul(*len),
            TypeDescriptor::Tuple(fields) => fields
                .iter()
                .try_fold(0usize, |acc, (_, t)| acc.checked_add(t.static_size()?)),
            _ => Some(WORD),
        }
    }

    /// Composite nesting depth: 0 for elementary types.
    pub fn depth(&self) -> usize {
        match self {
            TypeDescriptor::Array(elem) | TypeDescriptor::FixedArray(elem, _) => 1 + elem.depth(),
            TypeDescriptor::Tuple(fields) => {
                1 + fields.iter().map(|(_, t)| t.depth()).max().unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Canonical signature form (component names dropped).
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Uint(bits) => write!(f, "uint{bits}"),
            TypeDescriptor::Int(bits) => write!(f, "int{bits}"),
            TypeDescriptor::Address => f.write_str("address"),
            TypeDescriptor::Bool => f.write_str("bool"),
            TypeDescriptor::FixedBytes(n) => write!(f, "bytes{n}"),
            TypeDescriptor::Bytes => f.write_str("bytes"),
            TypeDescriptor::String => f.write_str("string"),
            TypeDescriptor::Array(elem) => write!(f, "{elem}[]"),
            TypeDescriptor::FixedArray(elem, len) => write!(f, "{elem}[{len}]"),
            TypeDescriptor::Tuple(fields) => {
                f.write_str("(")?;
                for (i, (_, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{ty}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ─── Parser ───────────────────────────────────────────────────────────────────

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, reason: String) -> SchemaError {
        SchemaError::MalformedSignature {
            signature: self.src.to_string(),
            reason,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_while(&mut self, pred: impl Fn(u8) -> bool) -> &'a str {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if pred(c)) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    fn expect(&mut self, c: u8) -> Result<(), SchemaError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!(
                "expected `{}` at position {}",
                c as char, self.pos
            )))
        }
    }

    fn parse_type(&mut self, depth: usize) -> Result<TypeDescriptor, SchemaError> {
        if depth > self.max_depth {
            return Err(self.error(format!("nesting deeper than {}", self.max_depth)));
        }
        let base = if self.peek() == Some(b'(') {
            self.parse_tuple(depth)?
        } else if self.rest().starts_with("tuple(") {
            self.pos += "tuple".len();
            self.parse_tuple(depth)?
        } else {
            let word = self.take_while(|c| c.is_ascii_alphanumeric());
            elementary(word).map_err(|reason| self.error(reason))?
        };
        self.parse_suffixes(base, depth)
    }

    fn parse_suffixes(
        &mut self,
        mut ty: TypeDescriptor,
        mut depth: usize,
    ) -> Result<TypeDescriptor, SchemaError> {
        while self.peek() == Some(b'[') {
            depth += 1;
            if depth > self.max_depth {
                return Err(self.error(format!("nesting deeper than {}", self.max_depth)));
            }
            self.pos += 1;
            let digits = self.take_while(|c| c.is_ascii_digit());
            self.expect(b']')?;
            ty = if digits.is_empty() {
                TypeDescriptor::Array(Box::new(ty))
            } else {
                if digits.len() > 1 && digits.starts_with('0') {
                    return Err(self.error(format!("non-canonical array length `{digits}`")));
                }
                let len: usize = digits
                    .parse()
                    .map_err(|_| self.error(format!("array length `{digits}` too large")))?;
                if len == 0 {
                    return Err(self.error("fixed array length must be at least 1".into()));
                }
                TypeDescriptor::FixedArray(Box::new(ty), len)
            };
        }
        Ok(ty)
    }

    fn parse_tuple(&mut self, depth: usize) -> Result<TypeDescriptor, SchemaError> {
        self.expect(b'(')?;
        self.skip_ws();
        if self.peek() == Some(b')') {
            return Err(self.error("empty tuple".into()));
        }
        let mut fields = Vec::new();
        loop {
            self.skip_ws();
            let ty = self.parse_type(depth + 1)?;
            self.skip_ws();
            let name = match self.peek() {
                Some(c) if c.is_ascii_alphabetic() || c == b'_' || c == b'$' => self
                    .take_while(|c| c.is_ascii_alphanumeric() || c == b'_' || c == b'$')
                    .to_string(),
                _ => fields.len().to_string(),
            };
            fields.push((name, ty));
            self.skip_ws();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b')') => {
                    self.pos += 1;
                    return Ok(TypeDescriptor::Tuple(fields));
                }
                Some(c) => {
                    return Err(self.error(format!(
                        "unexpected `{}` at position {}",
                        c as char, self.pos
                    )))
                }
                None => return Err(self.error("unbalanced parentheses".into())),
            }
        }
    }
}

/// Map an elementary type token to its descriptor.
fn elementary(word: &str) -> Result<TypeDescriptor, String> {
    match word {
        "" => return Err("expected a type".into()),
        "address" => return Ok(TypeDescriptor::Address),
        "bool" => return Ok(TypeDescriptor::Bool),
        "string" => return Ok(TypeDescriptor::String),
        "bytes" => return Ok(TypeDescriptor::Bytes),
        "uint" => return Ok(TypeDescriptor::Uint(256)),
        "int" => return Ok(TypeDescriptor::Int(256)),
        _ => {}
    }

    if let Some(n) = word.strip_prefix("bytes") {
        let size = width(n).ok_or_else(|| format!("unknown type `{word}`"))?;
        if !(1..=32).contains(&size) {
            return Err(format!("invalid fixed bytes size in `{word}`"));
        }
        return Ok(TypeDescriptor::FixedBytes(size as u8));
    }

    let (signed, digits) = if let Some(d) = word.strip_prefix("uint") {
        (false, d)
    } else if let Some(d) = word.strip_prefix("int") {
        (true, d)
    } else {
        return Err(format!("unknown type `{word}`"));
    };
    let bits = width(digits).ok_or_else(|| format!("unknown type `{word}`"))?;
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(format!("invalid integer width in `{word}`"));
    }
    Ok(if signed {
        TypeDescriptor::Int(bits)
    } else {
        TypeDescriptor::Uint(bits)
    })
}

/// Decimal width without sign or leading zeros.
fn width(digits: &str) -> Option<u16> {
    if digits.is_empty()
        || !digits.bytes().all(|c| c.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }
    digits.parse().ok()
}
