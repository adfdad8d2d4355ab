//! Human-readable declarations, one per line:
//!
//! ```text
//! event Transfer(address indexed from, address indexed to, uint256 value)
//! event Log(bytes32 indexed topic) anonymous
//! function transfer(address to, uint256 amount) external returns (bool)
//! ```
//!
//! Blank lines and lines starting with `//` or `#` are skipped. Anything after
//! the closing parenthesis of a function's parameter list is ignored.

use abicodec_core::{
    error::SchemaError,
    schema::{Parameter, Schema},
    types::TypeDescriptor,
};

use crate::source::SchemaSource;

#[derive(Debug, Clone)]
pub struct Declarations {
    text: String,
}

impl Declarations {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl SchemaSource for Declarations {
    fn schemas(&self) -> Result<Vec<Schema>, SchemaError> {
        self.text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with("//") && !l.starts_with('#'))
            .map(parse_declaration)
            .collect()
    }
}

/// Parse one `event …` or `function …` declaration.
pub fn parse_declaration(line: &str) -> Result<Schema, SchemaError> {
    let line = line.trim().trim_end_matches(';');
    let malformed = |reason: &str| SchemaError::MalformedSignature {
        signature: line.to_string(),
        reason: reason.to_string(),
    };

    let (keyword, rest) = line
        .split_once(char::is_whitespace)
        .ok_or_else(|| malformed("expected `event` or `function`"))?;
    let open = rest.find('(').ok_or_else(|| malformed("missing `(`"))?;
    let name = rest[..open].trim();
    let close = matching_paren(rest, open).ok_or_else(|| malformed("unbalanced parentheses"))?;
    let inner = &rest[open + 1..close];
    let trailer = rest[close + 1..].trim();

    match keyword {
        "event" => {
            let anonymous = match trailer {
                "" => false,
                "anonymous" => true,
                _ => return Err(malformed("unexpected input after event parameters")),
            };
            let params = split_params(inner)
                .into_iter()
                .map(|p| parse_param(p, true))
                .collect::<Result<Vec<_>, _>>()?;
            Schema::event(name, params, anonymous)
        }
        "function" => {
            let params = split_params(inner)
                .into_iter()
                .map(|p| parse_param(p, false))
                .collect::<Result<Vec<_>, _>>()?;
            Schema::function(name, params)
        }
        _ => Err(malformed("expected `event` or `function`")),
    }
}

/// Byte index of the `)` closing the `(` at `open`.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices().skip_while(|(i, _)| *i < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas outside parentheses. An empty list yields no parameters.
fn split_params(s: &str) -> Vec<&str> {
    if s.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

/// `type [indexed] [location] [name]`; the type may be a parenthesised tuple.
fn parse_param(s: &str, event: bool) -> Result<Parameter, SchemaError> {
    let mut depth = 0i32;
    let end = s
        .char_indices()
        .find(|&(_, c)| {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            depth == 0 && c.is_whitespace()
        })
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    let ty = TypeDescriptor::parse(&s[..end])?;
    let mut indexed = false;
    let mut name = String::new();
    for word in s[end..].split_whitespace() {
        match word {
            "indexed" if event => indexed = true,
            "memory" | "calldata" | "storage" => {}
            w if name.is_empty() => name = w.to_string(),
            _ => {
                return Err(SchemaError::MalformedSignature {
                    signature: s.to_string(),
                    reason: "unexpected token in parameter".into(),
                })
            }
        }
    }
    Ok(Parameter { name, ty, indexed })
}

#[cfg(test)]
mod tests {
    use super::*;
    use abicodec_core::schema::SchemaKind;

    #[test]
    fn transfer_event() {
        let s = parse_declaration(
            "event Transfer(address indexed from, address indexed to, uint256 value)",
        )
        .unwrap();
        assert_eq!(s.kind(), SchemaKind::Event);
        assert_eq!(s.signature(), "Transfer(address,address,uint256)");
        assert_eq!(s.indexed_params().count(), 2);
        assert_eq!(
            s.declaration(),
            "event Transfer(address indexed from, address indexed to, uint256 value)"
        );
    }

    #[test]
    fn function_with_modifiers_and_tuples() {
        let s = parse_declaration(
            "function fill((address maker, uint256 amount)[] calldata orders, bytes sig) external returns (bool);",
        )
        .unwrap();
        assert_eq!(s.signature(), "fill((address,uint256)[],bytes)");
        assert_eq!(s.params()[0].name, "orders");
        assert_eq!(s.fingerprint().to_hex().len(), 10);
    }

    #[test]
    fn anonymous_and_unnamed() {
        let s = parse_declaration("event Log(bytes32 indexed, uint256) anonymous").unwrap();
        assert!(s.is_anonymous());
        assert_eq!(s.params()[0].name, "arg0");
        assert!(s.topic0().is_none());
    }

    #[test]
    fn source_skips_comments() {
        let text = "
            // ERC-20
            event Approval(address indexed owner, address indexed spender, uint256 value)
            # selector 0xa9059cbb
            function transfer(address to, uint256 amount)
        ";
        let schemas = Declarations::new(text).schemas().unwrap();
        assert_eq!(schemas.len(), 2);
    }

    #[test]
    fn rejects_garbage() {
        for line in [
            "struct Foo(uint256 a)",
            "event Foo(uint256",
            "event Foo(uint7 a)",
            "function f(uint256 indexed a)",
            "event E(uint256 a) extra",
        ] {
            assert!(parse_declaration(line).is_err(), "{line}");
        }
    }
}
