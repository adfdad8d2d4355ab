//! Schema types: the in-memory description of an event or function.

use crate::error::SchemaError;
use crate::fingerprint::Fingerprint;
use crate::types::TypeDescriptor;
use alloy_primitives::{Selector, B256};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whether a schema describes an event log or a function call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    Event,
    Function,
}

impl std::fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaKind::Event => f.write_str("event"),
            SchemaKind::Function => f.write_str("function"),
        }
    }
}

/// A single parameter of an event or function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub ty: TypeDescriptor,
    /// Events only: the value is carried in a topic rather than in `data`.
    pub indexed: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed: false,
        }
    }

    pub fn indexed(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed: true,
        }
    }
}

/// Descriptive metadata; never part of the fingerprint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMeta {
    /// Identifier given by the source, e.g. "ERC20Transfer"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Protocol slug, e.g. "uniswap-v3"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Category, e.g. "dex", "token"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Schema revision as declared by its source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Chain slugs the schema applies to, e.g. "ethereum", "base"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chains: Vec<String>,
    /// Contract addresses the schema is pinned to; empty means any emitter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,
    /// Deprecated revisions are skipped when resolving the latest version
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supersedes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub verified: bool,
    #[serde(default)]
    pub trust_level: TrustLevel,
}

/// How far a schema's provenance has been checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    #[default]
    Unverified,
    CommunityVerified,
    MaintainerVerified,
    ProtocolVerified,
}

impl TrustLevel {
    /// Unknown labels fall back to `Unverified`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "community_verified" => Self::CommunityVerified,
            "maintainer_verified" => Self::MaintainerVerified,
            "protocol_verified" => Self::ProtocolVerified,
            _ => Self::Unverified,
        }
    }
}

impl SchemaMeta {
    /// The key schemas are versioned under: the source id, else the schema name.
    pub fn key<'a>(&'a self, schema_name: &'a str) -> &'a str {
        self.id.as_deref().unwrap_or(schema_name)
    }

    pub fn applies_to_chain(&self, chain: &str) -> bool {
        self.chains.iter().any(|c| c == chain)
    }
}

/// A validated event or function schema.
///
/// The canonical signature and fingerprint are computed once by the
/// constructors and are read-only afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    kind: SchemaKind,
    name: String,
    params: Vec<Parameter>,
    anonymous: bool,
    signature: String,
    fingerprint: Fingerprint,
    meta: SchemaMeta,
}

impl Schema {
    /// Build an event schema. Unnamed parameters are named `arg{i}`.
    pub fn event(
        name: impl Into<String>,
        params: Vec<Parameter>,
        anonymous: bool,
    ) -> Result<Self, SchemaError> {
        Self::build(SchemaKind::Event, name.into(), params, anonymous)
    }

    /// Build a function schema. Function parameters cannot be indexed.
    pub fn function(name: impl Into<String>, params: Vec<Parameter>) -> Result<Self, SchemaError> {
        Self::build(SchemaKind::Function, name.into(), params, false)
    }

    fn build(
        kind: SchemaKind,
        name: String,
        mut params: Vec<Parameter>,
        anonymous: bool,
    ) -> Result<Self, SchemaError> {
        let types: Vec<String> = params.iter().map(|p| p.ty.canonical()).collect();
        let signature = format!("{name}({})", types.join(","));
        let malformed = |reason: &str| SchemaError::MalformedSignature {
            signature: signature.clone(),
            reason: reason.to_string(),
        };

        if !is_identifier(&name) {
            return Err(malformed("name is not a valid identifier"));
        }
        for param in &params {
            param.ty.validate()?;
        }

        let indexed = params.iter().filter(|p| p.indexed).count();
        match kind {
            SchemaKind::Function if indexed > 0 => {
                return Err(malformed("function parameters cannot be indexed"));
            }
            // topics[0] is the signature unless the event is anonymous
            SchemaKind::Event if indexed > if anonymous { 4 } else { 3 } => {
                return Err(malformed("too many indexed parameters"));
            }
            _ => {}
        }

        for (i, param) in params.iter_mut().enumerate() {
            if param.name.is_empty() {
                param.name = format!("arg{i}");
            }
        }

        let fingerprint = match kind {
            SchemaKind::Event => Fingerprint::event(&signature),
            SchemaKind::Function => Fingerprint::function(&signature),
        };

        Ok(Self {
            kind,
            name,
            params,
            anonymous,
            signature,
            fingerprint,
            meta: SchemaMeta::default(),
        })
    }

    /// Attach descriptive metadata.
    pub fn with_meta(mut self, meta: SchemaMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Canonical signature, e.g. `"transfer(address,uint256)"`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn meta(&self) -> &SchemaMeta {
        &self.meta
    }

    /// Function selector; `None` for events.
    pub fn selector(&self) -> Option<Selector> {
        match self.fingerprint {
            Fingerprint::Function(s) => Some(s),
            Fingerprint::Event(_) => None,
        }
    }

    /// Expected topics[0]; `None` for functions and anonymous events.
    pub fn topic0(&self) -> Option<B256> {
        match self.fingerprint {
            Fingerprint::Event(h) if !self.anonymous => Some(h),
            _ => None,
        }
    }

    /// Indexed parameters (EVM topics), in declaration order.
    pub fn indexed_params(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(|p| p.indexed)
    }

    /// Non-indexed parameters (EVM data payload), in declaration order.
    pub fn data_params(&self) -> impl Iterator<Item = &Parameter> {
        self.params.iter().filter(|p| !p.indexed)
    }

    /// Two schemas are structurally equal when they would decode every input
    /// identically: same kind, name, parameters (names, types, indexed flags)
    /// and anonymity. Metadata is ignored.
    pub fn is_structurally_equal(&self, other: &Schema) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.anonymous == other.anonymous
            && self.params == other.params
    }

    /// Human-readable declaration, e.g.
    /// `event Transfer(address indexed from, address indexed to, uint256 value)`.
    pub fn declaration(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| {
                if p.indexed {
                    format!("{} indexed {}", p.ty, p.name)
                } else {
                    format!("{} {}", p.ty, p.name)
                }
            })
            .collect();
        let anonymous = if self.anonymous { " anonymous" } else { "" };
        format!("{} {}({}){anonymous}", self.kind, self.name, params.join(", "))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A thread-safe, read-only view of a schema registry.
/// Concrete implementations live in `abicodec-registry`.
pub trait SchemaRegistry: Send + Sync {
    /// Look up a schema by its fingerprint.
    fn get_by_fingerprint(&self, fp: &Fingerprint) -> Option<Arc<Schema>>;

    /// Reverse index: the fingerprint of a loaded schema with this canonical signature.
    fn fingerprint_of(&self, kind: SchemaKind, signature: &str) -> Option<Fingerprint>;

    /// Number of schemas stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a loaded schema by canonical signature.
    fn get_by_signature(&self, kind: SchemaKind, signature: &str) -> Option<Arc<Schema>> {
        let fp = self.fingerprint_of(kind, signature)?;
        self.get_by_fingerprint(&fp)
    }
}

impl<T: SchemaRegistry + ?Sized> SchemaRegistry for Arc<T> {
    fn get_by_fingerprint(&self, fp: &Fingerprint) -> Option<Arc<Schema>> {
        (**self).get_by_fingerprint(fp)
    }

    fn fingerprint_of(&self, kind: SchemaKind, signature: &str) -> Option<Fingerprint> {
        (**self).fingerprint_of(kind, signature)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer_event() -> Schema {
        Schema::event(
            "Transfer",
            vec![
                Parameter::indexed("from", TypeDescriptor::Address),
                Parameter::indexed("to", TypeDescriptor::Address),
                Parameter::new("value", TypeDescriptor::Uint(256)),
            ],
            false,
        )
        .unwrap()
    }

    #[test]
    fn event_signature_and_fingerprint() {
        let s = transfer_event();
        assert_eq!(s.signature(), "Transfer(address,address,uint256)");
        assert_eq!(
            s.fingerprint().to_hex(),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
        assert!(s.topic0().is_some());
        assert!(s.selector().is_none());
        assert_eq!(s.indexed_params().count(), 2);
        assert_eq!(s.data_params().count(), 1);
    }

    #[test]
    fn function_selector() {
        let s = Schema::function(
            "transfer",
            vec![
                Parameter::new("to", TypeDescriptor::Address),
                Parameter::new("amount", TypeDescriptor::Uint(256)),
            ],
        )
        .unwrap();
        assert_eq!(s.fingerprint().to_hex(), "0xa9059cbb");
        assert_eq!(s.selector().unwrap().as_slice(), &[0xa9, 0x05, 0x9c, 0xbb]);
    }

    #[test]
    fn tuple_params_use_canonical_form() {
        let ty = TypeDescriptor::parse("(address token,uint256 amount)[]").unwrap();
        let s = Schema::function("batch", vec![Parameter::new("items", ty)]).unwrap();
        assert_eq!(s.signature(), "batch((address,uint256)[])");
    }

    #[test]
    fn unnamed_params_get_positional_names() {
        let s = Schema::function("f", vec![Parameter::new("", TypeDescriptor::Bool)]).unwrap();
        assert_eq!(s.params()[0].name, "arg0");
    }

    #[test]
    fn rejects_invalid_schemas() {
        assert!(Schema::function("", vec![]).is_err());
        assert!(Schema::function("f", vec![Parameter::indexed("x", TypeDescriptor::Bool)]).is_err());
        assert!(Schema::function("f", vec![Parameter::new("x", TypeDescriptor::Uint(7))]).is_err());
        let four = (0..4)
            .map(|i| Parameter::indexed(format!("p{i}"), TypeDescriptor::Bool))
            .collect::<Vec<_>>();
        assert!(Schema::event("E", four.clone(), false).is_err());
        assert!(Schema::event("E", four, true).is_ok());
    }

    #[test]
    fn structural_equality_sees_indexed_flags() {
        let erc20 = transfer_event();
        let erc721 = Schema::event(
            "Transfer",
            vec![
                Parameter::indexed("from", TypeDescriptor::Address),
                Parameter::indexed("to", TypeDescriptor::Address),
                Parameter::indexed("tokenId", TypeDescriptor::Uint(256)),
            ],
            false,
        )
        .unwrap();
        assert_eq!(erc20.fingerprint(), erc721.fingerprint());
        assert!(!erc20.is_structurally_equal(&erc721));
        assert!(erc20.is_structurally_equal(&transfer_event()));
    }

    #[test]
    fn declaration_rendering() {
        assert_eq!(
            transfer_event().declaration(),
            "event Transfer(address indexed from, address indexed to, uint256 value)"
        );
    }
}
