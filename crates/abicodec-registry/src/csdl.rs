//! CSDL (Contract Schema Definition Language) parser.
//!
//! CSDL is a YAML-based DSL for declaring event and function schemas:
//!
//! ```yaml
//! schema ERC20Transfer:
//!   version: 1
//!   event: Transfer
//!   fingerprint: "0xddf252ad…"      # optional; checked against the computed one
//!   fields:
//!     from:  { type: address, indexed: true }
//!     to:    { type: address, indexed: true }
//!     value: { type: uint256 }
//!   meta:
//!     protocol: erc20
//!     category: token
//! ```
//!
//! Function schemas use `function: <name>` instead of `event:`; events may set
//! `anonymous: true`. A single `.csdl` file may contain multiple documents
//! separated by `---`.
//!
//! Registry keys are optional: `chains`, `address` (one or a list),
//! `deprecated`, `supersedes`, `superseded_by`, field-level `nullable` and
//! `description`, and `meta.verified` / `meta.trust_level` /
//! `meta.provenance_sig`.

use abicodec_core::{
    error::SchemaError,
    schema::{Parameter, Schema, SchemaMeta, TrustLevel},
    types::TypeDescriptor,
};
use indexmap::IndexMap;
use serde::Deserialize;

use crate::source::SchemaSource;

// ─── Raw CSDL serde types ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CsdlRaw {
    #[serde(default)]
    version: Option<u32>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    function: Option<String>,
    #[serde(default)]
    anonymous: bool,
    #[serde(default)]
    fingerprint: Option<String>,
    #[serde(default)]
    chains: Vec<String>,
    #[serde(default)]
    address: Option<serde_yaml::Value>,
    #[serde(default)]
    supersedes: Option<String>,
    #[serde(default)]
    superseded_by: Option<String>,
    #[serde(default)]
    deprecated: bool,
    // IndexMap preserves YAML insertion order, which is the ABI parameter order.
    #[serde(default)]
    fields: IndexMap<String, CsdlFieldRaw>,
    #[serde(default)]
    meta: CsdlMetaRaw,
}

#[derive(Debug, Deserialize, Default)]
struct CsdlMetaRaw {
    #[serde(default)]
    protocol: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    trust_level: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    provenance_sig: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CsdlFieldRaw {
    #[serde(rename = "type")]
    ty: String,
    #[serde(default)]
    indexed: bool,
    #[serde(default)]
    #[allow(dead_code)]
    nullable: bool,
    #[serde(default)]
    #[allow(dead_code)]
    description: Option<String>,
}

// ─── Parser ───────────────────────────────────────────────────────────────────

pub struct CsdlParser;

impl CsdlParser {
    /// Parse the first schema document from a CSDL YAML string.
    /// For files with multiple schemas (`---` separator), use `parse_all()`.
    pub fn parse(yaml: &str) -> Result<Schema, SchemaError> {
        Self::parse_all(yaml)?
            .into_iter()
            .next()
            .ok_or_else(|| SchemaError::Parse("empty CSDL file".into()))
    }

    /// Parse all schema documents from a CSDL YAML string, in file order.
    pub fn parse_all(yaml: &str) -> Result<Vec<Schema>, SchemaError> {
        use serde::de::Deserialize as _;

        let mut schemas = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            let value = serde_yaml::Value::deserialize(doc)
                .map_err(|e| SchemaError::Parse(e.to_string()))?;
            // trailing `---`
            if value.is_null() {
                continue;
            }
            schemas.push(Self::parse_value(value)?);
        }
        Ok(schemas)
    }

    /// Parse one document. The top-level key is `schema <Id>`.
    fn parse_value(value: serde_yaml::Value) -> Result<Schema, SchemaError> {
        let serde_yaml::Value::Mapping(mapping) = value else {
            return Err(SchemaError::Parse(
                "CSDL document must be a YAML mapping".into(),
            ));
        };

        let (id, body) = mapping
            .into_iter()
            .find_map(|(k, v)| {
                let id = k.as_str()?.strip_prefix("schema ")?.trim().to_string();
                Some((id, v))
            })
            .ok_or_else(|| SchemaError::Parse("missing 'schema <Name>' key".into()))?;

        let body: CsdlRaw = serde_yaml::from_value(body)
            .map_err(|e| SchemaError::Parse(format!("schema '{id}': {e}")))?;

        let mut params = Vec::with_capacity(body.fields.len());
        for (name, field) in &body.fields {
            let ty = TypeDescriptor::parse(&field.ty)?;
            params.push(Parameter {
                name: name.clone(),
                ty,
                indexed: field.indexed,
            });
        }

        let schema = match (body.event, body.function) {
            (Some(event), None) => Schema::event(event, params, body.anonymous)?,
            (None, Some(function)) if !body.anonymous => Schema::function(function, params)?,
            (None, Some(_)) => {
                return Err(SchemaError::Parse(format!(
                    "schema '{id}': functions cannot be anonymous"
                )))
            }
            _ => {
                return Err(SchemaError::Parse(format!(
                    "schema '{id}': exactly one of 'event' or 'function' is required"
                )))
            }
        };

        if let Some(declared) = body.fingerprint {
            let computed = schema.fingerprint();
            if !declared.trim().eq_ignore_ascii_case(&computed.to_hex()) {
                return Err(SchemaError::FingerprintMismatch {
                    signature: schema.signature().to_string(),
                    declared,
                    computed,
                });
            }
        }

        let addresses = parse_addresses(&id, body.address)?;
        Ok(schema.with_meta(SchemaMeta {
            id: Some(id),
            protocol: body.meta.protocol,
            category: body.meta.category,
            description: body.description,
            version: body.version,
            chains: body.chains,
            addresses,
            deprecated: body.deprecated,
            supersedes: body.supersedes,
            superseded_by: body.superseded_by,
            verified: body.meta.verified,
            trust_level: body
                .meta
                .trust_level
                .as_deref()
                .map(TrustLevel::from_label)
                .unwrap_or_default(),
        }))
    }
}

/// `address` may be null, a single string or a list of strings.
fn parse_addresses(
    id: &str,
    value: Option<serde_yaml::Value>,
) -> Result<Vec<String>, SchemaError> {
    use serde_yaml::Value;

    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s]),
        Some(Value::Sequence(seq)) => seq
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                other => Err(SchemaError::Parse(format!(
                    "schema '{id}': address entries must be strings, got {other:?}"
                ))),
            })
            .collect(),
        Some(other) => Err(SchemaError::Parse(format!(
            "schema '{id}': address must be a string or a list, got {other:?}"
        ))),
    }
}

/// CSDL text as a [`SchemaSource`].
#[derive(Debug, Clone)]
pub struct CsdlSource {
    text: String,
}

impl CsdlSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl SchemaSource for CsdlSource {
    fn schemas(&self) -> Result<Vec<Schema>, SchemaError> {
        CsdlParser::parse_all(&self.text)
    }
}
