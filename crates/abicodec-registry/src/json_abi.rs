//! Standard Solidity JSON ABI as a schema source.
//!
//! Accepts either a bare ABI array or a compiler artifact object with an
//! `abi` key. Events and functions become schemas; constructors, errors,
//! fallback and receive entries are ignored.

use abicodec_core::{
    error::SchemaError,
    schema::{Parameter, Schema},
    types::TypeDescriptor,
};
use alloy_json_abi::{JsonAbi, Param};

use crate::source::SchemaSource;

#[derive(Debug, Clone)]
pub struct JsonAbiSource {
    text: String,
}

impl JsonAbiSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    fn abi(&self) -> Result<JsonAbi, SchemaError> {
        let parse_err = |e: serde_json::Error| SchemaError::Parse(format!("JSON ABI: {e}"));
        let value: serde_json::Value = serde_json::from_str(&self.text).map_err(parse_err)?;
        let value = match value {
            serde_json::Value::Object(mut obj) if obj.contains_key("abi") => {
                obj.remove("abi").unwrap_or_default()
            }
            other => other,
        };
        serde_json::from_value(value).map_err(parse_err)
    }
}

impl SchemaSource for JsonAbiSource {
    fn schemas(&self) -> Result<Vec<Schema>, SchemaError> {
        let abi = self.abi()?;
        let mut schemas = Vec::new();

        for event in abi.events() {
            let params = event
                .inputs
                .iter()
                .map(|p| {
                    Ok(Parameter {
                        name: p.name.clone(),
                        ty: descriptor(&p.ty, &p.components)?,
                        indexed: p.indexed,
                    })
                })
                .collect::<Result<Vec<_>, SchemaError>>()?;
            schemas.push(Schema::event(event.name.clone(), params, event.anonymous)?);
        }

        for function in abi.functions() {
            let params = function
                .inputs
                .iter()
                .map(|p| Ok(Parameter::new(p.name.clone(), descriptor(&p.ty, &p.components)?)))
                .collect::<Result<Vec<_>, SchemaError>>()?;
            schemas.push(Schema::function(function.name.clone(), params)?);
        }

        tracing::debug!(schemas = schemas.len(), "parsed JSON ABI");
        Ok(schemas)
    }
}

/// JSON ABI spells tuples as `tuple`, `tuple[]`, `tuple[2][]` with the
/// members in `components`.
fn descriptor(ty: &str, components: &[Param]) -> Result<TypeDescriptor, SchemaError> {
    let Some(suffix) = ty.strip_prefix("tuple") else {
        return TypeDescriptor::parse(ty);
    };
    let fields = components
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let name = if c.name.is_empty() {
                i.to_string()
            } else {
                c.name.clone()
            };
            Ok((name, descriptor(&c.ty, &c.components)?))
        })
        .collect::<Result<Vec<_>, SchemaError>>()?;
    TypeDescriptor::Tuple(fields).with_array_suffix(suffix)
}
