//! EIP-712 typed structured data: type encoding, struct hashing and parsing.
//!
//! A typed-data document (`eth_signTypedData_v4`) has four top-level keys:
//! - `types`: struct type definitions (including `EIP712Domain`)
//! - `primaryType`: the name of the root type being signed
//! - `domain`: domain separator values
//! - `message`: the actual data being signed
//!
//! The signing digest is `keccak256(0x19 ‖ 0x01 ‖ domainSeparator ‖ hashStruct(message))`.
//!
//! # Reference
//! <https://eips.ethereum.org/EIPS/eip-712>

use abicodec_core::{
    config::CodecConfig,
    error::{EncodeError, Eip712Error},
    fingerprint::keccak256,
    types::TypeDescriptor,
    value::NormalizedValue,
};
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use crate::abi::AbiEncoder;

/// Name of the domain struct; never part of a message's dependency set.
pub const DOMAIN_TYPE_NAME: &str = "EIP712Domain";

/// A single field within an EIP-712 type definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Eip712Field {
    pub name: String,
    /// Type string as written, e.g. "address", "uint256", "Person[]"
    #[serde(rename = "type")]
    pub ty: String,
}

impl Eip712Field {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Struct definitions keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Eip712Types {
    structs: BTreeMap<String, Vec<Eip712Field>>,
}

impl Eip712Types {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, fields: Vec<Eip712Field>) {
        self.structs.insert(name.into(), fields);
    }

    pub fn with(mut self, name: impl Into<String>, fields: Vec<Eip712Field>) -> Self {
        self.insert(name, fields);
        self
    }

    pub fn get(&self, name: &str) -> Option<&[Eip712Field]> {
        self.structs.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    fn fields(&self, name: &str) -> Result<&[Eip712Field], Eip712Error> {
        self.get(name).ok_or_else(|| Eip712Error::UnknownType {
            name: name.to_string(),
        })
    }
}

/// A field type after resolution against the type map.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FieldType<'a> {
    /// An ABI type: elementary, `bytes` or `string`
    Atomic(TypeDescriptor),
    Struct(&'a str),
    Array(Box<FieldType<'a>>),
    FixedArray(Box<FieldType<'a>>, usize),
}

impl<'a> FieldType<'a> {
    fn struct_name(&self) -> Option<&'a str> {
        match self {
            FieldType::Struct(name) => Some(*name),
            FieldType::Array(inner) | FieldType::FixedArray(inner, _) => inner.struct_name(),
            FieldType::Atomic(_) => None,
        }
    }
}

/// The EIP-712 domain. Only present fields take part in the separator,
/// in the order `name, version, chainId, verifyingContract, salt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Domain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U256>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<B256>,
}

impl Eip712Domain {
    /// Read a domain object such as
    /// `{"name": "Ether Mail", "version": "1", "chainId": 1, "verifyingContract": "0x…"}`.
    pub fn from_json(json: &Value) -> Result<Self, Eip712Error> {
        let obj = json.as_object().ok_or_else(|| Eip712Error::TypeMismatch {
            field: DOMAIN_TYPE_NAME.into(),
            expected: "object".into(),
            got: json_kind(json).into(),
        })?;

        let mut domain = Eip712Domain::default();
        for (key, value) in obj {
            let invalid = |reason: String| Eip712Error::InvalidValue {
                field: key.clone(),
                reason,
            };
            let string = || {
                value
                    .as_str()
                    .map(str::to_owned)
                    .ok_or_else(|| invalid("expected a string".into()))
            };
            let typed = |ty: TypeDescriptor| {
                NormalizedValue::from_json(&ty, value).map_err(|e| invalid(e.to_string()))
            };
            match key.as_str() {
                "name" => domain.name = Some(string()?),
                "version" => domain.version = Some(string()?),
                "chainId" => domain.chain_id = typed(TypeDescriptor::Uint(256))?.as_u256(),
                "verifyingContract" => {
                    domain.verifying_contract = typed(TypeDescriptor::Address)?.as_address()
                }
                "salt" => {
                    domain.salt = typed(TypeDescriptor::FixedBytes(32))?
                        .as_bytes()
                        .map(B256::from_slice)
                }
                _ => return Err(invalid("not an EIP712Domain field".into())),
            }
        }
        Ok(domain)
    }

    /// The `EIP712Domain` fields that are present, in canonical order.
    pub fn fields(&self) -> Vec<Eip712Field> {
        let mut fields = Vec::with_capacity(5);
        if self.name.is_some() {
            fields.push(Eip712Field::new("name", "string"));
        }
        if self.version.is_some() {
            fields.push(Eip712Field::new("version", "string"));
        }
        if self.chain_id.is_some() {
            fields.push(Eip712Field::new("chainId", "uint256"));
        }
        if self.verifying_contract.is_some() {
            fields.push(Eip712Field::new("verifyingContract", "address"));
        }
        if self.salt.is_some() {
            fields.push(Eip712Field::new("salt", "bytes32"));
        }
        fields
    }

    /// `EIP712Domain(string name,…)` over the present fields.
    pub fn encode_type(&self) -> String {
        struct_signature(DOMAIN_TYPE_NAME, &self.fields())
    }

    /// The domain as a struct value, field names matching `fields()`.
    pub fn to_value(&self) -> NormalizedValue {
        let mut out = Vec::with_capacity(5);
        if let Some(name) = &self.name {
            out.push(("name".to_string(), NormalizedValue::String(name.clone())));
        }
        if let Some(version) = &self.version {
            out.push(("version".to_string(), NormalizedValue::String(version.clone())));
        }
        if let Some(chain_id) = self.chain_id {
            out.push(("chainId".to_string(), NormalizedValue::UInt(chain_id)));
        }
        if let Some(contract) = self.verifying_contract {
            out.push(("verifyingContract".to_string(), NormalizedValue::Address(contract)));
        }
        if let Some(salt) = self.salt {
            out.push(("salt".to_string(), NormalizedValue::Bytes(salt.to_vec())));
        }
        NormalizedValue::Tuple(out)
    }

    /// `hashStruct(EIP712Domain)`.
    pub fn separator(&self) -> B256 {
        domain_separator(self)
    }
}

/// `hashStruct` over the fixed `EIP712Domain` shape built from the present fields.
pub fn domain_separator(domain: &Eip712Domain) -> B256 {
    let mut enc = Vec::with_capacity(32 * 6);
    enc.extend_from_slice(keccak256(domain.encode_type()).as_slice());
    if let Some(name) = &domain.name {
        enc.extend_from_slice(keccak256(name).as_slice());
    }
    if let Some(version) = &domain.version {
        enc.extend_from_slice(keccak256(version).as_slice());
    }
    if let Some(chain_id) = domain.chain_id {
        enc.extend_from_slice(&chain_id.to_be_bytes::<32>());
    }
    if let Some(contract) = domain.verifying_contract {
        enc.extend_from_slice(contract.into_word().as_slice());
    }
    if let Some(salt) = domain.salt {
        enc.extend_from_slice(salt.as_slice());
    }
    keccak256(enc)
}

/// The final digest: `keccak256(0x19 ‖ 0x01 ‖ domainSeparator ‖ structHash)`.
pub fn sign_hash(domain_separator: &B256, struct_hash: &B256) -> B256 {
    let mut out = Vec::with_capacity(2 + 32 + 32);
    out.push(0x19);
    out.push(0x01);
    out.extend_from_slice(domain_separator.as_slice());
    out.extend_from_slice(struct_hash.as_slice());
    keccak256(out)
}

/// Type encoding, struct hashing and message parsing over one type map.
///
/// Type hashes of every well-formed struct are computed once at construction.
#[derive(Debug, Clone)]
pub struct Eip712Engine {
    types: Eip712Types,
    abi: AbiEncoder,
    max_depth: usize,
    type_hashes: BTreeMap<String, B256>,
}

impl Eip712Engine {
    pub fn new(types: Eip712Types) -> Self {
        Self::with_config(types, CodecConfig::default())
    }

    pub fn with_config(types: Eip712Types, config: CodecConfig) -> Self {
        let mut engine = Self {
            types,
            abi: AbiEncoder::new(config),
            max_depth: config.max_depth,
            type_hashes: BTreeMap::new(),
        };
        // malformed structs stay out of the cache and report their error on use
        let type_hashes = engine
            .types
            .structs
            .keys()
            .filter_map(|name| {
                let hash = engine.encode_type(name).ok().map(keccak256)?;
                Some((name.clone(), hash))
            })
            .collect();
        engine.type_hashes = type_hashes;
        engine
    }

    pub fn types(&self) -> &Eip712Types {
        &self.types
    }

    /// `Primary(type1 name1,…)` followed by every struct it references,
    /// transitively, in lexicographic order.
    pub fn encode_type(&self, primary: &str) -> Result<String, Eip712Error> {
        let mut deps = BTreeSet::new();
        self.collect_dependencies(primary, &mut Vec::new(), &mut deps)?;
        deps.remove(primary);

        let mut out = struct_signature(primary, self.types.fields(primary)?);
        for dep in deps {
            out.push_str(&struct_signature(dep, self.types.fields(dep)?));
        }
        Ok(out)
    }

    /// `keccak256(encode_type(primary))`.
    pub fn type_hash(&self, primary: &str) -> Result<B256, Eip712Error> {
        match self.type_hashes.get(primary) {
            Some(hash) => Ok(*hash),
            None => self.encode_type(primary).map(keccak256),
        }
    }

    /// `keccak256(typeHash ‖ encodeData(value))`.
    pub fn hash_struct(&self, primary: &str, value: &NormalizedValue) -> Result<B256, Eip712Error> {
        // validates the whole reference graph once; recursion below is acyclic
        self.encode_type(primary)?;
        self.hash_struct_at(primary, value, 0)
    }

    /// The concatenated field words of `value`, without the type hash.
    pub fn encode_data(&self, primary: &str, value: &NormalizedValue) -> Result<Vec<u8>, Eip712Error> {
        self.encode_type(primary)?;
        self.encode_data_at(primary, value, 0)
    }

    /// Read a JSON message as an instance of `primary`, validating its shape.
    /// The result is a tuple whose components follow the declared field order.
    pub fn parse_message(&self, primary: &str, json: &Value) -> Result<NormalizedValue, Eip712Error> {
        self.encode_type(primary)?;
        self.parse_struct(primary, json, 0)
    }

    fn enter(&self, depth: usize) -> Result<usize, Eip712Error> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(Eip712Error::DepthExceeded {
                max: self.max_depth,
            });
        }
        Ok(depth)
    }

    fn resolve<'a>(&'a self, ty: &'a str) -> Result<FieldType<'a>, Eip712Error> {
        if let Some(rest) = ty.strip_suffix(']') {
            let open = rest.rfind('[').ok_or_else(|| unknown(ty))?;
            let inner = self.resolve(&rest[..open])?;
            let len = &rest[open + 1..];
            if len.is_empty() {
                return Ok(FieldType::Array(Box::new(inner)));
            }
            return match len.parse::<usize>() {
                Ok(n) if n > 0 && !len.starts_with('0') => {
                    Ok(FieldType::FixedArray(Box::new(inner), n))
                }
                _ => Err(unknown(ty)),
            };
        }
        if self.types.contains(ty) {
            return Ok(FieldType::Struct(ty));
        }
        match TypeDescriptor::parse(ty) {
            Ok(desc)
                if desc.is_value_type()
                    || matches!(desc, TypeDescriptor::Bytes | TypeDescriptor::String) =>
            {
                Ok(FieldType::Atomic(desc))
            }
            _ => Err(unknown(ty)),
        }
    }

    fn collect_dependencies<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        deps: &mut BTreeSet<&'a str>,
    ) -> Result<(), Eip712Error> {
        if path.contains(&name) {
            let mut cycle: Vec<&str> = path.clone();
            cycle.push(name);
            return Err(Eip712Error::CircularTypeReference {
                path: cycle.join(" -> "),
            });
        }
        if deps.contains(name) {
            return Ok(());
        }
        if path.len() >= self.max_depth {
            return Err(Eip712Error::DepthExceeded {
                max: self.max_depth,
            });
        }

        path.push(name);
        for field in self.types.fields(name)? {
            if let Some(dep) = self.resolve(&field.ty)?.struct_name() {
                if dep != DOMAIN_TYPE_NAME {
                    self.collect_dependencies(dep, path, deps)?;
                }
            }
        }
        path.pop();
        deps.insert(name);
        Ok(())
    }

    fn hash_struct_at(
        &self,
        name: &str,
        value: &NormalizedValue,
        depth: usize,
    ) -> Result<B256, Eip712Error> {
        let mut enc = self.type_hash(name)?.to_vec();
        enc.extend(self.encode_data_at(name, value, depth)?);
        Ok(keccak256(enc))
    }

    fn encode_data_at(
        &self,
        name: &str,
        value: &NormalizedValue,
        depth: usize,
    ) -> Result<Vec<u8>, Eip712Error> {
        let depth = self.enter(depth)?;
        let fields = self.types.fields(name)?;
        if !matches!(value, NormalizedValue::Tuple(_)) {
            return Err(Eip712Error::TypeMismatch {
                field: name.to_string(),
                expected: "struct".into(),
                got: value.kind().into(),
            });
        }

        let mut out = Vec::with_capacity(32 * fields.len());
        for field in fields {
            let v = value.field(&field.name).ok_or_else(|| Eip712Error::MissingField {
                ty: name.to_string(),
                field: field.name.clone(),
            })?;
            let ty = self.resolve(&field.ty)?;
            out.extend_from_slice(&self.encode_field(&field.name, &ty, v, depth)?);
        }
        Ok(out)
    }

    /// The 32-byte encoding of one member: atomic words, hashed dynamic
    /// bytes, nested struct hashes, hashed concatenations for arrays.
    fn encode_field(
        &self,
        field: &str,
        ty: &FieldType<'_>,
        value: &NormalizedValue,
        depth: usize,
    ) -> Result<[u8; 32], Eip712Error> {
        let mismatch = |expected: String| Eip712Error::TypeMismatch {
            field: field.to_string(),
            expected,
            got: value.kind().into(),
        };
        match ty {
            FieldType::Atomic(TypeDescriptor::String) => match value {
                NormalizedValue::String(s) => Ok(keccak256(s).0),
                _ => Err(mismatch("string".into())),
            },
            FieldType::Atomic(TypeDescriptor::Bytes) => match value {
                NormalizedValue::Bytes(b) => Ok(keccak256(b).0),
                _ => Err(mismatch("bytes".into())),
            },
            FieldType::Atomic(desc) => self.abi.encode_word(desc, value).map_err(|e| match e {
                EncodeError::TypeMismatch { expected, got } => Eip712Error::TypeMismatch {
                    field: field.to_string(),
                    expected,
                    got,
                },
                other => Eip712Error::Encode(other),
            }),
            FieldType::Struct(name) => Ok(self.hash_struct_at(name, value, depth)?.0),
            FieldType::Array(inner) | FieldType::FixedArray(inner, _) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| mismatch("array".into()))?;
                if let FieldType::FixedArray(_, len) = ty {
                    if items.len() != *len {
                        return Err(mismatch(format!("array of {len} elements")));
                    }
                }
                let depth = self.enter(depth)?;
                let mut enc = Vec::with_capacity(32 * items.len());
                for item in items {
                    enc.extend_from_slice(&self.encode_field(field, inner, item, depth)?);
                }
                Ok(keccak256(enc).0)
            }
        }
    }

    fn parse_struct(&self, name: &str, json: &Value, depth: usize) -> Result<NormalizedValue, Eip712Error> {
        let depth = self.enter(depth)?;
        let fields = self.types.fields(name)?;
        let obj = json.as_object().ok_or_else(|| Eip712Error::TypeMismatch {
            field: name.to_string(),
            expected: "object".into(),
            got: json_kind(json).into(),
        })?;

        let mut out = Vec::with_capacity(fields.len());
        for field in fields {
            let item = obj.get(&field.name).ok_or_else(|| Eip712Error::MissingField {
                ty: name.to_string(),
                field: field.name.clone(),
            })?;
            let ty = self.resolve(&field.ty)?;
            out.push((field.name.clone(), self.parse_field(&field.name, &ty, item, depth)?));
        }
        Ok(NormalizedValue::Tuple(out))
    }

    fn parse_field(
        &self,
        field: &str,
        ty: &FieldType<'_>,
        json: &Value,
        depth: usize,
    ) -> Result<NormalizedValue, Eip712Error> {
        match ty {
            FieldType::Atomic(desc) => {
                NormalizedValue::from_json(desc, json).map_err(|e| Eip712Error::InvalidValue {
                    field: field.to_string(),
                    reason: e.to_string(),
                })
            }
            FieldType::Struct(name) => self.parse_struct(name, json, depth),
            FieldType::Array(inner) | FieldType::FixedArray(inner, _) => {
                let items = json.as_array().ok_or_else(|| Eip712Error::TypeMismatch {
                    field: field.to_string(),
                    expected: "array".into(),
                    got: json_kind(json).into(),
                })?;
                if let FieldType::FixedArray(_, len) = ty {
                    if items.len() != *len {
                        return Err(Eip712Error::TypeMismatch {
                            field: field.to_string(),
                            expected: format!("array of {len} elements"),
                            got: format!("array of {} elements", items.len()),
                        });
                    }
                }
                let depth = self.enter(depth)?;
                items
                    .iter()
                    .map(|item| self.parse_field(field, inner, item, depth))
                    .collect::<Result<Vec<_>, _>>()
                    .map(NormalizedValue::Array)
            }
        }
    }
}

fn unknown(ty: &str) -> Eip712Error {
    Eip712Error::UnknownType {
        name: ty.to_string(),
    }
}

fn struct_signature(name: &str, fields: &[Eip712Field]) -> String {
    let members: Vec<String> = fields
        .iter()
        .map(|f| format!("{} {}", f.ty, f.name))
        .collect();
    format!("{name}({})", members.join(","))
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A parsed EIP-712 typed data payload (`eth_signTypedData_v4` format).
#[derive(Debug, Clone)]
pub struct TypedData {
    pub types: Eip712Types,
    pub primary_type: String,
    pub domain: Eip712Domain,
    /// The message, shaped by `primary_type`
    pub message: NormalizedValue,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypedDataDocument {
    types: Eip712Types,
    primary_type: String,
    domain: Value,
    message: Value,
}

impl TypedData {
    /// Parse a JSON string conforming to the `eth_signTypedData_v4` format.
    pub fn from_json(json: &str) -> Result<Self, Eip712Error> {
        let doc: TypedDataDocument =
            serde_json::from_str(json).map_err(|e| Eip712Error::Json(e.to_string()))?;
        parse_typed_data(doc.types, &doc.primary_type, &doc.domain, &doc.message)
    }

    pub fn engine(&self) -> Eip712Engine {
        Eip712Engine::new(self.types.clone())
    }

    /// `hashStruct(EIP712Domain)`. A declared `EIP712Domain` type is checked
    /// against the domain object by [`parse_typed_data`].
    pub fn domain_separator(&self) -> B256 {
        self.domain.separator()
    }

    pub fn struct_hash(&self) -> Result<B256, Eip712Error> {
        self.engine().hash_struct(&self.primary_type, &self.message)
    }

    /// The digest a wallet signs.
    pub fn signing_hash(&self) -> Result<B256, Eip712Error> {
        Ok(sign_hash(&self.domain_separator(), &self.struct_hash()?))
    }
}

/// Resolve `types` from `primary`, then read and validate the domain and message.
///
/// When `types` declares `EIP712Domain`, its members must be exactly the
/// fields present in `domain`, in canonical order.
pub fn parse_typed_data(
    types: Eip712Types,
    primary: &str,
    domain: &Value,
    message: &Value,
) -> Result<TypedData, Eip712Error> {
    let engine = Eip712Engine::new(types);
    let message = engine.parse_message(primary, message)?;
    let domain = Eip712Domain::from_json(domain)?;
    if let Some(declared) = engine.types.get(DOMAIN_TYPE_NAME) {
        if declared != domain.fields().as_slice() {
            return Err(Eip712Error::TypeMismatch {
                field: DOMAIN_TYPE_NAME.into(),
                expected: struct_signature(DOMAIN_TYPE_NAME, declared),
                got: domain.encode_type(),
            });
        }
    }
    Ok(TypedData {
        types: engine.types,
        primary_type: primary.to_string(),
        domain,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // Mail example from EIP-712
    const EIP712_EXAMPLE: &str = r#"{
        "types": {
            "EIP712Domain": [
                {"name": "name",              "type": "string"},
                {"name": "version",           "type": "string"},
                {"name": "chainId",           "type": "uint256"},
                {"name": "verifyingContract", "type": "address"}
            ],
            "Mail": [
                {"name": "from",     "type": "Person"},
                {"name": "to",       "type": "Person"},
                {"name": "contents", "type": "string"}
            ],
            "Person": [
                {"name": "name",   "type": "string"},
                {"name": "wallet", "type": "address"}
            ]
        },
        "primaryType": "Mail",
        "domain": {
            "name": "Ether Mail",
            "version": "1",
            "chainId": 1,
            "verifyingContract": "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"
        },
        "message": {
            "from": {
                "name": "Cow",
                "wallet": "0xCD2a3d9F938E13CD947Ec05AbC7FE734Df8DD826"
            },
            "to": {
                "name": "Bob",
                "wallet": "0xbBbBBBBbbBBBbbbBbbBbbbbBBbBbbbbBbBbbBBbB"
            },
            "contents": "Hello, Bob!"
        }
    }"#;

    fn hex32(s: &str) -> B256 {
        s.parse().unwrap()
    }

    #[test]
    fn encode_type_orders_dependencies() {
        let td = TypedData::from_json(EIP712_EXAMPLE).unwrap();
        assert_eq!(
            td.engine().encode_type("Mail").unwrap(),
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
        assert_eq!(
            td.engine().type_hash("Mail").unwrap(),
            hex32("0xa0cedeb2dc280ba39b857546d74f5549c3a1d7bdc2dd96bf881f76108e23dac2")
        );
    }

    #[test]
    fn ether_mail_reference_hashes() {
        let td = TypedData::from_json(EIP712_EXAMPLE).unwrap();
        assert_eq!(
            td.domain_separator(),
            hex32("0xf2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f")
        );
        assert_eq!(
            td.struct_hash().unwrap(),
            hex32("0xc52c0ee5d84264471806290a3f2c4cecfc5490626bf912d01f240d7a274b371e")
        );
        assert_eq!(
            td.signing_hash().unwrap(),
            hex32("0xbe609aee343fb3c4b28e1df9e632fca64fcfaede20f02e86244efddf30957bd2")
        );
    }

    #[test]
    fn message_follows_declared_field_order() {
        let td = TypedData::from_json(EIP712_EXAMPLE).unwrap();
        let NormalizedValue::Tuple(fields) = &td.message else {
            panic!("expected a tuple");
        };
        let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["from", "to", "contents"]);
        assert_eq!(
            td.message.field("contents"),
            Some(&NormalizedValue::from("Hello, Bob!"))
        );
    }

    #[test]
    fn domain_type_only_lists_present_fields() {
        let domain = Eip712Domain {
            name: Some("Test".into()),
            version: Some("1".into()),
            chain_id: Some(U256::from(1u64)),
            ..Default::default()
        };
        assert_eq!(
            domain.encode_type(),
            "EIP712Domain(string name,string version,uint256 chainId)"
        );
    }

    #[test]
    fn unknown_and_missing() {
        let types = Eip712Types::new().with("A", vec![Eip712Field::new("b", "B")]);
        assert_eq!(
            Eip712Engine::new(types).encode_type("A"),
            Err(Eip712Error::UnknownType { name: "B".into() })
        );

        let types = Eip712Types::new().with("A", vec![Eip712Field::new("x", "uint256")]);
        let engine = Eip712Engine::new(types);
        assert!(matches!(
            engine.parse_message("A", &json!({})),
            Err(Eip712Error::MissingField { .. })
        ));
        assert!(matches!(
            engine.parse_message("A", &json!({"x": "not a number"})),
            Err(Eip712Error::InvalidValue { .. })
        ));
        assert!(matches!(
            engine.encode_type("Nope"),
            Err(Eip712Error::UnknownType { .. })
        ));
    }

    #[test]
    fn circular_references_rejected() {
        let types = Eip712Types::new()
            .with("A", vec![Eip712Field::new("b", "B")])
            .with("B", vec![Eip712Field::new("a", "A[]")]);
        assert_eq!(
            Eip712Engine::new(types).encode_type("A"),
            Err(Eip712Error::CircularTypeReference {
                path: "A -> B -> A".into()
            })
        );
    }

    #[test]
    fn arrays_hash_concatenated_members() {
        let types = Eip712Types::new().with("Batch", vec![Eip712Field::new("ids", "uint256[]")]);
        let engine = Eip712Engine::new(types);
        let value = engine
            .parse_message("Batch", &json!({"ids": [1, 2]}))
            .unwrap();

        let mut members = U256::from(1u64).to_be_bytes::<32>().to_vec();
        members.extend_from_slice(&U256::from(2u64).to_be_bytes::<32>());
        let mut expected = keccak256("Batch(uint256[] ids)").to_vec();
        expected.extend_from_slice(keccak256(members).as_slice());

        assert_eq!(engine.hash_struct("Batch", &value).unwrap(), keccak256(expected));
    }

    #[test]
    fn field_type_mismatch_names_the_field() {
        let types = Eip712Types::new().with("A", vec![Eip712Field::new("ok", "bool")]);
        let value = NormalizedValue::Tuple(vec![("ok".into(), NormalizedValue::from(1u64))]);
        assert!(matches!(
            Eip712Engine::new(types).hash_struct("A", &value),
            Err(Eip712Error::TypeMismatch { field, .. }) if field == "ok"
        ));
    }

    #[test]
    fn type_hashes_are_cached_per_struct() {
        let types = Eip712Types::new()
            .with("Order", vec![Eip712Field::new("legs", "Leg[]")])
            .with("Leg", vec![Eip712Field::new("amount", "uint256")])
            .with("Broken", vec![Eip712Field::new("x", "Missing")]);
        let engine = Eip712Engine::new(types);

        assert_eq!(engine.type_hashes.len(), 2);
        for name in ["Order", "Leg"] {
            assert_eq!(
                engine.type_hash(name).unwrap(),
                keccak256(engine.encode_type(name).unwrap())
            );
        }
        assert_eq!(
            engine.type_hash("Broken"),
            Err(Eip712Error::UnknownType {
                name: "Missing".into()
            })
        );

        let value = engine
            .parse_message("Order", &json!({"legs": [{"amount": 1}, {"amount": 2}]}))
            .unwrap();
        let leg = |n: u64| {
            let mut enc = keccak256("Leg(uint256 amount)").to_vec();
            enc.extend_from_slice(&U256::from(n).to_be_bytes::<32>());
            keccak256(enc)
        };
        let mut legs = leg(1).to_vec();
        legs.extend_from_slice(leg(2).as_slice());
        let mut expected = keccak256("Order(Leg[] legs)Leg(uint256 amount)").to_vec();
        expected.extend_from_slice(keccak256(legs).as_slice());
        assert_eq!(engine.hash_struct("Order", &value).unwrap(), keccak256(expected));
    }

    #[test]
    fn declared_domain_must_match_domain_object() {
        let mut doc: Value = serde_json::from_str(EIP712_EXAMPLE).unwrap();
        doc["types"]["EIP712Domain"]
            .as_array_mut()
            .unwrap()
            .retain(|f| f["name"] != "verifyingContract");
        assert!(matches!(
            TypedData::from_json(&doc.to_string()),
            Err(Eip712Error::TypeMismatch { field, .. }) if field == DOMAIN_TYPE_NAME
        ));

        let mut doc: Value = serde_json::from_str(EIP712_EXAMPLE).unwrap();
        doc["types"]["EIP712Domain"].as_array_mut().unwrap().swap(0, 1);
        assert!(TypedData::from_json(&doc.to_string()).is_err());

        // an undeclared domain type falls back to the present fields
        let mut doc: Value = serde_json::from_str(EIP712_EXAMPLE).unwrap();
        doc["types"].as_object_mut().unwrap().remove("EIP712Domain");
        assert_eq!(
            TypedData::from_json(&doc.to_string()).unwrap().domain_separator(),
            hex32("0xf2cee375fa42b42143804025fc449deafd50cc031ca257e0b194a650a912090f")
        );
    }

    #[test]
    fn malformed_document() {
        assert!(matches!(
            TypedData::from_json(r#"{"types": {}}"#),
            Err(Eip712Error::Json(_))
        ));
    }
}
