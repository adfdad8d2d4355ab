//! JSON boundary for `NormalizedValue`.
//!
//! Calling layers hand values over as JSON (CLI arguments, EIP-712 messages).
//! Reading is type-directed: the `TypeDescriptor` decides how a JSON value is
//! interpreted. Integers accept JSON numbers or decimal / `0x` hex strings;
//! bytes and addresses are `0x` hex strings.

use crate::error::JsonValueError;
use crate::types::TypeDescriptor;
use crate::value::{int_fits, uint_fits, NormalizedValue};
use alloy_primitives::{Address, I256, U256};
use serde_json::{Map, Value};
use std::str::FromStr;

impl NormalizedValue {
    /// Read a JSON value as an instance of `ty`.
    pub fn from_json(ty: &TypeDescriptor, json: &Value) -> Result<Self, JsonValueError> {
        let fail = |reason: String| JsonValueError {
            expected: ty.to_string(),
            reason,
        };
        match ty {
            TypeDescriptor::Uint(bits) => {
                let v = parse_uint(json).map_err(fail)?;
                if !uint_fits(&v, *bits) {
                    return Err(fail(format!("{v} does not fit in {bits} bits")));
                }
                Ok(NormalizedValue::UInt(v))
            }
            TypeDescriptor::Int(bits) => {
                let v = parse_int(json).map_err(fail)?;
                if !int_fits(&v, *bits) {
                    return Err(fail(format!("{v} does not fit in {bits} bits")));
                }
                Ok(NormalizedValue::Int(v))
            }
            TypeDescriptor::Address => {
                let s = json.as_str().ok_or_else(|| fail("expected a hex string".into()))?;
                Address::from_str(s)
                    .map(NormalizedValue::Address)
                    .map_err(|e| fail(e.to_string()))
            }
            TypeDescriptor::Bool => match json {
                Value::Bool(b) => Ok(NormalizedValue::Bool(*b)),
                Value::String(s) if s == "true" => Ok(NormalizedValue::Bool(true)),
                Value::String(s) if s == "false" => Ok(NormalizedValue::Bool(false)),
                _ => Err(fail("expected a boolean".into())),
            },
            TypeDescriptor::FixedBytes(n) => {
                let bytes = parse_hex(json).map_err(fail)?;
                if bytes.len() != usize::from(*n) {
                    return Err(fail(format!("expected {n} bytes, got {}", bytes.len())));
                }
                Ok(NormalizedValue::Bytes(bytes))
            }
            TypeDescriptor::Bytes => parse_hex(json).map(NormalizedValue::Bytes).map_err(fail),
            TypeDescriptor::String => json
                .as_str()
                .map(|s| NormalizedValue::String(s.to_string()))
                .ok_or_else(|| fail("expected a string".into())),
            TypeDescriptor::Array(elem) => {
                let items = json.as_array().ok_or_else(|| fail("expected an array".into()))?;
                items
                    .iter()
                    .map(|item| NormalizedValue::from_json(elem, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(NormalizedValue::Array)
            }
            TypeDescriptor::FixedArray(elem, len) => {
                let items = json.as_array().ok_or_else(|| fail("expected an array".into()))?;
                if items.len() != *len {
                    return Err(fail(format!("expected {len} elements, got {}", items.len())));
                }
                items
                    .iter()
                    .map(|item| NormalizedValue::from_json(elem, item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(NormalizedValue::Array)
            }
            TypeDescriptor::Tuple(fields) => match json {
                Value::Object(obj) => fields
                    .iter()
                    .map(|(name, fty)| {
                        let item = obj
                            .get(name)
                            .ok_or_else(|| fail(format!("missing component `{name}`")))?;
                        Ok((name.clone(), NormalizedValue::from_json(fty, item)?))
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(NormalizedValue::Tuple),
                Value::Array(items) => {
                    if items.len() != fields.len() {
                        return Err(fail(format!(
                            "expected {} components, got {}",
                            fields.len(),
                            items.len()
                        )));
                    }
                    fields
                        .iter()
                        .zip(items)
                        .map(|((name, fty), item)| {
                            Ok((name.clone(), NormalizedValue::from_json(fty, item)?))
                        })
                        .collect::<Result<Vec<_>, _>>()
                        .map(NormalizedValue::Tuple)
                }
                _ => Err(fail("expected an object or array".into())),
            },
        }
    }

    /// Render as plain JSON. Integers become decimal strings so 256-bit values
    /// survive consumers limited to 53-bit numbers.
    pub fn to_json(&self) -> Value {
        match self {
            NormalizedValue::UInt(v) => Value::String(v.to_string()),
            NormalizedValue::Int(v) => Value::String(v.to_string()),
            NormalizedValue::Address(a) => Value::String(a.to_checksum(None)),
            NormalizedValue::Bool(b) => Value::Bool(*b),
            NormalizedValue::Bytes(b) => Value::String(format!("0x{}", hex::encode(b))),
            NormalizedValue::String(s) => Value::String(s.clone()),
            NormalizedValue::Array(items) => {
                Value::Array(items.iter().map(NormalizedValue::to_json).collect())
            }
            NormalizedValue::Tuple(fields) => {
                let mut map = Map::with_capacity(fields.len());
                for (name, v) in fields {
                    map.insert(name.clone(), v.to_json());
                }
                Value::Object(map)
            }
        }
    }
}

fn parse_uint(json: &Value) -> Result<U256, String> {
    match json {
        Value::Number(n) => n
            .as_u64()
            .map(U256::from)
            .ok_or_else(|| format!("{n} is not a non-negative integer")),
        Value::String(s) => {
            let s = s.trim();
            let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(s, 10),
            };
            parsed.map_err(|e| format!("invalid unsigned integer `{s}`: {e}"))
        }
        _ => Err("expected a number or numeric string".into()),
    }
}

fn parse_int(json: &Value) -> Result<I256, String> {
    match json {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                I256::try_from(i).map_err(|e| format!("{n}: {e}"))
            } else if let Some(u) = n.as_u64() {
                I256::try_from(U256::from(u)).map_err(|e| format!("{n}: {e}"))
            } else {
                Err(format!("{n} is not an integer"))
            }
        }
        Value::String(s) => {
            let s = s.trim();
            let (negative, digits) = match s.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, s),
            };
            let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
                Some(hex) => U256::from_str_radix(hex, 16),
                None => U256::from_str_radix(digits, 10),
            }
            .map_err(|e| format!("invalid integer `{s}`: {e}"))?;
            let out_of_range = || format!("integer `{s}` out of 256-bit range");
            if negative {
                // |I256::MIN| = 2^255 is representable only on the negative side.
                let min_magnitude = I256::MIN.into_raw();
                if magnitude > min_magnitude {
                    return Err(out_of_range());
                }
                Ok(I256::from_raw(magnitude.wrapping_neg()))
            } else {
                I256::try_from(magnitude).map_err(|_| out_of_range())
            }
        }
        _ => Err("expected a number or numeric string".into()),
    }
}

fn parse_hex(json: &Value) -> Result<Vec<u8>, String> {
    let s = json.as_str().ok_or("expected a 0x-prefixed hex string")?;
    let hex = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(hex).map_err(|e| format!("invalid hex `{s}`: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ty(s: &str) -> TypeDescriptor {
        TypeDescriptor::parse(s).unwrap()
    }

    #[test]
    fn uint_from_number_and_strings() {
        let expected = NormalizedValue::UInt(U256::from(255u64));
        assert_eq!(NormalizedValue::from_json(&ty("uint8"), &json!(255)).unwrap(), expected);
        assert_eq!(NormalizedValue::from_json(&ty("uint8"), &json!("255")).unwrap(), expected);
        assert_eq!(NormalizedValue::from_json(&ty("uint8"), &json!("0xff")).unwrap(), expected);
        assert!(NormalizedValue::from_json(&ty("uint8"), &json!(256)).is_err());
        assert!(NormalizedValue::from_json(&ty("uint8"), &json!(-1)).is_err());
    }

    #[test]
    fn int_from_numbers_above_i64() {
        let v = NormalizedValue::from_json(&ty("int128"), &json!(u64::MAX)).unwrap();
        assert_eq!(v, NormalizedValue::Int(I256::try_from(U256::from(u64::MAX)).unwrap()));
        let v = NormalizedValue::from_json(&ty("int256"), &json!(1u64 << 63)).unwrap();
        assert_eq!(v, NormalizedValue::Int(I256::try_from(U256::from(1u64 << 63)).unwrap()));
        // int64 tops out at 2^63 - 1
        assert!(NormalizedValue::from_json(&ty("int64"), &json!(1u64 << 63)).is_err());
        assert!(NormalizedValue::from_json(&ty("int256"), &json!(1.5)).is_err());
        assert_eq!(
            NormalizedValue::from_json(&ty("int8"), &json!(-128)).unwrap(),
            NormalizedValue::Int(I256::try_from(-128i64).unwrap())
        );
    }

    #[test]
    fn int_from_negative_strings() {
        let v = NormalizedValue::from_json(&ty("int16"), &json!("-300")).unwrap();
        assert_eq!(v, NormalizedValue::Int(I256::try_from(-300i64).unwrap()));
        assert!(NormalizedValue::from_json(&ty("int8"), &json!("-129")).is_err());
        let min = format!("-{}", I256::MIN.into_raw());
        assert_eq!(
            NormalizedValue::from_json(&ty("int256"), &json!(min)).unwrap(),
            NormalizedValue::Int(I256::MIN)
        );
    }

    #[test]
    fn fixed_bytes_length_enforced() {
        assert!(NormalizedValue::from_json(&ty("bytes2"), &json!("0xdead")).is_ok());
        assert!(NormalizedValue::from_json(&ty("bytes4"), &json!("0xdead")).is_err());
    }

    #[test]
    fn tuple_from_object_and_array() {
        let t = ty("(address who,uint256 amount)");
        let addr = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";
        let from_obj =
            NormalizedValue::from_json(&t, &json!({"who": addr, "amount": "7"})).unwrap();
        let from_arr = NormalizedValue::from_json(&t, &json!([addr, 7])).unwrap();
        assert_eq!(from_obj, from_arr);
        assert!(NormalizedValue::from_json(&t, &json!({"who": addr})).is_err());
    }

    #[test]
    fn to_json_shapes() {
        let v = NormalizedValue::Tuple(vec![
            ("n".into(), NormalizedValue::UInt(U256::MAX)),
            ("b".into(), NormalizedValue::Bytes(vec![1, 2])),
        ]);
        let j = v.to_json();
        assert_eq!(j["n"], json!(U256::MAX.to_string()));
        assert_eq!(j["b"], json!("0x0102"));
    }
}
