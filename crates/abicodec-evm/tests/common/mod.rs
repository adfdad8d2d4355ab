//! Strategies shared by the property tests.

#![allow(dead_code)]

use abicodec_core::{types::TypeDescriptor, value::NormalizedValue};
use alloy_primitives::{Address, I256, U256};
use proptest::prelude::*;

// ============================================================================
// Types
// ============================================================================

fn arb_leaf_type() -> impl Strategy<Value = TypeDescriptor> {
    prop_oneof![
        (1u16..=32).prop_map(|n| TypeDescriptor::Uint(n * 8)),
        (1u16..=32).prop_map(|n| TypeDescriptor::Int(n * 8)),
        Just(TypeDescriptor::Address),
        Just(TypeDescriptor::Bool),
        (1u8..=32).prop_map(TypeDescriptor::FixedBytes),
        Just(TypeDescriptor::Bytes),
        Just(TypeDescriptor::String),
    ]
}

/// Any ABI type, nested up to three levels of arrays and tuples.
pub fn arb_type() -> impl Strategy<Value = TypeDescriptor> {
    arb_leaf_type().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            inner
                .clone()
                .prop_map(|t| TypeDescriptor::Array(Box::new(t))),
            (inner.clone(), 1usize..4)
                .prop_map(|(t, n)| TypeDescriptor::FixedArray(Box::new(t), n)),
            prop::collection::vec(inner, 1..4).prop_map(|components| {
                TypeDescriptor::Tuple(
                    components
                        .into_iter()
                        .enumerate()
                        .map(|(i, t)| (format!("f{i}"), t))
                        .collect(),
                )
            }),
        ]
    })
}

// ============================================================================
// Values
// ============================================================================

fn arb_u256() -> impl Strategy<Value = U256> {
    prop::array::uniform32(any::<u8>()).prop_map(U256::from_be_bytes)
}

fn mask(bits: u16) -> U256 {
    if bits >= 256 {
        U256::MAX
    } else {
        (U256::from(1u8) << usize::from(bits)) - U256::from(1u8)
    }
}

/// A value of exactly the shape `ty` describes, in range for its width.
pub fn arb_value(ty: &TypeDescriptor) -> BoxedStrategy<NormalizedValue> {
    match ty {
        TypeDescriptor::Uint(bits) => {
            let m = mask(*bits);
            arb_u256()
                .prop_map(move |v| NormalizedValue::UInt(v & m))
                .boxed()
        }
        TypeDescriptor::Int(bits) => {
            let bits = *bits;
            let m = mask(bits);
            arb_u256()
                .prop_map(move |v| {
                    let low = v & m;
                    // sign-extend from bit `bits - 1`
                    let raw = if bits < 256 && low.bit(usize::from(bits - 1)) {
                        low | !m
                    } else {
                        low
                    };
                    NormalizedValue::Int(I256::from_raw(raw))
                })
                .boxed()
        }
        TypeDescriptor::Address => prop::array::uniform20(any::<u8>())
            .prop_map(|b| NormalizedValue::Address(Address::from(b)))
            .boxed(),
        TypeDescriptor::Bool => any::<bool>().prop_map(NormalizedValue::Bool).boxed(),
        TypeDescriptor::FixedBytes(size) => {
            prop::collection::vec(any::<u8>(), usize::from(*size))
                .prop_map(NormalizedValue::Bytes)
                .boxed()
        }
        TypeDescriptor::Bytes => prop::collection::vec(any::<u8>(), 0..80)
            .prop_map(NormalizedValue::Bytes)
            .boxed(),
        TypeDescriptor::String => ".{0,40}".prop_map(NormalizedValue::String).boxed(),
        TypeDescriptor::Array(elem) => prop::collection::vec(arb_value(elem), 0..4)
            .prop_map(NormalizedValue::Array)
            .boxed(),
        TypeDescriptor::FixedArray(elem, len) => prop::collection::vec(arb_value(elem), *len)
            .prop_map(NormalizedValue::Array)
            .boxed(),
        TypeDescriptor::Tuple(components) => {
            let fields: Vec<BoxedStrategy<(String, NormalizedValue)>> = components
                .iter()
                .map(|(name, t)| {
                    let name = name.clone();
                    arb_value(t).prop_map(move |v| (name.clone(), v)).boxed()
                })
                .collect();
            fields.prop_map(NormalizedValue::Tuple).boxed()
        }
    }
}

/// A type together with a value of that type.
pub fn arb_typed_value() -> impl Strategy<Value = (TypeDescriptor, NormalizedValue)> {
    arb_type().prop_flat_map(|ty| {
        let value = arb_value(&ty);
        (Just(ty), value)
    })
}

/// A parameter list of one to four typed values.
pub fn arb_params() -> impl Strategy<Value = Vec<(TypeDescriptor, NormalizedValue)>> {
    prop::collection::vec(arb_typed_value(), 1..5)
}
