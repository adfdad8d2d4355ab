//! `decode-log`, `decode-call` and `encode-call`.

use abicodec_core::{
    event::RawLog,
    schema::{SchemaKind, SchemaRegistry},
    value::NormalizedValue,
};
use abicodec_evm::Codec;
use abicodec_registry::{human, MemoryRegistry, RegistryBuilder};
use alloy_primitives::B256;
use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Map, Value};
use std::path::Path;

use crate::{parse_hex, Ctx};

/// Load `--schemas`, falling back to `registry.schemas` from the config file.
fn load_registry(ctx: &Ctx, path: Option<&Path>) -> Result<MemoryRegistry> {
    let path = path
        .or(ctx.config.registry.schemas.as_deref())
        .ok_or_else(|| anyhow!("no schemas given; pass --schemas or set registry.schemas"))?;

    let mut builder = RegistryBuilder::new().with_policy(ctx.config.registry.duplicate_policy);
    let loaded = if path.is_dir() {
        builder.load_directory(path)
    } else {
        builder.load_file(path)
    };
    loaded.with_context(|| format!("load schemas from '{}'", path.display()))?;

    if builder.is_empty() {
        bail!("no schemas found in '{}'", path.display());
    }
    tracing::info!(schemas = builder.len(), path = %path.display(), "registry loaded");
    Ok(builder.build())
}

fn fields_json(fields: &[(String, NormalizedValue)]) -> Value {
    let mut map = Map::new();
    for (name, value) in fields {
        map.insert(name.clone(), value.to_json());
    }
    Value::Object(map)
}

pub fn decode_log(ctx: &Ctx, topics: &[String], data: &str, schemas: Option<&Path>) -> Result<()> {
    let codec = Codec::with_config(load_registry(ctx, schemas)?, ctx.codec_config());

    let topics = topics
        .iter()
        .map(|t| t.trim().parse::<B256>().with_context(|| format!("invalid topic '{t}'")))
        .collect::<Result<Vec<_>>>()?;
    let log = RawLog::new(topics, parse_hex(data).context("invalid data hex")?);

    let event = codec.decode_log(&log)?;

    if ctx.json {
        let out = json!({
            "event": event.name(),
            "signature": event.schema.signature(),
            "fields": fields_json(&event.fields),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Event:   {}", event.schema.declaration());
        println!("Fields:");
        for (name, value) in &event.fields {
            println!("  {name}: {value}");
        }
    }
    Ok(())
}

pub fn decode_call(ctx: &Ctx, calldata: &str, schemas: Option<&Path>) -> Result<()> {
    let codec = Codec::with_config(load_registry(ctx, schemas)?, ctx.codec_config());
    let bytes = parse_hex(calldata).context("invalid calldata hex")?;

    let call = codec.decode_call(&bytes)?;

    if ctx.json {
        let out = json!({
            "function": call.function_name(),
            "selector": call.selector_hex(),
            "inputs": fields_json(&call.inputs),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Function:  {}", call.schema.declaration());
        println!("Selector:  {}", call.selector_hex().unwrap_or_default());
        println!("Inputs:");
        for (name, value) in &call.inputs {
            println!("  {name}: {value}");
        }
    }
    Ok(())
}

pub fn encode_call(ctx: &Ctx, signature: &str, args: &str, schemas: Option<&Path>) -> Result<()> {
    let registry = match schemas.or(ctx.config.registry.schemas.as_deref()) {
        Some(path) => load_registry(ctx, Some(path))?,
        // the signature is its own schema
        None => MemoryRegistry::from_source(vec![human::parse_declaration(&format!(
            "function {signature}"
        ))?])?,
    };
    let codec = Codec::with_config(registry, ctx.codec_config());

    let schema = match codec.resolve(SchemaKind::Function, signature) {
        Ok(schema) => schema,
        // a declaration with names, e.g. "transfer(address to, uint256 amount)"
        Err(_) => {
            let declared = human::parse_declaration(&format!("function {signature}"))?;
            codec
                .registry()
                .get_by_fingerprint(&declared.fingerprint())
                .ok_or_else(|| anyhow!("no schema for `{}`", declared.signature()))?
        }
    };

    let args: Value = serde_json::from_str(args).context("parse args JSON")?;
    let Value::Array(args) = args else {
        bail!("--args must be a JSON array");
    };
    if args.len() != schema.params().len() {
        bail!(
            "`{}` takes {} arguments, got {}",
            schema.signature(),
            schema.params().len(),
            args.len()
        );
    }
    let values = schema
        .params()
        .iter()
        .zip(&args)
        .map(|(param, arg)| {
            NormalizedValue::from_json(&param.ty, arg)
                .with_context(|| format!("argument '{}'", param.name))
        })
        .collect::<Result<Vec<_>>>()?;

    let calldata = codec.encode_call(schema.signature(), &values)?;
    if ctx.json {
        println!("{}", json!({ "calldata": format!("0x{}", hex::encode(&calldata)) }));
    } else {
        println!("0x{}", hex::encode(&calldata));
    }
    Ok(())
}
