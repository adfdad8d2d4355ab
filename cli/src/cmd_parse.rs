//! `abicodec parse` and `abicodec fingerprint`.

use abicodec_core::{fingerprint::Fingerprint, schema::Schema};
use abicodec_registry::{human, source, SchemaSource};
use anyhow::{Context, Result};
use serde_json::json;
use std::path::Path;

use crate::Ctx;

pub fn run(ctx: &Ctx, file: &Path) -> Result<()> {
    let schemas = source::from_path(file)?
        .schemas()
        .with_context(|| format!("parse '{}'", file.display()))?;

    if ctx.json {
        let out: Vec<_> = schemas.iter().map(describe).collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("✓ {} schemas parsed from '{}'", schemas.len(), file.display());
    for schema in &schemas {
        println!("  {}", schema.declaration());
        println!("    fingerprint: {}", schema.fingerprint());
        if let Some(id) = &schema.meta().id {
            println!("    id:          {id}");
        }
    }
    Ok(())
}

pub fn fingerprint(ctx: &Ctx, signature: &str) -> Result<()> {
    let signature = signature.trim();
    if signature.starts_with("event ") || signature.starts_with("function ") {
        let schema = human::parse_declaration(signature)?;
        if ctx.json {
            println!("{}", serde_json::to_string_pretty(&describe(&schema))?);
        } else {
            println!("{}  {}", schema.fingerprint(), schema.signature());
        }
        return Ok(());
    }

    let topic = Fingerprint::event(signature);
    let selector = Fingerprint::function(signature);
    if ctx.json {
        let out = json!({
            "signature": signature,
            "topic": topic.to_hex(),
            "selector": selector.to_hex(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("topic:    {topic}");
        println!("selector: {selector}");
    }
    Ok(())
}

fn describe(schema: &Schema) -> serde_json::Value {
    json!({
        "id": schema.meta().id,
        "kind": schema.kind(),
        "signature": schema.signature(),
        "fingerprint": schema.fingerprint().to_hex(),
        "declaration": schema.declaration(),
    })
}
