//! `abicodec eip712-hash`: domain separator, struct hash and signing hash.

use abicodec_evm::{eip712::Eip712Engine, TypedData};
use anyhow::{Context, Result};
use serde_json::json;
use std::{io::Read, path::Path};

use crate::Ctx;

pub fn run(ctx: &Ctx, file: &Path) -> Result<()> {
    let text = if file == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("read '{}'", file.display()))?
    };

    let typed = TypedData::from_json(&text)?;
    let engine = Eip712Engine::with_config(typed.types.clone(), ctx.codec_config());
    let domain_separator = typed.domain_separator();
    let struct_hash = engine.hash_struct(&typed.primary_type, &typed.message)?;
    let signing_hash = abicodec_evm::sign_hash(&domain_separator, &struct_hash);

    if ctx.json {
        let out = json!({
            "primaryType": typed.primary_type,
            "encodedType": engine.encode_type(&typed.primary_type)?,
            "domainSeparator": domain_separator.to_string(),
            "structHash": struct_hash.to_string(),
            "signingHash": signing_hash.to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("Type:             {}", engine.encode_type(&typed.primary_type)?);
        println!("Domain separator: {domain_separator}");
        println!("Struct hash:      {struct_hash}");
        println!("Signing hash:     {signing_hash}");
    }
    Ok(())
}
