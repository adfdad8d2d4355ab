//! abicodec CLI.
//!
//! # Commands
//! ```text
//! abicodec parse        --file <schemas.csdl|abi.json|decls.sol>
//! abicodec fingerprint  --signature "Transfer(address,address,uint256)"
//! abicodec decode-log   --topics <...> --data <hex> --schemas <path>
//! abicodec decode-call  --calldata <hex> --schemas <path>
//! abicodec encode-call  --signature "transfer(address,uint256)" --args '["0x…", "1000"]'
//! abicodec eip712-hash  --file <typed-data.json>
//! ```

use abicodec_core::config::CodecConfig;
use abicodec_observability::init_tracing;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd_codec;
mod cmd_eip712;
mod cmd_parse;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(
    name = "abicodec",
    about = "Ethereum ABI codec: decode logs and calldata, encode calls, hash EIP-712 data",
    version
)]
struct Cli {
    /// YAML or JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Accept non-canonical address, bool and bytesN padding
    #[arg(long, global = true)]
    lenient: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a schema file and list its schemas with their fingerprints
    Parse {
        /// .csdl, .json/.abi or .sol/.txt file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Compute the fingerprint of a signature or declaration
    Fingerprint {
        /// `Name(type,…)` or `event …` / `function …`
        #[arg(short, long)]
        signature: String,
    },

    /// Decode an event log from raw topics + data
    #[command(name = "decode-log")]
    DecodeLog {
        /// topics[0] = event signature hash, topics[1..] = indexed params
        #[arg(long, num_args = 1..)]
        topics: Vec<String>,
        /// Non-indexed params (hex, 0x-prefixed)
        #[arg(long, default_value = "0x")]
        data: String,
        /// Schema file or directory
        #[arg(long)]
        schemas: Option<PathBuf>,
    },

    /// Decode function calldata
    #[command(name = "decode-call")]
    DecodeCall {
        /// Raw calldata (0x-prefixed hex)
        #[arg(long)]
        calldata: String,
        /// Schema file or directory
        #[arg(long)]
        schemas: Option<PathBuf>,
    },

    /// Encode a function call to calldata
    #[command(name = "encode-call")]
    EncodeCall {
        /// Function signature, e.g. `transfer(address,uint256)`
        #[arg(long)]
        signature: String,
        /// JSON array of arguments, e.g. '["0xabc…", "1000000"]'
        #[arg(long, default_value = "[]")]
        args: String,
        /// Schema file or directory; without one the signature itself is the schema
        #[arg(long)]
        schemas: Option<PathBuf>,
    },

    /// Compute the EIP-712 signing hash of an `eth_signTypedData_v4` document
    #[command(name = "eip712-hash")]
    Eip712Hash {
        /// Typed data JSON file (`-` for stdin)
        #[arg(short, long)]
        file: PathBuf,
    },
}

/// Settings shared by every command.
pub struct Ctx {
    pub config: CliConfig,
    pub json: bool,
}

impl Ctx {
    pub fn codec_config(&self) -> CodecConfig {
        self.config.codec
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    if cli.lenient {
        config.codec = CodecConfig::lenient().with_max_depth(config.codec.max_depth);
    }
    let log = config.log.clone().with_verbosity(cli.verbose);
    // a subscriber installed by an embedding process wins
    let _ = init_tracing(&log);

    let ctx = Ctx {
        config,
        json: cli.json,
    };

    match cli.command {
        Commands::Parse { file } => cmd_parse::run(&ctx, &file),
        Commands::Fingerprint { signature } => cmd_parse::fingerprint(&ctx, &signature),
        Commands::DecodeLog {
            topics,
            data,
            schemas,
        } => cmd_codec::decode_log(&ctx, &topics, &data, schemas.as_deref()),
        Commands::DecodeCall { calldata, schemas } => {
            cmd_codec::decode_call(&ctx, &calldata, schemas.as_deref())
        }
        Commands::EncodeCall {
            signature,
            args,
            schemas,
        } => cmd_codec::encode_call(&ctx, &signature, &args, schemas.as_deref()),
        Commands::Eip712Hash { file } => cmd_eip712::run(&ctx, &file),
    }
}

/// Decode `0x`-prefixed (or bare) hex.
pub fn parse_hex(s: &str) -> Result<Vec<u8>> {
    let s = s.trim();
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).with_context(|| format!("invalid hex '{s}'"))
}
