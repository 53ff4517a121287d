//! govtrace CLI — decode a governance proposal into an annotated call tree.
//!
//! # Commands
//! ```
//! govtrace decode --config govtrace.yaml --proposal-id 482 --governor 0x...
//! govtrace decode --config govtrace.yaml --file proposal.json
//! govtrace decode --config govtrace.yaml --calldata 0xda95691a...
//! govtrace info
//! ```
//!
//! ENVIRONMENT VARIABLES:
//!   LOG_LEVEL          tracing_subscriber::EnvFilter directive (default "info")
//!   DECODER_PRETTY     force human-readable (non-JSON) logs
//!   NODE_ENV           "development" has the same effect as DECODER_PRETTY

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

mod governor;
mod rpc_views;

use governor::RpcGovernorView;
use rpc_views::{NoPriceReference, RpcViews};

use govtrace_cache::ArtifactStore;
use govtrace_core::{ChainId, DecoderConfig, DecoderError};
use govtrace_decoder::{
    parse_proposal_json, DecodeOptions, Decoder, DecoderInput, GovernorView, LocalAbiIndex, RpcProvider,
};
use govtrace_explorer::ExplorerClient;
use govtrace_handlers::{
    AddressVerificationHandler, ArbitrumInboxHandler, HandlerRegistry, LineaBridgeHandler,
    PriceFeedHandler, ReceiverMulticallHandler, TrackingSpeedHandler, UpdateAssetHandler,
};
use govtrace_metadata::{CuratedMaps, StaticDeploymentIndex};
use govtrace_observability::{init_tracing, LogConfig};
use govtrace_proxy::{EvmRpc, HttpEvmRpc};

#[derive(Parser)]
#[command(
    name = "govtrace",
    about = "Decode Compound/Comet governance proposals into an annotated call tree",
    version
)]
struct Cli {
    /// Path to the decoder config file (YAML or JSON)
    #[arg(long, global = true, default_value = "govtrace.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a proposal, given a proposal id, a JSON file, or raw propose() calldata
    Decode(DecodeArgs),

    /// Print build and capability info
    Info,
}

#[derive(Args)]
struct DecodeArgs {
    /// Numeric proposal id, resolved on-chain via --governor's getActions(uint256)
    #[arg(long, conflicts_with_all = ["file", "calldata"])]
    proposal_id: Option<String>,

    /// Governor contract address (required with --proposal-id)
    #[arg(long, requires = "proposal_id")]
    governor: Option<String>,

    /// Chain id the governor lives on
    #[arg(long, default_value_t = 1)]
    chain_id: u64,

    /// Path to a JSON file holding a ProposalDetails document
    #[arg(long, conflicts_with_all = ["proposal_id", "calldata"])]
    file: Option<PathBuf>,

    /// Raw propose(address[],uint256[],bytes[],string) calldata, 0x-prefixed
    #[arg(long, conflicts_with_all = ["proposal_id", "file"])]
    calldata: Option<String>,

    /// Pretty-print the output JSON (default is compact)
    #[arg(long)]
    pretty: bool,

    /// Record provenance (arg_sources) for every decoded argument
    #[arg(long)]
    track_sources: bool,
}

/// Keys `HttpEvmRpc`s by chain id, built once from the config's chain table.
struct ConfiguredRpc {
    by_chain: HashMap<u64, HttpEvmRpc>,
}

impl RpcProvider for ConfiguredRpc {
    fn rpc_for(&self, chain_id: ChainId) -> Option<&dyn EvmRpc> {
        self.by_chain.get(&chain_id.0).map(|rpc| rpc as &dyn EvmRpc)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode(args) => decode(&cli.config, args).await,
        Commands::Info => info(),
    }
}

async fn decode(config_path: &PathBuf, args: DecodeArgs) -> Result<()> {
    let config = DecoderConfig::load(config_path)
        .with_context(|| format!("loading config from '{}'", config_path.display()))?;

    let log_config = LogConfig { json: config.log_json, ..LogConfig::default() }.with_env_overrides();
    init_tracing(&log_config);

    let store = ArtifactStore::new(config.cache_root.clone());
    let explorer = ExplorerClient::new(store, config.etherscan_api_key.clone());

    let rpc_by_chain: HashMap<u64, HttpEvmRpc> = config
        .chains
        .iter()
        .filter_map(|(chain_id, chain)| chain.rpc_url.clone().map(|url| (*chain_id, HttpEvmRpc::new(url))))
        .collect();
    let rpc = ConfiguredRpc { by_chain: rpc_by_chain };

    let static_index = StaticDeploymentIndex::new();
    let curated = CuratedMaps::new();
    let local_abi = LocalAbiIndex::new();

    // Comet's insight handlers (asset config, price feeds, reward speeds) only
    // apply to the chain the comet market itself lives on; this CLI only wires
    // them against mainnet, the chain Compound/Comet governance runs on.
    let mainnet_rpc = rpc.rpc_for(ChainId::MAINNET);
    let views = mainnet_rpc.map(|r| RpcViews { rpc: r });
    let no_price = NoPriceReference;

    let mut handlers = HandlerRegistry::new();
    handlers
        .register(Box::new(ArbitrumInboxHandler::new(Vec::<String>::new(), ChainId::ARBITRUM)))
        .register(Box::new(LineaBridgeHandler::new(Vec::<String>::new())))
        .register(Box::new(ReceiverMulticallHandler::new(Vec::<String>::new())))
        .register(Box::new(AddressVerificationHandler::new(&static_index)));
    if let Some(views) = &views {
        handlers
            .register(Box::new(UpdateAssetHandler::new(views, &static_index, &curated)))
            .register(Box::new(PriceFeedHandler::new(views, &no_price)))
            .register(Box::new(TrackingSpeedHandler::new(views)));
    }

    let decoder = Decoder {
        config: &config,
        explorer: &explorer,
        local_abi: &local_abi,
        rpc: &rpc,
        static_index: &static_index,
        curated: &curated,
        handlers: &handlers,
    };

    let input = if let Some(id) = &args.proposal_id {
        DecoderInput::ProposalId(id.clone())
    } else if let Some(path) = &args.file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading proposal file '{}'", path.display()))?;
        let details = parse_proposal_json(&raw)
            .with_context(|| format!("'{}' is not a valid proposal document", path.display()))?;
        DecoderInput::Json(details)
    } else if let Some(calldata) = &args.calldata {
        let bytes = hex::decode(calldata.strip_prefix("0x").unwrap_or(calldata))
            .context("--calldata is not valid hex")?;
        DecoderInput::RawProposeCalldata(bytes)
    } else {
        anyhow::bail!("one of --proposal-id, --file, or --calldata is required");
    };

    let governor_rpc = rpc.rpc_for(ChainId(args.chain_id));
    let governor_view = match (&args.governor, governor_rpc) {
        (Some(governor), Some(rpc)) => Some(RpcGovernorView { rpc, governor: governor.clone() }),
        _ => None,
    };

    let options = DecodeOptions { track_sources: args.track_sources };
    let result = decoder
        .decode(input, governor_view.as_ref().map(|v| v as &dyn GovernorView), options)
        .await;

    match result {
        Ok(proposal) => {
            let json = if args.pretty {
                serde_json::to_string_pretty(&proposal)?
            } else {
                serde_json::to_string(&proposal)?
            };
            println!("{json}");
            Ok(())
        }
        Err(err) => Err(exit_error(err)),
    }
}

/// Maps the three fatal `DecoderError` variants onto a non-zero exit via
/// `anyhow`; every other failure mode is already absorbed into node notes
/// before this point is ever reached.
fn exit_error(err: DecoderError) -> anyhow::Error {
    anyhow::Error::from(err)
}

fn info() -> Result<()> {
    println!("govtrace v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Decodes Compound/Comet-style governance proposals into an annotated call");
    println!("tree: ABI-decoded arguments, proxy-aware target resolution, address");
    println!("metadata reconciled across Etherscan and on-chain sources, and");
    println!("protocol-specific insights (bridge hops, asset config changes, price");
    println!("feed updates, reward speed changes).");
    println!();
    println!("Capabilities:");
    println!("  - ABI decode via alloy-dyn-abi, explorer-verified first, bundled fallback");
    println!("  - 11-scheme concurrent proxy detection (EIP-1967, EIP-1822, EIP-1167, ...)");
    println!("  - Arbitrum inbox / Linea bridge / receiver-multicall expansion");
    println!("  - Comet updateAsset / price feed / tracking speed insights");
    Ok(())
}
