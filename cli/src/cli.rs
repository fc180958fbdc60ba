use clap::{Parser, Subcommand};
use std::str::FromStr;
use std::path::PathBuf;

use masp_api::consts::*;
use masp_api::types::LookBack;

#[derive(Parser)]
#[command(
    name = "masp-rewards",
    about = "Collects per-epoch MASP reward parameters from Namada RPC nodes into an append-only CSV history.",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short = 'u',
        long = "rpc",
        global = true,
        help = "RPC endpoint: m (mainnet preset list) or a custom RPC URL.\nRepeat to add fallbacks, tried in order"
    )]
    pub rpc: Vec<Network>,

    #[arg(
        short = 'd',
        long = "data-dir",
        default_value = DEFAULT_DATA_DIR,
        global = true,
        help = "Directory holding the CSV history"
    )]
    pub data_dir: PathBuf,

    #[arg(short = 'v', long = "verbose", help = "Print verbose output", global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Endpoints to query, in order. Defaults to the mainnet preset list.
    pub fn rpc_urls(&self) -> Vec<String> {
        if self.rpc.is_empty() {
            return Network::Mainnet.rpc_urls();
        }

        self.rpc.iter().flat_map(Network::rpc_urls).collect()
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect every MASP epoch newer than the recorded history.
    Collect {
        #[arg(
            long = "look-back",
            default_value = "all",
            help = "Blocks behind the tip historical queries may reach, or 'all'"
        )]
        look_back: LookBack,

        #[arg(long = "start-epoch", help = "Never collect MASP epochs below this one")]
        start_epoch: Option<u64>,

        #[arg(
            long = "backfill",
            default_value_t = DEFAULT_FIRST_RUN_EPOCHS,
            help = "Epochs to collect when the history is empty, 0 for the whole chain"
        )]
        backfill: u64,

        #[arg(long = "tip-height", help = "Treat this height as the chain tip, defaults to the latest block")]
        tip_height: Option<u64>,

        #[arg(short = 't', long = "token", help = "Token address to query; repeat for more. Skips the indexer")]
        tokens: Vec<String>,

        #[arg(long = "indexer", help = "Indexer URL for the token list; repeat to add fallbacks")]
        indexers: Vec<String>,

        #[arg(short = 'o', long = "output", help = "CSV file to append to, defaults to <data-dir>/<date>.csv")]
        output: Option<PathBuf>,

        #[arg(long = "delay-ms", default_value_t = DEFAULT_EPOCH_DELAY_MS, help = "Pause between epochs")]
        delay_ms: u64,

        #[arg(long = "discover", help = "Probe the public RPC list and use nodes with enough history")]
        discover: bool,
    },

    /// Print the newest recorded MASP epoch and the next one to fetch.
    LatestEpoch {},

    /// Print the chain tip, its epochs, and the recorded cursor.
    Status {},

    /// Merge every CSV file into one, dropping duplicate (epoch, token) rows.
    Compact {
        #[arg(help = "File to write the merged history to")]
        output: PathBuf,
    },

    /// Measure how much history each public RPC node serves.
    Probe {
        #[arg(long = "list-url", default_value = RPC_LIST_URL, help = "JSON list of RPC endpoints")]
        list_url: String,

        #[arg(long = "concurrency", default_value_t = DEFAULT_PROBE_CONCURRENCY, help = "Nodes probed at once")]
        concurrency: usize,
    },
}

#[derive(Debug, Clone)]
pub enum Network {
    Mainnet,
    Custom(String),
}

impl Network {
    pub fn rpc_urls(&self) -> Vec<String> {
        match self {
            Network::Mainnet => RPC_URLS.iter().map(|url| url.to_string()).collect(),
            Network::Custom(url) => vec![url.clone()],
        }
    }
}

impl FromStr for Network {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" | "mainnet" => Ok(Network::Mainnet),
            s if s.starts_with("http://") || s.starts_with("https://") => Ok(Network::Custom(s.to_string())),
            _ => Err(format!(
                "Invalid RPC value: '{}'. Use m or a valid RPC URL (http:// or https://)",
                s
            )),
        }
    }
}
