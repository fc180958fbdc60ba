/// Internal address of the shielded pool; reward parameters live under it.
pub const MASP_ADDRESS: &str               = "tnam1pyqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqqej6juv";

/// Native token, used when no token list can be obtained.
pub const NAM_TOKEN_ADDRESS: &str          = "tnam1q9gr66cvu4hrzm0sd5kmlnjje82gs3xlfg3v6nu7";

pub const LAST_INFLATION_KEY: &str         = "parameters/last_inflation";
pub const LAST_LOCKED_KEY: &str            = "parameters/last_locked_amount";

/// Number of chain epochs in one MASP epoch.
pub const MASP_EPOCH_MULTIPLIER: u64       = 4;

/// First block height served by a CometBFT chain.
pub const GENESIS_HEIGHT: u64              = 1;

pub const RPC_URLS: &[&str] = &[
    "https://namada-rpc.wavefive.xyz",
    "https://rpc.namada-archive.citizenweb3.com",
    "https://namada-archive.tm.p2p.org",
    "https://rpc.namada.tududes.com",
    "https://namada-rpc.publicnode.com",
];

pub const INDEXER_URLS: &[&str] = &[
    "https://indexer.namada.tududes.com",
    "https://namada-indexer.wavefive.xyz",
    "https://namada-api.sproutstake.space",
    "https://namada-mainnet-indexer.mellifera.network",
];

/// Community maintained list of mainnet RPC nodes.
pub const RPC_LIST_URL: &str               = "https://raw.githubusercontent.com/Luminara-Hub/namada-ecosystem/refs/heads/main/user-and-dev-tools/mainnet/rpc.json";

pub const DEFAULT_DATA_DIR: &str           = "csv";
pub const DEFAULT_FIRST_RUN_EPOCHS: u64    = 1;
pub const DEFAULT_EPOCH_DELAY_MS: u64      = 1_000;
pub const DEFAULT_PROBE_CONCURRENCY: usize = 10;

/// Probed nodes above this limit are highlighted as near-archive.
pub const HIGH_LOOK_BACK_BLOCKS: u64       = 500_000;
