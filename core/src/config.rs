//! Recognized engine configuration options with their defaults.
//!
//! This struct is the contract between the engine and whatever loads the
//! configuration (file, environment, hard-coded test fixture). Parsing and
//! precedence rules live with the caller.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

fn default_rpc_url() -> SmolStr {
    SmolStr::new_static("https://api.mainnet-beta.solana.com")
}

/// Full engine configuration. Every field has a working default so partial
/// configurations deserialize cleanly.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    // -- Connection --
    pub rpc_url: SmolStr,
    pub helius_api_key: SmolStr,
    pub wallet_path: SmolStr,

    // -- Execution --
    pub slippage_bps: u32,
    pub use_jito: bool,
    pub jito_tip_lamports: u64,
    pub priority_fee_lamports: u64,
    pub max_retries: u32,

    // -- Graduation monitor --
    pub grad_min_progress: Decimal,
    pub grad_min_holders: u32,
    pub grad_min_sol: Decimal,
    pub track_dev_wallets: bool,
    pub poll_interval_ms: u64,

    // -- Strategy --
    pub position_size_usd: Decimal,
    pub max_positions: usize,
    pub take_profit_pct: Decimal,
    pub stop_loss_pct: Decimal,
    pub trailing_stop_pct: Decimal,
    pub trailing_activate_pct: Decimal,
    pub max_hold_seconds: i64,
    pub exit_on_dev_sell: bool,
    pub max_initial_mcap: Decimal,

    // -- Paper trading --
    pub paper_balance_usd: Decimal,

    // -- Data feeds --
    pub watch_tokens: Vec<SmolStr>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            helius_api_key: SmolStr::default(),
            wallet_path: SmolStr::default(),
            slippage_bps: 300,
            use_jito: true,
            jito_tip_lamports: 100_000,
            priority_fee_lamports: 50_000,
            max_retries: 2,
            grad_min_progress: Decimal::from(70),
            grad_min_holders: 100,
            grad_min_sol: Decimal::from(50),
            track_dev_wallets: true,
            poll_interval_ms: 2_000,
            position_size_usd: Decimal::from(50),
            max_positions: 3,
            take_profit_pct: Decimal::new(50, 2),
            stop_loss_pct: Decimal::new(20, 2),
            trailing_stop_pct: Decimal::new(15, 2),
            trailing_activate_pct: Decimal::new(30, 2),
            max_hold_seconds: 300,
            exit_on_dev_sell: true,
            max_initial_mcap: Decimal::from(500_000),
            paper_balance_usd: Decimal::from(1_000),
            watch_tokens: Vec::new(),
        }
    }
}
