// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! PumpSwap AMM math and pool-state decoding.
//!
//! PumpSwap is the native AMM tokens graduate into. Quoting reads pool
//! reserves directly; the constant-product formula here backs both the
//! simulated fills and live quote construction.
//!
//! The account layout below is provisional: it matches observed pool
//! accounts but has not been verified against a published IDL, so the
//! decoder is total and callers must treat a `None` as "layout mismatch",
//! not as an empty pool.

use rust_decimal::Decimal;
use smol_str::SmolStr;

/// PumpSwap swap fee in basis points (0.25%).
pub const PUMPSWAP_FEE_BPS: u64 = 25;

/// Lamports per SOL.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Minimum account size for the provisional pool layout:
/// discriminator(8) + bump(1) + pool_type(1) + mint(32) + 3 × u64.
const MIN_POOL_ACCOUNT_LEN: usize = 90;

/// Constant-product output for `amount_in`, after the swap fee.
///
/// ```text
/// a' = a · (10000 − fee_bps) / 10000
/// output = (a' · reserve_out) / (reserve_in + a')
/// ```
///
/// Output is zero whenever either reserve is zero. Intermediate math is
/// u128 so `a' · reserve_out` cannot overflow.
pub fn constant_product_output(
    amount_in: u64,
    reserve_in: u64,
    reserve_out: u64,
    fee_bps: u64,
) -> u64 {
    if reserve_in == 0 || reserve_out == 0 || amount_in == 0 {
        return 0;
    }
    let after_fee = u128::from(amount_in) * u128::from(10_000 - fee_bps.min(10_000)) / 10_000;
    let numerator = after_fee * u128::from(reserve_out);
    let denominator = u128::from(reserve_in) + after_fee;
    if denominator == 0 {
        return 0;
    }
    // output < reserve_out <= u64::MAX
    (numerator / denominator) as u64
}

/// A swap quote: expected output and the slippage-adjusted minimum.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SwapQuote {
    pub expected_out: u64,
    pub min_out: u64,
}

/// Decoded PumpSwap pool account.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PoolState {
    pub pool_address: SmolStr,
    pub token_mint: [u8; 32],
    /// SOL-side reserve in lamports.
    pub sol_reserves: u64,
    /// Token-side reserve in raw units.
    pub token_reserves: u64,
    pub lp_supply: u64,
}

impl PoolState {
    /// Decodes a pool account using the provisional layout. Returns `None`
    /// for accounts too short to contain it.
    pub fn decode(data: &[u8], pool_address: SmolStr) -> Option<Self> {
        if data.len() < MIN_POOL_ACCOUNT_LEN {
            return None;
        }
        // Skip discriminator (8) + bump (1) + pool_type (1).
        let mut offset = 10;

        let mut token_mint = [0u8; 32];
        token_mint.copy_from_slice(&data[offset..offset + 32]);
        offset += 32;

        let sol_reserves = u64::from_le_bytes(data[offset..offset + 8].try_into().ok()?);
        offset += 8;
        let token_reserves = u64::from_le_bytes(data[offset..offset + 8].try_into().ok()?);
        offset += 8;
        let lp_supply = u64::from_le_bytes(data[offset..offset + 8].try_into().ok()?);

        Some(Self {
            pool_address,
            token_mint,
            sol_reserves,
            token_reserves,
            lp_supply,
        })
    }

    /// Spot price in SOL per raw token unit.
    pub fn price(&self) -> Decimal {
        if self.token_reserves == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.sol_reserves) / Decimal::from(self.token_reserves)
    }

    /// SOL-side liquidity in whole SOL.
    pub fn sol_liquidity(&self) -> Decimal {
        Decimal::from(self.sol_reserves) / Decimal::from(LAMPORTS_PER_SOL)
    }

    pub fn mint_hex(&self) -> String {
        hex::encode(self.token_mint)
    }

    /// Quotes buying tokens with `sol_in` lamports.
    pub fn quote_buy(&self, sol_in: u64, slippage_bps: u64) -> SwapQuote {
        let expected_out = constant_product_output(
            sol_in,
            self.sol_reserves,
            self.token_reserves,
            PUMPSWAP_FEE_BPS,
        );
        SwapQuote {
            expected_out,
            min_out: apply_slippage(expected_out, slippage_bps),
        }
    }

    /// Quotes selling `tokens_in` raw token units for SOL.
    pub fn quote_sell(&self, tokens_in: u64, slippage_bps: u64) -> SwapQuote {
        let expected_out = constant_product_output(
            tokens_in,
            self.token_reserves,
            self.sol_reserves,
            PUMPSWAP_FEE_BPS,
        );
        SwapQuote {
            expected_out,
            min_out: apply_slippage(expected_out, slippage_bps),
        }
    }
}

fn apply_slippage(amount: u64, slippage_bps: u64) -> u64 {
    (u128::from(amount) * u128::from(10_000 - slippage_bps.min(10_000)) / 10_000) as u64
}
