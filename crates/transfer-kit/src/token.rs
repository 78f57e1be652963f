use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Token metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMeta {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMeta {
    /// Render a raw on-chain amount with this token's decimals and symbol,
    /// e.g. `1.5 USDC`.
    pub fn display_amount(&self, amount: &BigUint) -> String {
        format!("{} {}", format_units(amount, self.decimals), self.symbol)
    }
}

/// Format a raw integer amount with `decimals` decimal places, trimming
/// trailing zeros.
pub fn format_units(amount: &BigUint, decimals: u8) -> String {
    let scale = BigUint::from(10u32).pow(u32::from(decimals));
    let whole = amount / &scale;
    let fraction = amount % &scale;
    if fraction == BigUint::ZERO {
        return whole.to_string();
    }

    let digits = format!("{:0>width$}", fraction.to_string(), width = usize::from(decimals));
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
