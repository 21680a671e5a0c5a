//! Token metadata and asset lookup

use crate::{Result, SdkError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Metadata for a payable token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenDescriptor {
    /// Currency code, e.g. `"USDC"`.
    pub symbol: String,
    /// Decimal places of the smallest unit (the absolute-form factor).
    pub decimals: u32,
    /// Decimal places shown in UIs.
    pub display_decimals: u32,
    /// Network identifier the token lives on, e.g. `"polygon-mainnet"`.
    pub network: String,
}

impl TokenDescriptor {
    pub fn new(
        symbol: impl Into<String>,
        decimals: u32,
        display_decimals: u32,
        network: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
            display_decimals,
            network: network.into(),
        }
    }
}

/// Lookup table from currency code to token metadata.
///
/// The default registry carries the stablecoins the payment contracts
/// support; embedders can extend or replace it per client instance.
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    tokens: HashMap<String, TokenDescriptor>,
}

impl AssetRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    /// Add or replace a token.
    pub fn with_token(mut self, token: TokenDescriptor) -> Self {
        self.tokens.insert(token.symbol.clone(), token);
        self
    }

    /// Look up a token, or `None` if the code is unrecognized.
    pub fn get(&self, symbol: &str) -> Option<&TokenDescriptor> {
        self.tokens.get(symbol)
    }

    /// Look up a token, failing with [`SdkError::UnknownAsset`].
    pub fn lookup(&self, symbol: &str) -> Result<&TokenDescriptor> {
        self.tokens
            .get(symbol)
            .ok_or_else(|| SdkError::UnknownAsset(symbol.to_string()))
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        Self::new()
            .with_token(TokenDescriptor::new("USDC", 6, 2, "polygon-mainnet"))
            .with_token(TokenDescriptor::new("USDT", 6, 2, "polygon-mainnet"))
            .with_token(TokenDescriptor::new("BUSD", 18, 2, "bsc-mainnet"))
    }
}
