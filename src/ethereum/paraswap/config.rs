/// ParaSwap client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ParaSwap API
    pub api_url: String,

    /// Chain id the quotes and transactions are built for
    pub network_id: u64,

    /// Partner name reported with built transactions
    pub partner: String,

    /// Allowed slippage when building a swap, in basis points
    pub slippage_bps: u32,
}

const DEFAULT_API_URL: &str = "https://apiv5.paraswap.io";
const DEFAULT_PARTNER: &str = "mooni";
const DEFAULT_SLIPPAGE_BPS: u32 = 100;

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            network_id: 1,
            partner: DEFAULT_PARTNER.to_string(),
            slippage_bps: DEFAULT_SLIPPAGE_BPS,
        }
    }
}

impl Config {
    /// Build the configuration from environment variables
    pub fn from_env() -> Self {
        use std::env;

        Self {
            api_url: env::var("PARASWAP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            network_id: env::var("PARASWAP_NETWORK_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            partner: env::var("PARASWAP_PARTNER").unwrap_or_else(|_| DEFAULT_PARTNER.to_string()),
            slippage_bps: env::var("PARASWAP_SLIPPAGE_BPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_SLIPPAGE_BPS),
        }
    }
}
