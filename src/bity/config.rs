/// Bity client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the exchange API
    pub api_url: String,

    /// OAuth2 token endpoint
    pub token_url: String,

    pub client_id: String,
    pub client_secret: String,

    /// Crypto currencies Bity accepts as order input
    pub input_currencies: Vec<String>,
}

const DEFAULT_API_URL: &str = "https://exchange.api.bity.com/v2";
const DEFAULT_TOKEN_URL: &str = "https://connect.bity.com/oauth2/token";
pub const ORDER_STATUS_PAGE_URL: &str = "https://go.bity.com/order-status?id=";

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            input_currencies: vec!["ETH".to_string()],
        }
    }
}

impl Config {
    /// Build the configuration from environment variables
    pub fn from_env() -> Self {
        use std::env;

        let defaults = Self::default();
        Self {
            api_url: env::var("BITY_API_URL").unwrap_or(defaults.api_url),
            token_url: env::var("BITY_TOKEN_URL").unwrap_or(defaults.token_url),
            client_id: env::var("BITY_CLIENT_ID").unwrap_or_default(),
            client_secret: env::var("BITY_CLIENT_SECRET").unwrap_or_default(),
            input_currencies: env::var("BITY_INPUT_CURRENCIES")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_uppercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.input_currencies),
        }
    }

    pub fn accepts_input(&self, symbol: &str) -> bool {
        self.input_currencies
            .iter()
            .any(|c| c.eq_ignore_ascii_case(symbol))
    }
}

pub fn order_status_page_url(order_id: &str) -> String {
    format!("{}{}", ORDER_STATUS_PAGE_URL, order_id)
}
