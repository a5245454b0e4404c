use crate::error::{RefundError, Result};
use std::time::Duration;

/// Selects which `PaymentGateway` implementation the process runs against.
///
/// The mode is an explicit configuration value. It is never inferred from
/// the shape of the credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GatewayMode {
    #[default]
    Simulated,
    Live,
}

/// Process-wide gateway configuration. Credentials are read-only after
/// startup; the same config feeds both the live and simulated adapters.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub mode: GatewayMode,
    /// Base URL of the gateway REST API.
    pub api_base: String,
    /// Upper bound for a single gateway call.
    pub call_timeout: Duration,
    /// Fixed delay applied by the simulated adapter.
    pub simulated_delay: Duration,
}

pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com/v1";
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_millis(50);

impl GatewayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>, mode: GatewayMode) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret: key_secret.into(),
            mode,
            api_base: DEFAULT_API_BASE.to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            simulated_delay: DEFAULT_SIMULATED_DELAY,
        }
    }

    /// A config suitable for deterministic tests: simulated mode with a
    /// placeholder key pair.
    pub fn simulated() -> Self {
        Self::new("sim_key", "sim_secret", GatewayMode::Simulated)
    }

    /// Reads credentials from `RAZORPAY_KEY_ID` / `RAZORPAY_KEY_SECRET`.
    ///
    /// Live mode requires both variables; missing credentials are a fatal
    /// setup error reported before any ledger write.
    pub fn from_env(mode: GatewayMode) -> Result<Self> {
        let key_id = std::env::var("RAZORPAY_KEY_ID").unwrap_or_default();
        let key_secret = std::env::var("RAZORPAY_KEY_SECRET").unwrap_or_default();

        if mode == GatewayMode::Live && (key_id.is_empty() || key_secret.is_empty()) {
            return Err(RefundError::Config(
                "RAZORPAY_KEY_ID and RAZORPAY_KEY_SECRET must be set for live mode".to_string(),
            ));
        }

        Ok(Self {
            key_id,
            key_secret,
            mode,
            api_base: DEFAULT_API_BASE.to_string(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            simulated_delay: DEFAULT_SIMULATED_DELAY,
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_simulated_delay(mut self, delay: Duration) -> Self {
        self.simulated_delay = delay;
        self
    }
}
