use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// VNPay gateway configuration.
///
/// `tmn_code` and `hash_secret` have no defaults: signing anything without
/// the merchant credentials is pointless, so loading fails fast before any
/// network call is attempted.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct VnpayConfig {
    /// Merchant terminal code issued by VNPay
    #[validate(length(min = 1))]
    pub tmn_code: String,

    /// Shared HMAC secret issued by VNPay
    #[validate(length(min = 1))]
    pub hash_secret: String,

    /// Hosted payment page (vpcpay.html) the customer is redirected to
    #[serde(default = "default_vnpay_pay_url")]
    pub pay_url: String,

    /// Merchant API endpoint for querydr/refund commands
    #[serde(default = "default_vnpay_api_url")]
    pub api_url: String,

    /// Absolute URL of our own return endpoint, registered with the gateway
    #[validate(url)]
    pub return_url: String,

    /// Frontend page the return handler redirects the customer to
    #[validate(url)]
    pub result_url: String,

    /// Display locale passed on the payment URL ("vn" or "en")
    #[serde(default = "default_vnpay_locale")]
    pub locale: String,

    /// UTC offset in minutes used for vnp_CreateDate timestamps.
    /// Defaults to +07:00 (Asia/Ho_Chi_Minh), passed explicitly instead of
    /// mutating the process timezone.
    #[serde(default = "default_vnpay_tz_offset")]
    pub tz_offset_minutes: i32,

    /// Minutes until a created payment URL expires
    #[serde(default = "default_vnpay_expire_minutes")]
    pub expire_minutes: i64,
}

/// MoMo wallet configuration (optional gateway).
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MomoConfig {
    #[validate(length(min = 1))]
    pub partner_code: String,
    #[validate(length(min = 1))]
    pub access_key: String,
    #[validate(length(min = 1))]
    pub secret_key: String,
    #[serde(default = "default_momo_endpoint")]
    pub endpoint: String,
    /// Customer-facing redirect after payment
    pub redirect_url: String,
    /// Our own IPN endpoint, sent with each create request
    pub ipn_url: String,
    #[serde(default = "default_momo_request_type")]
    pub request_type: String,
}

/// ZaloPay configuration (optional gateway).
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ZalopayConfig {
    #[validate(length(min = 1))]
    pub app_id: String,
    /// Key for signing outbound create-order requests
    #[validate(length(min = 1))]
    pub key1: String,
    /// Key for verifying inbound callbacks
    #[validate(length(min = 1))]
    pub key2: String,
    #[serde(default = "default_zalopay_endpoint")]
    pub endpoint: String,
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// VNPay gateway settings (required)
    #[validate]
    pub vnpay: VnpayConfig,

    /// MoMo gateway settings (optional; the IPN endpoint rejects callbacks
    /// with a configuration error when absent)
    #[validate]
    #[serde(default)]
    pub momo: Option<MomoConfig>,

    /// ZaloPay gateway settings (optional)
    #[validate]
    #[serde(default)]
    pub zalopay: Option<ZalopayConfig>,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Returns true if explicit CORS origins are configured
    pub fn has_cors_allowed_origins(&self) -> bool {
        self.cors_allowed_origins
            .as_ref()
            .map(|raw| raw.split(',').any(|origin| !origin.trim().is_empty()))
            .unwrap_or(false)
    }

    /// Whether we should fall back to permissive CORS
    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_vnpay_pay_url() -> String {
    "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html".to_string()
}

fn default_vnpay_api_url() -> String {
    "https://sandbox.vnpayment.vn/merchant_webapi/api/transaction".to_string()
}

fn default_vnpay_locale() -> String {
    "vn".to_string()
}

fn default_vnpay_tz_offset() -> i32 {
    7 * 60 // Asia/Ho_Chi_Minh
}

fn default_vnpay_expire_minutes() -> i64 {
    15
}

fn default_momo_endpoint() -> String {
    "https://test-payment.momo.vn/v2/gateway/api/create".to_string()
}

fn default_momo_request_type() -> String {
    "payWithATM".to_string()
}

fn default_zalopay_endpoint() -> String {
    "https://sb-openapi.zalopay.vn/v2/create".to_string()
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("tramhan_payments_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // NOTE: vnpay.tmn_code and vnpay.hash_secret have no defaults - they MUST
    // be provided via environment variables or a config file. Signing with a
    // placeholder secret would produce signatures the gateway rejects.
    let builder = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false));

    let config = builder
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    // Check the gateway secrets before deserialization for a clear message
    if config.get_string("vnpay.hash_secret").is_err() {
        error!("VNPay hash secret is not configured. Set APP__VNPAY__HASH_SECRET.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "vnpay.hash_secret is required but not configured. Set APP__VNPAY__HASH_SECRET."
                .into(),
        )));
    }
    if config.get_string("vnpay.tmn_code").is_err() {
        error!("VNPay terminal code is not configured. Set APP__VNPAY__TMN_CODE.");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "vnpay.tmn_code is required but not configured. Set APP__VNPAY__TMN_CODE.".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
