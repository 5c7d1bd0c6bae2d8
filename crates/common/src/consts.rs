pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub const CONFIG_PATH_ENV: &str = "CONCIERGE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "./concierge_config.yaml";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:9092";

pub const DEFAULT_URL_ALLOWLIST: &[&str] = &["https://hsbc.com", "https://hsbc.com.hk"];
pub const DEFAULT_LINK_BUTTON_CLASS: &str = "hsbc-link-button";
pub const DEFAULT_MAX_RETRIES: u32 = 3;

pub const ESCALATION_PATH: &str = "/v1/escalation";
pub const SENTIMENT_PATH: &str = "/v1/sentiment";
pub const POSTPROCESS_PATH: &str = "/v1/postprocess";
pub const PREPROCESS_PATH: &str = "/v1/preprocess";
pub const CHECK_PATH: &str = "/v1/check";
pub const SESSIONS_PATH_PREFIX: &str = "/v1/sessions/";
pub const HEALTHZ_PATH: &str = "/healthz";
