use crate::core::config::ClientConfig;
use crate::core::errors::Result;
use crate::core::kernel::{
    Clock, HmacSigner, ReqwestRest, RestClientBuilder, RestClientConfig, SystemClock,
};
use crate::exchanges::bingx::EXCHANGE_NAME;
use std::sync::Arc;

/// Build the signed REST transport for `config`
pub fn build_rest_client(config: &ClientConfig) -> Result<ReqwestRest> {
    build_rest_client_with_clock(config, Arc::new(SystemClock))
}

/// Build the signed REST transport with a custom timestamp source
pub fn build_rest_client_with_clock(
    config: &ClientConfig,
    clock: Arc<dyn Clock>,
) -> Result<ReqwestRest> {
    let rest_config = RestClientConfig::new(
        config.effective_base_url().to_string(),
        EXCHANGE_NAME.to_string(),
    )
    .with_timeout(config.timeout_seconds)
    .with_source_key(config.source_key.clone());

    let signer = Arc::new(HmacSigner::new(
        config.api_key().to_string(),
        config.secret_key().to_string(),
        config.signature_encoding,
    ));

    RestClientBuilder::new(rest_config)
        .with_signer(signer)
        .with_clock(clock)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DEFAULT_BASE_URL;

    #[test]
    fn test_build_uses_config_values() {
        let config = ClientConfig::new("api".to_string(), "secret".to_string())
            .source_key("partner".to_string())
            .timeout_seconds(5);

        let rest = build_rest_client(&config).unwrap();

        assert_eq!(rest.config().base_url, DEFAULT_BASE_URL);
        assert_eq!(rest.config().exchange_name, "bingx");
        assert_eq!(rest.config().timeout_seconds, 5);
        assert_eq!(rest.config().source_key.as_deref(), Some("partner"));
    }

    #[test]
    fn test_custom_base_url() {
        let config = ClientConfig::new("api".to_string(), "secret".to_string())
            .base_url("http://127.0.0.1:8080".to_string());

        let rest = build_rest_client(&config).unwrap();
        assert_eq!(rest.config().base_url, "http://127.0.0.1:8080");
    }
}
