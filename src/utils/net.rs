use reqwest::Url;

use crate::constants::DOCKER_HOST_ALIAS;
use crate::DeliveryError;

/// Name of the environment variable telling the reader it runs in a container
pub const MODE_ENV: &str = "MODE";

/// Normalises the adaptor url, looking at `MODE` to decide whether local
/// addresses must be rewritten for a container.
pub fn parse_adaptor_url(raw: &str) -> Result<String, DeliveryError> {
    let docker = std::env::var(MODE_ENV)
        .map(|mode| mode.eq_ignore_ascii_case("docker"))
        .unwrap_or(false);

    normalize_adaptor_url(raw, docker)
}

/// Accepts `host:port/path`, `http://...` or `https://...`, with or without
/// surrounding slashes. Local hosts become [`DOCKER_HOST_ALIAS`] when `docker`
/// is set.
pub fn normalize_adaptor_url(
    raw: &str,
    docker: bool,
) -> Result<String, DeliveryError> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(DeliveryError::InvalidUrl("empty url".to_string()));
    }

    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let mut url = Url::parse(&candidate).map_err(|e| DeliveryError::InvalidUrl(format!("{candidate}: {e}")))?;
    if url.host_str().is_none() {
        return Err(DeliveryError::InvalidUrl(format!("{candidate}: missing host")));
    }

    if docker && matches!(url.host_str(), Some("localhost") | Some("127.0.0.1")) {
        url.set_host(Some(DOCKER_HOST_ALIAS))
            .map_err(|e| DeliveryError::InvalidUrl(format!("{candidate}: {e}")))?;
        return Ok(url.as_str().trim_end_matches('/').to_string());
    }

    Ok(candidate)
}
