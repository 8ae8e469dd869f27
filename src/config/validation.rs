//! Configuration validation.
//!
//! Semantic checks only; serde has already handled syntax. All problems are
//! collected rather than stopping at the first.

use std::net::SocketAddr;

use url::Url;

use crate::config::schema::PipelineConfig;
use crate::pipeline::Stage;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{stage}: bind address {address:?} is not a socket address")]
    BindAddress { stage: Stage, address: String },

    #[error("{field}: {url:?} is not a valid URL ({reason})")]
    Url {
        field: &'static str,
        url: String,
        reason: String,
    },

    #[error("{field}: scheme {scheme:?} is not supported")]
    Scheme { field: &'static str, scheme: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("transform.jpeg_quality must be within 1..=100, got {0}")]
    JpegQuality(u8),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),

    #[error("timeouts.request_secs ({request_secs}) must exceed timeouts.hop_secs ({hop_secs})")]
    RequestTimeout { request_secs: u64, hop_secs: u64 },
}

/// Validate `config`, returning every problem found.
pub fn validate_config(config: &PipelineConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for stage in Stage::ALL {
        let address = &config.listener(stage).bind_address;
        if address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::BindAddress {
                stage,
                address: address.clone(),
            });
        }
    }

    check_url(
        &mut errors,
        "ingestion.communication_api_url",
        &config.ingestion.communication_api_url,
        &["http", "https"],
    );
    check_url(
        &mut errors,
        "relay.transform_url",
        &config.relay.transform_url,
        &["http"],
    );

    let positive = [
        ("timeouts.connect_secs", config.timeouts.connect_secs as usize),
        ("timeouts.hop_secs", config.timeouts.hop_secs as usize),
        ("timeouts.request_secs", config.timeouts.request_secs as usize),
        ("ingestion.max_upload_bytes", config.ingestion.max_upload_bytes),
        ("transform.max_body_bytes", config.transform.max_body_bytes),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    // The per-request budget covers a whole hop plus local work.
    let timeouts = &config.timeouts;
    if timeouts.hop_secs > 0 && timeouts.request_secs > 0 && timeouts.request_secs <= timeouts.hop_secs {
        errors.push(ValidationError::RequestTimeout {
            request_secs: timeouts.request_secs,
            hop_secs: timeouts.hop_secs,
        });
    }

    if !(1..=100).contains(&config.transform.jpeg_quality) {
        errors.push(ValidationError::JpegQuality(config.transform.jpeg_quality));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(
    errors: &mut Vec<ValidationError>,
    field: &'static str,
    raw: &str,
    schemes: &[&str],
) {
    match Url::parse(raw) {
        Ok(url) if !schemes.contains(&url.scheme()) => errors.push(ValidationError::Scheme {
            field,
            scheme: url.scheme().to_string(),
        }),
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::Url {
            field,
            url: raw.to_string(),
            reason: e.to_string(),
        }),
    }
}
