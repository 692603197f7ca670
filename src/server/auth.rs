use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use tracing::warn;

use super::config::ServiceConfig;
use super::error::ServiceError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Check the bearer token and return the request id to use.
///
/// The id is taken from `X-Request-Id` when present, otherwise generated.
pub fn authorize(config: &ServiceConfig, headers: &HeaderMap) -> Result<String, ServiceError> {
    let expected = config
        .token
        .as_deref()
        .ok_or(ServiceError::TokenNotConfigured)?;

    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(new_request_id);

    let Some(provided) = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
    else {
        warn!(request_id = %request_id, "authorization_missing");
        return Err(ServiceError::MissingAuthorization);
    };

    if provided.trim() != expected {
        warn!(request_id = %request_id, "authorization_invalid");
        return Err(ServiceError::InvalidToken);
    }
    Ok(request_id)
}

/// A random version-4 UUID in its canonical hyphenated form.
pub fn new_request_id() -> String {
    let mut bits = rand::random::<u128>();
    bits = (bits & !(0xFu128 << 76)) | (0x4u128 << 76);
    bits = (bits & !(0x3u128 << 62)) | (0x2u128 << 62);
    let hex = format!("{bits:032x}");
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn accepts_matching_token_and_keeps_request_id() {
        let config = ServiceConfig::with_token("s3cret");
        let id = authorize(
            &config,
            &headers(&[("authorization", "Bearer  s3cret "), ("x-request-id", "req-1")]),
        )
        .unwrap();
        assert_eq!(id, "req-1");
    }

    #[test]
    fn rejects_missing_or_wrong_scheme() {
        let config = ServiceConfig::with_token("s3cret");
        for h in [headers(&[]), headers(&[("authorization", "Basic s3cret")])] {
            assert!(matches!(
                authorize(&config, &h),
                Err(ServiceError::MissingAuthorization)
            ));
        }
    }

    #[test]
    fn rejects_wrong_token() {
        let config = ServiceConfig::with_token("s3cret");
        assert!(matches!(
            authorize(&config, &headers(&[("authorization", "Bearer nope")])),
            Err(ServiceError::InvalidToken)
        ));
    }

    #[test]
    fn unconfigured_token_is_a_server_error() {
        let config = ServiceConfig {
            token: None,
            ..ServiceConfig::with_token("unused")
        };
        assert!(matches!(
            authorize(&config, &headers(&[("authorization", "Bearer x")])),
            Err(ServiceError::TokenNotConfigured)
        ));
    }

    #[test]
    fn generated_ids_look_like_uuid_v4() {
        let id = new_request_id();
        assert_eq!(id.len(), 36);
        assert_eq!(id.as_bytes()[14], b'4');
        assert!(matches!(id.as_bytes()[19], b'8' | b'9' | b'a' | b'b'));
        assert_ne!(id, new_request_id());
    }
}
