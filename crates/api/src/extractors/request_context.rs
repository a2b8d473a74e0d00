use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use domain::services::RequestMeta;
use std::convert::Infallible;

/// Client address and user agent for audit entries.
#[derive(Debug, Clone, Default)]
pub struct RequestContext(pub RequestMeta);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        // First hop of X-Forwarded-For is the original client.
        let ip_address = header("x-forwarded-for")
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .or_else(|| header("x-real-ip").map(str::to_string));
        let user_agent = header("user-agent").map(str::to_string);

        Ok(RequestContext(RequestMeta {
            ip_address,
            user_agent,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_reads_forwarded_headers() {
        let (mut parts, _) = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .header("user-agent", "curl/8.0")
            .body(())
            .unwrap()
            .into_parts();

        let RequestContext(meta) = RequestContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(meta.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(meta.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[tokio::test]
    async fn test_missing_headers() {
        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        let RequestContext(meta) = RequestContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(meta, RequestMeta::default());
    }
}
