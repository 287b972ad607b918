//! Bearer token resolution for API calls.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tower_sessions::Session;

use crate::api::Credentials;
use crate::models::session_keys;

/// Extractor yielding the credentials an API call should use.
///
/// Resolution order:
/// 1. `Authorization: Bearer <token>` on the incoming request (the page
///    script sends the token it keeps in local storage)
/// 2. the token stored in the server session
/// 3. nothing, in which case the request goes upstream without a token
///
/// Never rejects: the API decides whether the request is allowed.
pub struct ApiCredentials(pub Credentials);

impl<S> FromRequestParts<S> for ApiCredentials
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_from_header(parts) {
            return Ok(Self(Credentials::bearer(token)));
        }

        let session_token = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<String>(session_keys::API_TOKEN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(
            session_token.map_or_else(Credentials::anonymous, Credentials::bearer),
        ))
    }
}

fn bearer_from_header(parts: &Parts) -> Option<String> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() && token != "null")
        .then(|| token.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(auth: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/customers");
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_header_parsing() {
        assert_eq!(
            bearer_from_header(&parts(Some("Bearer abc.def"))).as_deref(),
            Some("abc.def")
        );
        assert_eq!(
            bearer_from_header(&parts(Some("bearer   tok "))).as_deref(),
            Some("tok")
        );
        assert_eq!(bearer_from_header(&parts(Some("Basic dXNlcg=="))), None);
        assert_eq!(bearer_from_header(&parts(Some("Bearer null"))), None);
        assert_eq!(bearer_from_header(&parts(None)), None);
    }

    #[tokio::test]
    async fn test_header_token_wins_without_session() {
        let mut parts = parts(Some("Bearer from-header"));
        let ApiCredentials(credentials) = ApiCredentials::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(!credentials.is_anonymous());

        let mut parts = super::tests::parts(None);
        let ApiCredentials(credentials) = ApiCredentials::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(credentials.is_anonymous());
    }
}
