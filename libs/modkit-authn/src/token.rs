//! Locating the bearer token in an inbound request.

use http::{HeaderMap, header, request::Parts};
use serde::{Deserialize, Serialize};

/// Where a strategy looks for the bearer token.
///
/// Serialized as a single-key object, e.g. `{"header": "X-Api-Token"}`,
/// `{"query_parameter": "access_token"}` or `{"cookie": "session"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenLocation {
    /// Raw value of the named header; `Authorization` keeps the bearer scheme
    Header(String),
    /// First value of the named query parameter
    QueryParameter(String),
    /// Value of the named cookie
    Cookie(String),
}

/// Extract the bearer token from `request`.
///
/// Without a location the token is read from `Authorization: Bearer <token>`.
/// Empty values count as absent.
#[must_use]
pub fn bearer_token_from_request(
    request: &Parts,
    location: Option<&TokenLocation>,
) -> Option<String> {
    let token = match location {
        Some(TokenLocation::Header(name))
            if !name.eq_ignore_ascii_case(header::AUTHORIZATION.as_str()) =>
        {
            request
                .headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .map(ToOwned::to_owned)
        }
        Some(TokenLocation::QueryParameter(name)) => query_parameter(request, name),
        Some(TokenLocation::Cookie(name)) => cookie(&request.headers, name),
        None | Some(TokenLocation::Header(_)) => authorization_bearer(&request.headers),
    };

    token.filter(|t| !t.is_empty())
}

/// `Authorization: <scheme> <token>` with a case-insensitive `bearer` scheme
fn authorization_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.to_owned())
}

fn query_parameter(request: &Parts, name: &str) -> Option<String> {
    let query = request.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
                .to_owned()
        })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    fn parts(uri: &str, headers: &[(&str, &str)]) -> Parts {
        let mut builder = http::Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn default_location_reads_bearer_authorization() {
        let req = parts("/", &[("authorization", "Bearer abc123")]);
        assert_eq!(bearer_token_from_request(&req, None).as_deref(), Some("abc123"));

        let req = parts("/", &[("authorization", "bearer abc123")]);
        assert_eq!(bearer_token_from_request(&req, None).as_deref(), Some("abc123"));
    }

    #[test]
    fn default_location_rejects_other_schemes() {
        let req = parts("/", &[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(bearer_token_from_request(&req, None), None);

        let req = parts("/", &[("authorization", "Bearer")]);
        assert_eq!(bearer_token_from_request(&req, None), None);

        let req = parts("/", &[("authorization", "Bearer ")]);
        assert_eq!(bearer_token_from_request(&req, None), None);

        let req = parts("/", &[]);
        assert_eq!(bearer_token_from_request(&req, None), None);
    }

    #[test]
    fn authorization_header_location_keeps_bearer_parsing() {
        let location = TokenLocation::Header("Authorization".to_owned());
        let req = parts("/", &[("authorization", "Bearer abc123")]);
        assert_eq!(
            bearer_token_from_request(&req, Some(&location)).as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn custom_header_returns_raw_value() {
        let location = TokenLocation::Header("X-Api-Token".to_owned());
        let req = parts("/", &[("x-api-token", "raw-token")]);
        assert_eq!(
            bearer_token_from_request(&req, Some(&location)).as_deref(),
            Some("raw-token")
        );

        let req = parts("/", &[("authorization", "Bearer abc123")]);
        assert_eq!(bearer_token_from_request(&req, Some(&location)), None);
    }

    #[test]
    fn query_parameter_location() {
        let location = TokenLocation::QueryParameter("access_token".to_owned());
        let req = parts("/items?page=2&access_token=a%2Bb", &[]);
        assert_eq!(
            bearer_token_from_request(&req, Some(&location)).as_deref(),
            Some("a+b")
        );

        let req = parts("/items?page=2", &[]);
        assert_eq!(bearer_token_from_request(&req, Some(&location)), None);
    }

    #[test]
    fn cookie_location() {
        let location = TokenLocation::Cookie("session".to_owned());
        let req = parts("/", &[("cookie", "theme=dark; session=tok-1; lang=en")]);
        assert_eq!(
            bearer_token_from_request(&req, Some(&location)).as_deref(),
            Some("tok-1")
        );

        let req = parts("/", &[("cookie", "theme=dark")]);
        assert_eq!(bearer_token_from_request(&req, Some(&location)), None);
    }

    #[test]
    fn quoted_cookie_loses_one_pair_of_quotes() {
        let location = TokenLocation::Cookie("session".to_owned());

        let req = parts("/", &[("cookie", r#"session="tok-1""#)]);
        assert_eq!(
            bearer_token_from_request(&req, Some(&location)).as_deref(),
            Some("tok-1")
        );

        let req = parts("/", &[("cookie", r#"session=""tok-1"""#)]);
        assert_eq!(
            bearer_token_from_request(&req, Some(&location)).as_deref(),
            Some(r#""tok-1""#)
        );

        let req = parts("/", &[("cookie", r#"session="tok-1"#)]);
        assert_eq!(
            bearer_token_from_request(&req, Some(&location)).as_deref(),
            Some(r#""tok-1"#)
        );
    }

    #[test]
    fn location_deserialization() {
        let header: TokenLocation = serde_json::from_value(json!({"header": "X-Token"})).unwrap();
        assert_eq!(header, TokenLocation::Header("X-Token".to_owned()));

        let query: TokenLocation =
            serde_json::from_value(json!({"query_parameter": "token"})).unwrap();
        assert_eq!(query, TokenLocation::QueryParameter("token".to_owned()));

        let cookie: TokenLocation = serde_json::from_value(json!({"cookie": "sid"})).unwrap();
        assert_eq!(cookie, TokenLocation::Cookie("sid".to_owned()));

        assert!(serde_json::from_value::<TokenLocation>(json!({"body": "x"})).is_err());
    }
}
