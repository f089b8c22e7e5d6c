use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-request record of the identity established by an authenticator.
///
/// One instance exists per inbound request and is owned by the pipeline.
/// Authenticators receive it by exclusive reference and only write
/// `subject` and `extra`; later stages (authorizers, mutators) read it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationSession {
    /// Identity of the authenticated principal, empty until set
    #[serde(default)]
    pub subject: String,

    /// Auxiliary claims; `None` until an authenticator provides them
    #[serde(default)]
    pub extra: Option<Map<String, Value>>,
}

impl AuthenticationSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a single extra claim
    #[must_use]
    pub fn extra_claim(&self, key: &str) -> Option<&Value> {
        self.extra.as_ref().and_then(|extra| extra.get(key))
    }

    /// True when no authenticator has written an identity yet
    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        self.subject.is_empty()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_session_is_empty() {
        let session = AuthenticationSession::new();
        assert!(session.is_anonymous());
        assert!(session.extra.is_none());
        assert!(session.extra_claim("scope").is_none());
    }

    #[test]
    fn extra_claim_lookup() {
        let Value::Object(extra) = json!({"scope": "read", "tier": 2}) else {
            unreachable!()
        };
        let session = AuthenticationSession {
            subject: "user-42".to_owned(),
            extra: Some(extra),
        };

        assert!(!session.is_anonymous());
        assert_eq!(session.extra_claim("scope"), Some(&json!("read")));
        assert_eq!(session.extra_claim("tier"), Some(&json!(2)));
        assert!(session.extra_claim("missing").is_none());
    }

    #[test]
    fn serializes_as_subject_and_extra() {
        let session = AuthenticationSession {
            subject: "svc".to_owned(),
            extra: None,
        };
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(value, json!({"subject": "svc", "extra": null}));
    }
}
