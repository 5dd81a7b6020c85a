use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Deserializer, Serialize};

/// Authorization code issued by Kakao after user consent.
///
/// Lives for a single exchange request and is never persisted. `Debug`
/// output is redacted so the code cannot leak through logs.
#[derive(Clone, PartialEq, Eq, Hash, From, Into)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthorizationCode(<redacted>)")
    }
}

/// OPT member identifier.
///
/// The backend sends `id` as a JSON number on some endpoints and as a string
/// on others. Both forms normalize to the decimal string, which is also the
/// persisted form.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct MemberId(pub String);

impl MemberId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MemberId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(serde_json::Number),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// Backend role string, e.g. `ROLE_USER` or `ROLE_TRAINER`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct Role(pub String);

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_id_from_number() {
        let id: MemberId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn member_id_from_string() {
        let id: MemberId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn member_id_serializes_as_string() {
        let id = MemberId::from("7".to_string());
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"7\"");
    }

    #[test]
    fn role_display() {
        let role = Role::from("ROLE_USER".to_string());
        assert_eq!(role.to_string(), "ROLE_USER");
    }

    #[test]
    fn authorization_code_debug_is_redacted() {
        let code = AuthorizationCode::new("secret-code");
        let debug = format!("{code:?}");
        assert!(!debug.contains("secret-code"));
        assert_eq!(code.as_str(), "secret-code");
    }
}
