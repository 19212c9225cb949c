//! Signed-in user profile and login payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Profile returned by `login` and `check-login`.
///
/// Only the fields the console displays are typed; everything else the
/// server sends is kept in `extra` so the cached copy round-trips verbatim.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "fullName", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or("(unknown)")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default, alias = "profile")]
    pub user: UserProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_keeps_unknown_fields() {
        let raw = r#"{"_id":"u1","fullName":"Admin","email":"admin@gym.vn","avatar":"a.png","permissions":["all"]}"#;
        let profile: UserProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.display_name(), "Admin");
        assert_eq!(profile.extra["avatar"], "a.png");

        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back["permissions"][0], "all");
        assert_eq!(back["name"], "Admin");
    }

    #[test]
    fn test_login_response() {
        let resp: LoginResponse =
            serde_json::from_str(r#"{"token":"abc","user":{"email":"c@gym.vn"}}"#).unwrap();
        assert_eq!(resp.token, "abc");
        assert_eq!(resp.user.display_name(), "c@gym.vn");
    }
}
