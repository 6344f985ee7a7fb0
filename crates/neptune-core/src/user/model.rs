//! User and plan domain models.

use serde::{Deserialize, Serialize};

/// The authenticated GitHub identity.
///
/// Created on successful authentication and replaced wholesale on the next
/// one. No field is validated here; callers hand in complete records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub login: String,
    pub avatar_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl User {
    /// Name to show in the UI: the profile name when set, the login otherwise.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.login)
    }
}

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    #[default]
    Free,
    Pro,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Pro => "pro",
        }
    }
}

impl std::fmt::Display for Plan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "pro" => Ok(Plan::Pro),
            other => Err(format!("unknown plan '{}', expected 'free' or 'pro'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User {
            id: "42".to_string(),
            login: "octo".to_string(),
            avatar_url: "https://avatars.example/42".to_string(),
            name: None,
            email: Some("octo@example.com".to_string()),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["avatarUrl"], "https://avatars.example/42");
        assert!(json.get("name").is_none());
        assert_eq!(json["email"], "octo@example.com");
    }

    #[test]
    fn test_display_name_falls_back_to_login() {
        let mut user = User {
            id: "1".to_string(),
            login: "octo".to_string(),
            avatar_url: String::new(),
            name: Some(String::new()),
            email: None,
        };
        assert_eq!(user.display_name(), "octo");

        user.name = Some("Octo Cat".to_string());
        assert_eq!(user.display_name(), "Octo Cat");
    }

    #[test]
    fn test_plan_round_trips_lowercase() {
        assert_eq!(serde_json::to_string(&Plan::Pro).unwrap(), "\"pro\"");
        assert_eq!("FREE".parse::<Plan>().unwrap(), Plan::Free);
        assert!("gold".parse::<Plan>().is_err());
        assert_eq!(Plan::default(), Plan::Free);
    }
}
