use std::fmt;

use serde::Serialize;

/// Worker login credentials plus display metadata.
///
/// The password is never serialized and never printed by `Debug`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub name: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Account {
    pub fn new(id: &str, username: &str, password: &str) -> Self {
        Self {
            id: id.to_string(),
            name: username.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            description: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Parse one `accounts.txt` line:
    /// `id,name,username,password,description,user_id,created_at,updated_at`.
    /// Fields past `password` are optional.
    pub(crate) fn from_line(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.trim_end_matches('\r').split(',').map(str::trim).collect();
        if fields.len() < 4 {
            return None;
        }
        let (id, name, username, password) = (fields[0], fields[1], fields[2], fields[3]);
        if id.is_empty() || username.is_empty() {
            return None;
        }

        let optional = |i: usize| {
            fields
                .get(i)
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        Some(Self {
            id: id.to_string(),
            name: name.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            description: optional(4).unwrap_or_default(),
            created_at: optional(6),
            updated_at: optional(7),
        })
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish_non_exhaustive()
    }
}
