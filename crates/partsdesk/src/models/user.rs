use serde::{Deserialize, Serialize};

/// The signed-in user, as returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPublic {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_superuser: bool,
}

/// Reference to a user on another record (e.g. the verifier of a part).
///
/// Depending on the endpoint the service sends a bare identifier or an
/// embedded user object; both forms are accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "UserRefRepr")]
pub struct UserRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserRefRepr {
    Id(String),
    User {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        email: Option<String>,
        #[serde(default)]
        full_name: Option<String>,
    },
}

impl From<UserRefRepr> for UserRef {
    fn from(repr: UserRefRepr) -> Self {
        match repr {
            UserRefRepr::Id(id) => Self {
                id: Some(id),
                ..Default::default()
            },
            UserRefRepr::User {
                id,
                email,
                full_name,
            } => Self {
                id,
                email,
                full_name,
            },
        }
    }
}

impl UserRef {
    /// Best human-readable name: full name, then email, then identifier.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.email.as_deref())
            .or(self.id.as_deref())
            .unwrap_or("unknown")
    }
}

impl From<&UserPublic> for UserRef {
    fn from(user: &UserPublic) -> Self {
        Self {
            id: Some(user.id.clone()),
            email: Some(user.email.clone()),
            full_name: user.full_name.clone(),
        }
    }
}

/// Generic `{"message": ...}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}
