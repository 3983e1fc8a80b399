use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Who is signing in to the portal.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    /// Table holding the credentials for this role.
    pub fn table(&self) -> &'static str {
        match self {
            Role::Student => "students",
            Role::Teacher => "teachers",
        }
    }

    /// Column a user of this role types into the username box.
    pub fn login_column(&self) -> &'static str {
        match self {
            Role::Student => "roll_number",
            Role::Teacher => "username",
        }
    }
}
