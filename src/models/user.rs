use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum UserRole {
    #[serde(rename = "admin")]
    Admin,
    #[serde(rename = "user")]
    User,
}

impl UserRole {
    /// Unknown or missing roles are treated as plain users.
    pub fn parse(role: Option<&str>) -> Self {
        match role {
            Some(role) if role.eq_ignore_ascii_case("admin") => UserRole::Admin,
            _ => UserRole::User,
        }
    }

    pub fn satisfies(&self, required: UserRole) -> bool {
        *self == required || *self == UserRole::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(UserRole::parse(Some("Admin")), UserRole::Admin);
        assert_eq!(UserRole::parse(Some("editor")), UserRole::User);
        assert_eq!(UserRole::parse(None), UserRole::User);
        assert!(UserRole::Admin.satisfies(UserRole::User));
        assert!(!UserRole::User.satisfies(UserRole::Admin));
    }
}
