//! User records and their validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meridian_core::{DomainError, DomainResult, UserId};

// ─────────────────────────────────────────────────────────────────────────────
// Role
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a user. Only the two roles below are accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Commands
// ─────────────────────────────────────────────────────────────────────────────

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl CreateUser {
    pub fn validate(&self) -> DomainResult<()> {
        validate_email(&self.email)?;
        validate_name(&self.name)
    }
}

/// Partial update of a user; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

impl UpdateUser {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A user of the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a new user from a validated command.
    pub fn create(cmd: CreateUser, now: DateTime<Utc>) -> DomainResult<Self> {
        cmd.validate()?;
        Ok(Self {
            id: UserId::new(),
            email: cmd.email,
            name: cmd.name,
            role: cmd.role,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Nothing changes when validation fails.
    pub fn apply_update(&mut self, patch: UpdateUser, now: DateTime<Utc>) -> DomainResult<()> {
        patch.validate()?;
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Example records the directory starts with.
pub fn seed_users(now: DateTime<Utc>) -> Vec<User> {
    [
        ("john.doe@example.com", "John Doe", Role::Admin),
        ("jane.smith@example.com", "Jane Smith", Role::User),
    ]
    .into_iter()
    .map(|(email, name, role)| User {
        id: UserId::new(),
        email: email.to_string(),
        name: name.to_string(),
        role,
        created_at: now,
        updated_at: now,
    })
    .collect()
}

/// Syntactic email check: `local@domain.tld`, no whitespace, one `@`.
pub fn validate_email(email: &str) -> DomainResult<()> {
    let invalid = || DomainError::validation(format!("email must be a valid address: {email:?}"));

    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || host.starts_with('.') || tld.len() < 2 {
        return Err(invalid());
    }
    Ok(())
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(email: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            name: "Ada Lovelace".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn accepts_plain_addresses() {
        for email in ["a@b.io", "john.doe@example.com", "x+tag@mail.example.org"] {
            assert!(validate_email(email).is_ok(), "{email}");
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for email in ["", "plain", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@.com", "a@b.c"] {
            assert!(validate_email(email).is_err(), "{email}");
        }
    }

    #[test]
    fn create_sets_both_timestamps() {
        let now = Utc::now();
        let user = User::create(cmd("ada@example.com"), now).unwrap();
        assert_eq!(user.created_at, now);
        assert_eq!(user.updated_at, now);
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn create_rejects_blank_name() {
        let mut c = cmd("ada@example.com");
        c.name = "   ".to_string();
        assert!(matches!(User::create(c, Utc::now()), Err(DomainError::Validation(_))));
    }

    #[test]
    fn failed_update_leaves_user_untouched() {
        let now = Utc::now();
        let mut user = User::create(cmd("ada@example.com"), now).unwrap();
        let before = user.clone();

        let patch = UpdateUser {
            name: Some("Countess".to_string()),
            email: Some("broken".to_string()),
            role: None,
        };
        assert!(user.apply_update(patch, Utc::now()).is_err());
        assert_eq!(user, before);
    }

    #[test]
    fn update_changes_only_present_fields() {
        let now = Utc::now();
        let mut user = User::create(cmd("ada@example.com"), now).unwrap();
        let later = now + chrono::Duration::seconds(5);

        user.apply_update(
            UpdateUser {
                role: Some(Role::Admin),
                ..Default::default()
            },
            later,
        )
        .unwrap();

        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.updated_at, later);
        assert_eq!(user.created_at, now);
    }

    #[test]
    fn role_outside_admin_and_user_is_rejected() {
        let body = serde_json::json!({"email": "a@b.io", "name": "A", "role": "root"});
        assert!(serde_json::from_value::<CreateUser>(body).is_err());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let body = serde_json::json!({"email": "a@b.io", "name": "A", "role": "user", "isAdmin": true});
        assert!(serde_json::from_value::<CreateUser>(body).is_err());
    }

    #[test]
    fn serializes_with_camel_case_timestamps() {
        let user = seed_users(Utc::now()).remove(0);
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "admin");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    proptest::proptest! {
        #[test]
        fn addresses_with_whitespace_never_validate(local in "[a-z]{1,8}", domain in "[a-z]{1,8}") {
            let email = format!("{local} @{domain}.com");
            proptest::prop_assert!(validate_email(&email).is_err());
        }
    }
}
