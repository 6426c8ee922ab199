use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::users::{
    service::{UserDraft, UserPatch},
    validate::{self, Checks},
    Role,
};

/// Request body for self-service registration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl RegisterRequest {
    /// Role is always `user` for self-registration.
    pub fn into_draft(self) -> AppResult<UserDraft> {
        let mut checks = Checks::new();

        let email = checks.take(validate::email(self.email.as_deref().unwrap_or_default()));

        let password = self.password.unwrap_or_default();
        checks.take(validate::password(&password));
        match self.confirm_password.as_deref() {
            None | Some("") => checks.fail("confirmPassword", "Confirm password is required"),
            Some(confirm) if confirm != password => {
                checks.fail("confirmPassword", "Passwords do not match")
            }
            Some(_) => {}
        }

        let username = validate::username_or_derived(self.username.as_deref(), email.as_deref())
            .and_then(|r| checks.take(r));

        checks.finish()?;
        let (Some(email), Some(username)) = (email, username) else {
            return Err(AppError::invalid("email", "Email is required"));
        };
        Ok(UserDraft {
            email,
            username,
            password,
            first_name: validate::name(self.first_name.as_deref()),
            last_name: validate::name(self.last_name.as_deref()),
            role: Role::User,
            profile_image: String::new(),
        })
    }
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Normalized email and the raw password.
    pub fn into_credentials(self) -> AppResult<(String, String)> {
        let mut checks = Checks::new();
        let email = checks.take(validate::email(self.email.as_deref().unwrap_or_default()));
        let password = self.password.unwrap_or_default();
        if password.is_empty() {
            checks.fail("password", "Password is required");
        }
        checks.finish()?;
        Ok((email.unwrap_or_default(), password))
    }
}

/// Body of `PUT /auth/me`. Role is not accepted here.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

impl UpdateProfileRequest {
    pub fn into_patch(self) -> AppResult<UserPatch> {
        let mut checks = Checks::new();

        let email = self
            .email
            .as_deref()
            .and_then(|e| checks.take(validate::email(e)));
        let username = self
            .username
            .as_deref()
            .and_then(|u| checks.take(validate::username(u)));

        let password = self.password.filter(|p| !p.is_empty());
        if let Some(p) = password.as_deref() {
            checks.take(validate::password(p));
            if self.confirm_password.as_deref() != Some(p) {
                checks.fail("confirmPassword", "Passwords do not match");
            }
        }

        checks.finish()?;
        Ok(UserPatch {
            email,
            username,
            password,
            first_name: self.first_name.map(|n| validate::name(Some(n.as_str()))),
            last_name: self.last_name.map(|n| validate::name(Some(n.as_str()))),
            role: None,
            profile_image: None,
        })
    }
}
