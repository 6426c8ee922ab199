use std::collections::HashMap;

use axum::extract::Multipart;
use bytes::BytesMut;

use crate::error::{AppError, AppResult};
use crate::images::services::{UploadItem, IMAGE_FIELD};
use crate::users::{
    service::{UserDraft, UserPatch},
    validate::{self, Checks},
    Role,
};

/// Multipart body of admin create/update: text fields plus an optional `profileImage` file.
#[derive(Debug, Default)]
pub struct AdminUserForm {
    fields: HashMap<String, String>,
    image: Option<UploadItem>,
}

impl AdminUserForm {
    pub async fn from_multipart(mut mp: Multipart, max_image_bytes: usize) -> AppResult<Self> {
        let mut form = AdminUserForm::default();

        while let Some(mut field) = mp.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if name == IMAGE_FIELD && field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".into());
                let mut body = BytesMut::new();
                while let Some(chunk) = field.chunk().await? {
                    if body.len() + chunk.len() > max_image_bytes {
                        return Err(AppError::invalid(
                            IMAGE_FIELD,
                            format!("Image must be at most {} bytes", max_image_bytes),
                        ));
                    }
                    body.extend_from_slice(&chunk);
                }
                // browsers send an empty part when no file was chosen
                if !body.is_empty() {
                    form.image = Some(UploadItem {
                        body: body.freeze(),
                        content_type,
                    });
                }
                continue;
            }

            let value = field.text().await?;
            form.fields.insert(name, value);
        }

        Ok(form)
    }

    #[cfg(test)]
    pub fn from_fields<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            image: None,
        }
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Present and not blank.
    fn supplied(&self, name: &str) -> Option<&str> {
        self.text(name).filter(|v| !v.trim().is_empty())
    }

    pub fn take_image(&mut self) -> Option<UploadItem> {
        self.image.take()
    }

    /// Registration rules, with the role taken from the form (default `user`).
    pub fn to_draft(&self) -> AppResult<UserDraft> {
        let mut checks = Checks::new();

        let email = checks.take(validate::email(self.text("email").unwrap_or_default()));

        let password = self.text("password").unwrap_or_default().to_string();
        checks.take(validate::password(&password));
        if let Some(confirm) = self.supplied("confirmPassword") {
            if confirm != password {
                checks.fail("confirmPassword", "Passwords do not match");
            }
        }

        let username = validate::username_or_derived(self.text("username"), email.as_deref())
            .and_then(|r| checks.take(r));

        let role = match self.supplied("role") {
            Some(raw) => checks.take(validate::role(raw)),
            None => Some(Role::User),
        };

        checks.finish()?;
        let (Some(email), Some(username), Some(role)) = (email, username, role) else {
            return Err(AppError::invalid("email", "Email is required"));
        };
        Ok(UserDraft {
            email,
            username,
            password,
            first_name: validate::name(self.text("firstName")),
            last_name: validate::name(self.text("lastName")),
            role,
            profile_image: String::new(),
        })
    }

    /// Only fields present in the form are validated and applied. Blank
    /// email, username, password or role count as absent; names may be cleared.
    pub fn to_patch(&self) -> AppResult<UserPatch> {
        let mut checks = Checks::new();

        let email = self
            .supplied("email")
            .and_then(|e| checks.take(validate::email(e)));
        let username = self
            .supplied("username")
            .and_then(|u| checks.take(validate::username(u)));
        let password = self
            .supplied("password")
            .and_then(|p| checks.take(validate::password(p)).map(|_| p.to_string()));
        if let (Some(p), Some(confirm)) = (password.as_deref(), self.supplied("confirmPassword")) {
            if p != confirm {
                checks.fail("confirmPassword", "Passwords do not match");
            }
        }
        let role = self
            .supplied("role")
            .and_then(|r| checks.take(validate::role(r)));

        checks.finish()?;
        Ok(UserPatch {
            email,
            username,
            password,
            first_name: self.text("firstName").map(|n| validate::name(Some(n))),
            last_name: self.text("lastName").map(|n| validate::name(Some(n))),
            role,
            profile_image: None,
        })
    }
}
