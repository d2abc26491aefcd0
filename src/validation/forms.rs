use serde::Deserialize;

use super::validator::{
    Validator, max_chars, min_chars, not_blank, permitted_value, valid_email,
};

/// Days a snippet may live for.
pub const PERMITTED_EXPIRY_DAYS: [i32; 3] = [1, 7, 365];

const MIN_PASSWORD_CHARS: usize = 8;
const MAX_PASSWORD_CHARS: usize = 128;

/// Fields submitted by the "create snippet" page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnippetCreateForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub expires: i32,
    #[serde(skip)]
    pub validator: Validator,
}

impl SnippetCreateForm {
    /// The form shown before anything is submitted.
    pub fn blank() -> Self {
        Self {
            expires: 365,
            ..Default::default()
        }
    }

    /// Runs every field check and reports whether the form is valid.
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.title), "title", "This field cannot be blank");
        v.check_field(
            max_chars(&self.title, 100),
            "title",
            "This field cannot be more than 100 characters long",
        );
        v.check_field(not_blank(&self.content), "content", "This field cannot be blank");
        v.check_field(
            permitted_value(self.expires, &PERMITTED_EXPIRY_DAYS),
            "expires",
            "This field must equal 1, 7 or 365",
        );
        v.valid()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserSignupForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.name), "name", "This field cannot be blank");
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(valid_email(&self.email), "email", "This field must be a valid email address");
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank");
        v.check_field(
            min_chars(&self.password, MIN_PASSWORD_CHARS),
            "password",
            "This field must be at least 8 characters long",
        );
        v.valid()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserLoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl UserLoginForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(not_blank(&self.email), "email", "This field cannot be blank");
        v.check_field(valid_email(&self.email), "email", "This field must be a valid email address");
        v.check_field(not_blank(&self.password), "password", "This field cannot be blank");
        v.valid()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChangeForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_new_password: String,
    #[serde(skip)]
    pub validator: Validator,
}

impl PasswordChangeForm {
    pub fn validate(&mut self) -> bool {
        let v = &mut self.validator;
        v.check_field(
            not_blank(&self.current_password),
            "current_password",
            "This field cannot be blank",
        );
        v.check_field(
            min_chars(&self.new_password, MIN_PASSWORD_CHARS)
                && max_chars(&self.new_password, MAX_PASSWORD_CHARS),
            "new_password",
            "Password must be between 8 and 128 characters long",
        );
        v.check_field(
            self.new_password == self.confirm_new_password,
            "confirm_new_password",
            "Passwords do not match",
        );
        v.valid()
    }
}
