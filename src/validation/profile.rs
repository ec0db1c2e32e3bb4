use garde::Validate;

use crate::error::{AppError, Result};
use crate::models::user::{ProfileUpdate, User};
use crate::validation::auth::field_errors;

fn ten_digits<C>(value: &str, _ctx: &C) -> garde::Result {
    if value.len() == 10 && value.chars().all(|c| c.is_ascii_digit()) {
        Ok(())
    } else {
        Err(garde::Error::new("El teléfono debe tener 10 dígitos"))
    }
}

/// The editable part of the profile page.
#[derive(Debug, Clone, Validate)]
pub struct ProfileForm {
    #[garde(length(chars, min = 1, max = 100))]
    pub name: String,
    #[garde(custom(ten_digits))]
    pub phone: String,
}

impl ProfileForm {
    /// Prefills the form from the stored user.
    pub fn from_user(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            phone: user.phone.clone().unwrap_or_default(),
        }
    }

    /// Validates the trimmed values and builds the partial update.
    pub fn into_update(self) -> Result<ProfileUpdate> {
        let form = ProfileForm {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
        };
        if let Err(report) = form.validate() {
            return Err(AppError::Validation(field_errors(&report)));
        }

        Ok(ProfileUpdate {
            name: Some(form.name),
            phone: Some(form.phone),
            ..Default::default()
        })
    }
}
