use chrono::{Datelike, Local, NaiveDate};
use garde::Validate;

use crate::error::{AppError, FieldError, Result};
use crate::models::auth::{LoginRequest, PasswordResetRequest, RegisterRequest};
use crate::models::session::Role;

/// Minimum age to open an account.
pub const MINIMUM_AGE: i32 = 18;
/// Characters that satisfy the "special character" password rule.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Values the validators need from outside the form.
#[derive(Debug, Clone, Copy)]
pub struct FormContext {
    /// The date ages are computed against.
    pub today: NaiveDate,
}

impl FormContext {
    /// A context for the local calendar date.
    pub fn now() -> Self {
        Self {
            today: Local::now().date_naive(),
        }
    }
}

/// Converts a garde report into field errors.
pub(crate) fn field_errors(report: &garde::Report) -> Vec<FieldError> {
    report
        .iter()
        .map(|(path, error)| FieldError::new(path.to_string(), error.message()))
        .collect()
}

pub(crate) fn finish(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Full years between `birth` and `today`.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

/// Returns true when password and confirmation are both filled and differ.
pub fn passwords_differ(password: &str, confirmation: &str) -> bool {
    !password.is_empty() && !confirmation.is_empty() && password != confirmation
}

fn name_characters<C>(value: &str, _ctx: &C) -> garde::Result {
    if value.chars().all(|c| c.is_alphabetic() || c == ' ') {
        Ok(())
    } else {
        Err(garde::Error::new("El nombre solo puede contener letras y espacios"))
    }
}

fn colombian_mobile<C>(value: &str, _ctx: &C) -> garde::Result {
    let valid = value.len() == 10
        && value.starts_with('3')
        && value.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(garde::Error::new("El teléfono debe tener 10 dígitos y empezar por 3"))
    }
}

fn strong_password<C>(value: &str, _ctx: &C) -> garde::Result {
    let has_upper = value.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = value.chars().any(|c| c.is_ascii_digit());
    let has_special = value.chars().any(|c| SPECIAL_CHARACTERS.contains(c));

    if has_upper && has_digit && has_special {
        Ok(())
    } else {
        Err(garde::Error::new(
            "La contraseña debe tener una mayúscula, un número y un carácter especial",
        ))
    }
}

fn reset_password_rules<C>(value: &str, _ctx: &C) -> garde::Result {
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(garde::Error::new("La contraseña debe tener al menos una mayúscula"));
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(garde::Error::new("La contraseña debe tener al menos un número"));
    }
    Ok(())
}

fn adult_birth_date(value: &str, ctx: &FormContext) -> garde::Result {
    let birth = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| garde::Error::new("La fecha de nacimiento debe tener el formato AAAA-MM-DD"))?;

    if age_on(birth, ctx.today) < MINIMUM_AGE {
        return Err(garde::Error::new("Debes ser mayor de edad"));
    }
    Ok(())
}

/// The registration form.
#[derive(Debug, Clone, Validate)]
#[garde(context(FormContext))]
pub struct RegistrationForm {
    #[garde(length(chars, min = 3, max = 100), custom(name_characters))]
    pub name: String,
    #[garde(email, length(max = 150))]
    pub email: String,
    #[garde(custom(colombian_mobile))]
    pub phone: String,
    #[garde(length(min = 8), custom(strong_password))]
    pub password: String,
    #[garde(length(min = 1))]
    pub confirm_password: String,
    #[garde(custom(adult_birth_date))]
    pub birth_date: String,
    #[garde(skip)]
    pub role: Role,
}

impl RegistrationForm {
    /// Checks every field rule plus the password confirmation.
    pub fn check(&self, ctx: &FormContext) -> Result<()> {
        let mut errors = match self.validate_with(ctx) {
            Ok(()) => Vec::new(),
            Err(report) => field_errors(&report),
        };

        if passwords_differ(&self.password, &self.confirm_password) {
            errors.push(FieldError::new("confirm_password", "Las contraseñas no coinciden"));
        }
        if self.role == Role::Admin {
            errors.push(FieldError::new("role", "Solo se puede registrar como huésped o anfitrión"));
        }

        finish(errors)
    }

    /// Normalizes, validates and turns the form into a request.
    ///
    /// Name and phone are trimmed, the email is trimmed and lower-cased.
    pub fn into_request(mut self, ctx: &FormContext) -> Result<RegisterRequest> {
        self.name = self.name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self.phone.trim().to_string();
        self.birth_date = self.birth_date.trim().to_string();
        self.check(ctx)?;

        Ok(RegisterRequest {
            name: self.name,
            email: self.email,
            phone: self.phone,
            password: self.password,
            birth_date: self.birth_date,
            role: self.role,
        })
    }
}

/// The login form.
#[derive(Debug, Clone, Validate)]
pub struct LoginForm {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub password: String,
}

impl LoginForm {
    /// Lower-cases the email, validates, and builds the login payload.
    pub fn into_request(self) -> Result<LoginRequest> {
        let email = self.email.trim().to_lowercase();
        let form = LoginForm {
            email,
            password: self.password,
        };
        if let Err(report) = form.validate() {
            return Err(AppError::Validation(field_errors(&report)));
        }

        Ok(LoginRequest {
            email: form.email,
            password: form.password,
        })
    }
}

/// Step one of password recovery.
#[derive(Debug, Clone, Validate)]
pub struct RecoveryRequestForm {
    #[garde(email)]
    pub email: String,
}

impl RecoveryRequestForm {
    /// Validates the form and returns the normalized email.
    pub fn into_email(self) -> Result<String> {
        let email = self.email.trim().to_string();
        if email.is_empty() {
            return Err(AppError::Validation(vec![FieldError::new(
                "email",
                "Ingresa tu correo electrónico",
            )]));
        }
        let form = RecoveryRequestForm { email };
        if let Err(report) = form.validate() {
            return Err(AppError::Validation(field_errors(&report)));
        }
        Ok(form.email)
    }
}

/// Step two of password recovery.
#[derive(Debug, Clone, Validate)]
pub struct PasswordResetForm {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1))]
    pub code: String,
    #[garde(length(min = 8), custom(reset_password_rules))]
    pub new_password: String,
    #[garde(skip)]
    pub confirm_password: String,
}

impl PasswordResetForm {
    /// Trims email and code, validates, and builds the reset payload.
    pub fn into_request(self) -> Result<PasswordResetRequest> {
        let form = PasswordResetForm {
            email: self.email.trim().to_string(),
            code: self.code.trim().to_string(),
            new_password: self.new_password,
            confirm_password: self.confirm_password,
        };

        let mut errors = match form.validate() {
            Ok(()) => Vec::new(),
            Err(report) => field_errors(&report),
        };
        if form.new_password != form.confirm_password {
            errors.push(FieldError::new("confirm_password", "Las contraseñas no coinciden"));
        }
        finish(errors)?;

        Ok(PasswordResetRequest {
            email: form.email,
            code: form.code,
            new_password: form.new_password,
        })
    }
}
