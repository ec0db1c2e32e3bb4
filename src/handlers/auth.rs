use crate::{
    error::{AppError, FieldError, Result},
    models::session::{Role, SessionState},
    state::AppState,
    validation::auth::{
        FormContext, LoginForm, PasswordResetForm, RecoveryRequestForm, RegistrationForm,
    },
};

/// Handles `login <email> <password>`.
pub async fn login(state: &AppState, email: String, password: String) -> Result<String> {
    let request = LoginForm { email, password }.into_request()?;
    let session = state.session.login(request).await?;

    let who = session
        .profile
        .map(|p| format!("{} ({})", p.email, p.role.label()))
        .unwrap_or_default();
    Ok(format!("Sesión iniciada: {}", who))
}

/// The fields of `register`, in command-line order.
pub struct RegisterArgs {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub birth_date: String,
    pub role: Option<String>,
}

/// Handles `register <name> <email> <phone> <password> <birth-date> [role]`.
///
/// The password is typed once on the command line, so it doubles as its
/// own confirmation.
pub async fn register(state: &AppState, args: RegisterArgs) -> Result<String> {
    let role = match args.role.as_deref() {
        Some(raw) => Role::parse(raw).ok_or_else(|| {
            AppError::Validation(vec![FieldError::new("role", "Rol desconocido")])
        })?,
        None => Role::User,
    };

    let form = RegistrationForm {
        name: args.name,
        email: args.email,
        phone: args.phone,
        confirm_password: args.password.clone(),
        password: args.password,
        birth_date: args.birth_date,
        role,
    };
    let request = form.into_request(&FormContext::now())?;
    let session = state.session.register(request).await?;

    Ok(format!(
        "Cuenta creada: {}",
        session.profile.map(|p| p.email).unwrap_or_default()
    ))
}

/// Handles `logout`.
pub fn logout(state: &AppState) -> Result<String> {
    state.session.logout();
    Ok("Sesión cerrada.".to_string())
}

/// Handles `status`.
pub fn status(state: &AppState) -> Result<String> {
    let authenticated = state.session.is_authenticated();
    let session = state.session.session();

    let line = match session.state() {
        SessionState::Anonymous => "Sin sesión.".to_string(),
        SessionState::AccessExpired => {
            "Token de acceso vencido; se renovará en la próxima petición.".to_string()
        }
        SessionState::Authenticated => {
            let expiry = state
                .session
                .access_token_expiry()
                .map(|e| e.to_rfc3339())
                .unwrap_or_default();
            format!("Autenticado hasta {}", expiry)
        }
    };

    let role = match session.profile {
        Some(p) if authenticated => format!(" [{} · {}]", p.email, p.role.label()),
        _ => String::new(),
    };

    Ok(format!("{}{}", line, role))
}

/// Handles `recover <email>`.
pub async fn recover(state: &AppState, email: String) -> Result<String> {
    let email = RecoveryRequestForm { email }.into_email()?;
    let message = state.recovery.request_code(&email).await?;
    Ok(if message.is_empty() {
        "Código enviado a tu correo".to_string()
    } else {
        message
    })
}

/// Handles `reset <email> <code> <new-password>`.
pub async fn reset(
    state: &AppState,
    email: String,
    code: String,
    new_password: String,
) -> Result<String> {
    let request = PasswordResetForm {
        email,
        code,
        confirm_password: new_password.clone(),
        new_password,
    }
    .into_request()?;
    let message = state.recovery.reset_password(request).await?;
    Ok(if message.is_empty() {
        "¡Contraseña restablecida exitosamente!".to_string()
    } else {
        message
    })
}
