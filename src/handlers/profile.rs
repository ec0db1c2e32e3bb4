use crate::{
    error::{AppError, Result},
    middleware_layer::guard::LOGIN_ROUTE,
    models::user::User,
    state::AppState,
    validation::profile::ProfileForm,
};

fn render(user: &User) -> String {
    format!(
        "{} <{}>\nTeléfono: {}\nRol: {}",
        user.name,
        user.email,
        user.phone.as_deref().unwrap_or("-"),
        user.role.label()
    )
}

/// Lets the command through the route guard, renewing an expired access
/// token first when a refresh token is still stored.
async fn require_session(state: &AppState) -> Result<()> {
    if state.guard.can_enter() {
        return Ok(());
    }

    if state.session.refresh_token().is_some() {
        state.session.refresh().await?;
        if state.guard.can_enter() {
            return Ok(());
        }
    }

    Err(AppError::Unauthorized(format!(
        "Inicia sesión para continuar ({})",
        LOGIN_ROUTE
    )))
}

/// Handles `profile`.
pub async fn show(state: &AppState) -> Result<String> {
    require_session(state).await?;
    let user = state.users.get_profile().await?;
    Ok(render(&user))
}

/// Handles `update-profile [--name <name>] [--phone <phone>]`.
///
/// The form starts from the stored profile; only the given fields change.
pub async fn update(state: &AppState, name: Option<String>, phone: Option<String>) -> Result<String> {
    require_session(state).await?;
    let current = state.users.get_profile().await?;

    let mut form = ProfileForm::from_user(&current);
    if let Some(name) = name {
        form.name = name;
    }
    if let Some(phone) = phone {
        form.phone = phone;
    }
    let update = form.into_update()?;
    let user = state.users.update_profile(&update).await?;
    Ok(format!("¡Perfil actualizado correctamente!\n{}", render(&user)))
}
