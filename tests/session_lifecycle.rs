mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{DUPLICATE_EMAIL, PASSWORD, TestContext, jwt_expiring_in};
use hosped::{
    AppError, AppState, Config,
    error::ConflictField,
    models::auth::{LoginRequest, RegisterRequest},
    models::session::{Role, SessionState},
    repositories::token::{ACCESS_TOKEN_KEY, MemoryTokenStore, PROFILE_KEY, REFRESH_TOKEN_KEY},
};

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_login_stores_tokens_and_profile() {
        let context = TestContext::new().await;
        let session = context
            .state
            .session
            .login(login_request("u@e.com", PASSWORD))
            .await
            .unwrap();

        assert_eq!(session.refresh_token.as_deref(), Some("R1"));
        let profile = session.profile.clone().unwrap();
        assert_eq!(profile.email, "u@e.com");
        assert_eq!(profile.role, Role::User);

        assert_eq!(context.state.store.get(ACCESS_TOKEN_KEY), session.access_token);
        assert_eq!(context.state.store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
        assert!(context.state.store.get(PROFILE_KEY).unwrap().contains("USUARIO"));

        assert!(context.state.session.is_authenticated());
        assert_eq!(session.state(), SessionState::Authenticated);
        assert!(!context.state.session.needs_refresh());
    }

    #[tokio::test]
    async fn test_login_with_host_role() {
        let context = TestContext::new().await;
        context
            .state
            .session
            .login(login_request("host@e.com", PASSWORD))
            .await
            .unwrap();

        assert!(context.state.session.is_host());
        assert!(!context.state.session.is_admin());
    }

    #[tokio::test]
    async fn test_login_failure_carries_server_message() {
        let context = TestContext::new().await;
        let result = context
            .state
            .session
            .login(login_request("u@e.com", "wrong"))
            .await;

        match result {
            Err(AppError::InvalidCredentials(message)) => assert_eq!(message, "Credenciales inválidas"),
            other => panic!("unexpected: {:?}", other),
        }
        assert_eq!(context.state.store.get(ACCESS_TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_login_leaves_previous_session_on_failure() {
        let context = TestContext::new().await;
        context
            .state
            .session
            .login(login_request("u@e.com", PASSWORD))
            .await
            .unwrap();
        let before = context.state.session.session();

        let _ = context
            .state
            .session
            .login(login_request("u@e.com", "wrong"))
            .await;

        assert_eq!(context.state.session.session(), before);
    }

    #[tokio::test]
    async fn test_register_duplicate_email_is_a_conflict() {
        let context = TestContext::new().await;
        let request = RegisterRequest {
            name: "Juan Pérez".to_string(),
            email: DUPLICATE_EMAIL.to_string(),
            phone: "3001234567".to_string(),
            password: "Segura1!".to_string(),
            birth_date: "1990-05-20".to_string(),
            role: Role::User,
        };

        match context.state.session.register(request).await {
            Err(e @ AppError::Conflict { .. }) => {
                assert!(matches!(
                    e,
                    AppError::Conflict {
                        field: Some(ConflictField::Email),
                        ..
                    }
                ));
                assert_eq!(e.report().field.as_deref(), Some("email"));
            }
            other => panic!("unexpected: {:?}", other.map(|s| s.access_token)),
        }
        assert_eq!(context.state.session.session().access_token, None);
    }

    #[tokio::test]
    async fn test_register_duplicate_phone_in_plain_text() {
        let context = TestContext::new().await;
        let request = RegisterRequest {
            name: "Ana Gómez".to_string(),
            email: "ana@e.com".to_string(),
            phone: "3000000000".to_string(),
            password: "Segura1!".to_string(),
            birth_date: "1990-05-20".to_string(),
            role: Role::Host,
        };

        let error = context.state.session.register(request).await.err().unwrap();
        assert!(matches!(
            error,
            AppError::Conflict {
                field: Some(ConflictField::Phone),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_register_opens_a_session_with_the_chosen_role() {
        let context = TestContext::new().await;
        let request = RegisterRequest {
            name: "Ana Gómez".to_string(),
            email: "ana@e.com".to_string(),
            phone: "3011112222".to_string(),
            password: "Segura1!".to_string(),
            birth_date: "1990-05-20".to_string(),
            role: Role::Host,
        };

        let session = context.state.session.register(request).await.unwrap();
        assert_eq!(session.profile.unwrap().role, Role::Host);
        assert!(context.state.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_refresh_preserves_profile_and_applies_rotation() {
        let context = TestContext::new().await;
        context
            .state
            .session
            .login(login_request("u@e.com", PASSWORD))
            .await
            .unwrap();
        let profile = context.state.session.profile();

        context.backend.rotate_refresh_token.store(true, Ordering::SeqCst);
        let session = context.state.session.refresh().await.unwrap();

        assert_eq!(context.backend.refreshes(), 1);
        assert_eq!(session.access_token.as_deref(), context.backend.issued.lock().last().map(String::as_str));
        assert_eq!(session.refresh_token.as_deref(), Some("R2"));
        assert_eq!(session.profile, profile);
    }

    #[tokio::test]
    async fn test_refresh_without_rotation_keeps_refresh_token() {
        let context = TestContext::new().await;
        context.state.store.set(ACCESS_TOKEN_KEY, &jwt_expiring_in(-60));
        context.state.store.set(REFRESH_TOKEN_KEY, "R1");

        let session = context.state.session.refresh().await.unwrap();
        assert_eq!(session.refresh_token.as_deref(), Some("R1"));
        assert!(context.state.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_rejected_refresh_clears_the_session() {
        let context = TestContext::new().await;
        context
            .state
            .session
            .login(login_request("u@e.com", PASSWORD))
            .await
            .unwrap();
        context.backend.refresh_status.store(400, Ordering::SeqCst);

        let result = context.state.session.refresh().await;
        assert!(matches!(result, Err(AppError::RefreshRejected(_))));

        assert_eq!(context.state.store.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(context.state.store.get(REFRESH_TOKEN_KEY), None);
        assert_eq!(context.state.store.get(PROFILE_KEY), None);
        assert!(!context.state.session.is_authenticated());
    }

    #[tokio::test]
    async fn test_concurrent_refreshes_share_one_call() {
        let context = TestContext::new().await;
        context.state.store.set(ACCESS_TOKEN_KEY, &jwt_expiring_in(10));
        context.state.store.set(REFRESH_TOKEN_KEY, "R1");

        let session = &context.state.session;
        let (first, second) = tokio::join!(session.refresh(), session.refresh());

        assert_eq!(context.backend.refreshes(), 1);
        assert_eq!(first.unwrap().access_token, second.unwrap().access_token);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_reported_and_ends_a_refresh() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let state = AppState::with_store(
            &Config::new(format!("http://{}/api", addr)),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap();

        let login = state.session.login(login_request("u@e.com", PASSWORD)).await;
        let error = login.err().unwrap();
        assert!(matches!(error, AppError::NetworkUnreachable));
        assert_eq!(error.report().message, hosped::error::UNREACHABLE_MESSAGE);

        state.store.set(ACCESS_TOKEN_KEY, &jwt_expiring_in(-30));
        state.store.set(REFRESH_TOKEN_KEY, "R1");
        state.store.set(PROFILE_KEY, r#"{"email":"u@e.com","role":"USUARIO"}"#);

        assert!(matches!(state.session.refresh().await, Err(AppError::NetworkUnreachable)));
        assert_eq!(state.store.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(state.store.get(REFRESH_TOKEN_KEY), None);
        assert_eq!(state.store.get(PROFILE_KEY), None);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let context = TestContext::new().await;
        context
            .state
            .session
            .login(login_request("u@e.com", PASSWORD))
            .await
            .unwrap();

        context.state.session.logout();
        context.state.session.logout();

        let session = context.state.session.session();
        assert_eq!(session.access_token, None);
        assert_eq!(session.refresh_token, None);
        assert_eq!(session.profile, None);
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_route_guard() {
        let context = TestContext::new().await;
        assert!(!context.state.guard.can_enter());

        context
            .state
            .session
            .login(login_request("u@e.com", PASSWORD))
            .await
            .unwrap();
        assert!(context.state.guard.can_enter());

        context.state.store.set(ACCESS_TOKEN_KEY, &jwt_expiring_in(-5));
        assert!(!context.state.guard.can_enter());
        assert_eq!(context.state.store.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(context.state.session.session().state(), SessionState::AccessExpired);
    }
}
