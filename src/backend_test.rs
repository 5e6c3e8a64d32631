use super::*;
use crate::error::ErrorKind;
use crate::test_support::{failing_service, fake_service, spawn_service};

async fn backend_for(app: axum::Router) -> (HttpBackend, String) {
    let base = spawn_service(app).await;
    let config = SessionConfig::default().with_backend_url(&base).unwrap();
    (HttpBackend::new(config).unwrap(), base)
}

#[tokio::test]
async fn current_user_without_cookie_is_none() {
    let (backend, _) = backend_for(fake_service()).await;
    assert_eq!(backend.current_user().await.unwrap(), None);
}

#[tokio::test]
async fn login_cookie_is_replayed_on_current_user() {
    let (backend, _) = backend_for(fake_service()).await;

    let user = backend.login("alb", "abc").await.unwrap().unwrap();
    assert_eq!(user.username(), Some("alb"));

    let current = backend.current_user().await.unwrap().unwrap();
    assert_eq!(current.get("emailAddr").and_then(|v| v.as_str()), Some("alb@mail.com"));
}

#[tokio::test]
async fn rejected_login_is_none_not_error() {
    let (backend, _) = backend_for(fake_service()).await;
    assert_eq!(backend.login("alb", "wrong").await.unwrap(), None);
    assert_eq!(backend.current_user().await.unwrap(), None);
}

#[tokio::test]
async fn logout_expires_session_cookie() {
    let (backend, _) = backend_for(fake_service()).await;
    backend.login("alb", "abc").await.unwrap();

    backend.logout().await.unwrap();
    assert_eq!(backend.current_user().await.unwrap(), None);
}

#[tokio::test]
async fn create_user_posts_details() {
    let (backend, _) = backend_for(fake_service()).await;
    let details = UserDetails::new("dana", "pw").with_name("Dana");

    let created = backend.create_user(&details).await.unwrap().unwrap();
    assert_eq!(created.username(), Some("dana"));
    assert_eq!(created.get("name").and_then(|v| v.as_str()), Some("Dana"));
    assert!(created.get("password").is_none());
}

#[tokio::test]
async fn create_user_rejection_is_none() {
    let (backend, _) = backend_for(fake_service()).await;
    assert_eq!(backend.create_user(&UserDetails::new("taken", "pw")).await.unwrap(), None);
}

#[tokio::test]
async fn non_200_status_is_backend_error_with_endpoint() {
    let (backend, base) = backend_for(failing_service(StatusCode::INTERNAL_SERVER_ERROR)).await;

    let err = backend.current_user().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(err, SessionError::backend(format!("{base}/user/current"), "status 500"));

    let err = backend.logout().await.unwrap_err();
    assert_eq!(err, SessionError::backend(format!("{base}/user/login"), "status 500"));
}

#[tokio::test]
async fn other_success_statuses_are_still_backend_errors() {
    let (backend, _) = backend_for(failing_service(StatusCode::NO_CONTENT)).await;
    let err = backend.login("alb", "abc").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
}

#[tokio::test]
async fn unreachable_service_is_backend_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = SessionConfig::default().with_backend_url(&format!("http://{addr}")).unwrap();
    let backend = HttpBackend::new(config).unwrap();
    let err = backend.current_user().await.unwrap_err();
    assert!(!err.is_domain_violation());
}

#[tokio::test]
async fn connect_timeout_is_backend_error() {
    let config = SessionConfig { connect_timeout_secs: 1, ..SessionConfig::default() }
        .with_backend_url("http://10.255.255.1:81")
        .unwrap();
    let backend = HttpBackend::new(config).unwrap();
    let err = backend.current_user().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Backend);
    assert!(matches!(err, SessionError::Backend { endpoint, .. } if endpoint.ends_with("/user/current")));
}
