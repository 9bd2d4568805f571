//! Sign in, registration and sign out.

use std::collections::BTreeMap;
use std::sync::Arc;

use quire_api_types::{AuthUser, LoginRequest, RegisterRequest};
use regex::Regex;
use tracing::{info, warn};

use crate::{
    application::{
        repos::{AuthRepo, Credentials, RepoError},
        resource::{Field, FieldError, FieldKind, FieldRules, FormValues, field_views, validate_form},
        session::{Session, SessionStore},
    },
    domain::session::SessionUser,
    presentation::admin::views::AdminAuthFormView,
};

use super::EMAIL_PATTERN;

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const LOGOUT_PATH: &str = "/logout";
const LOGIN_FAILED_MESSAGE: &str = "Login error";
const REGISTER_FAILED_MESSAGE: &str = "Registration error";
const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords do not match";

/// Submitted values plus whatever went wrong with them.
#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    pub values: FormValues,
    pub errors: BTreeMap<String, FieldError>,
    pub error: Option<String>,
}

impl AuthForm {
    fn failed(values: FormValues, err: &RepoError, fallback: &str) -> Self {
        let errors = err
            .field_errors()
            .map(|fields| {
                fields
                    .iter()
                    .map(|(name, message)| (name.clone(), FieldError::server(message)))
                    .collect()
            })
            .unwrap_or_default();
        let error = match err {
            RepoError::Rejected { messages, .. } if !messages.is_empty() => messages.join(" "),
            _ => fallback.to_string(),
        };
        Self {
            values: without_passwords(values),
            errors,
            error: Some(error),
        }
    }
}

#[derive(Clone)]
pub struct AuthService {
    auth: Arc<dyn AuthRepo>,
    sessions: Arc<SessionStore>,
    service_token: Option<String>,
}

impl AuthService {
    pub fn new(
        auth: Arc<dyn AuthRepo>,
        sessions: Arc<SessionStore>,
        service_token: Option<String>,
    ) -> Self {
        Self {
            auth,
            sessions,
            service_token,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Sign in and open a session.
    ///
    /// The session calls the API with the token from the login response, or the
    /// configured service token when the API does not issue one.
    pub async fn login(&self, pairs: &[(String, String)]) -> Result<Arc<Session>, AuthForm> {
        let fields = login_fields();
        let values = FormValues::from_pairs(&fields, pairs);
        let errors = validate_form(&fields, &values);
        if !errors.is_empty() {
            return Err(AuthForm {
                values: without_passwords(values),
                errors,
                error: None,
            });
        }

        let request = LoginRequest {
            email: values.text("email").trim().to_string(),
            password: values.text("password").to_string(),
        };
        self.sign_in(&request)
            .await
            .map_err(|err| AuthForm::failed(values, &err, LOGIN_FAILED_MESSAGE))
    }

    /// Create an account, then sign it in.
    pub async fn register(&self, pairs: &[(String, String)]) -> Result<Arc<Session>, AuthForm> {
        let fields = register_fields();
        let values = FormValues::from_pairs(&fields, pairs);
        let errors = validate_form(&fields, &values);
        if !errors.is_empty() {
            return Err(AuthForm {
                values: without_passwords(values),
                errors,
                error: None,
            });
        }

        let request = RegisterRequest {
            name: values.text("name").trim().to_string(),
            username: values.text("username").trim().to_string(),
            email: values.text("email").trim().to_string(),
            password: values.text("password").to_string(),
            confirm_password: values.text("confirmPassword").to_string(),
        };
        if let Err(err) = self.auth.register(&request).await {
            warn!(
                target = "quire::application::admin::auth",
                error = %err,
                "registration rejected"
            );
            return Err(AuthForm::failed(values, &err, REGISTER_FAILED_MESSAGE));
        }
        info!(
            target = "quire::application::admin::auth",
            email = %request.email,
            "account registered"
        );

        let login = LoginRequest {
            email: request.email,
            password: request.password,
        };
        self.sign_in(&login)
            .await
            .map_err(|err| AuthForm::failed(values, &err, LOGIN_FAILED_MESSAGE))
    }

    /// End the session locally. An upstream logout failure is logged and ignored.
    pub async fn logout(&self, session: &Session) {
        if let Err(err) = self.auth.logout(session.credentials()).await {
            warn!(
                target = "quire::application::admin::auth",
                error = %err,
                "upstream logout failed"
            );
        }
        self.sessions.remove(session.id());
    }

    pub fn login_view(&self, form: &AuthForm, notice: Option<String>) -> AdminAuthFormView {
        AdminAuthFormView {
            heading: "Sign in".to_string(),
            form_action: LOGIN_PATH.to_string(),
            fields: field_views(&login_fields(), &form.values, &form.errors),
            submit_label: "Sign in".to_string(),
            error: form.error.clone(),
            notice,
            alternate_prompt: "No account yet?".to_string(),
            alternate_label: "Register".to_string(),
            alternate_href: REGISTER_PATH.to_string(),
        }
    }

    pub fn register_view(&self, form: &AuthForm) -> AdminAuthFormView {
        AdminAuthFormView {
            heading: "Create an account".to_string(),
            form_action: REGISTER_PATH.to_string(),
            fields: field_views(&register_fields(), &form.values, &form.errors),
            submit_label: "Register".to_string(),
            error: form.error.clone(),
            notice: None,
            alternate_prompt: "Already registered?".to_string(),
            alternate_label: "Sign in".to_string(),
            alternate_href: LOGIN_PATH.to_string(),
        }
    }

    async fn sign_in(&self, request: &LoginRequest) -> Result<Arc<Session>, RepoError> {
        let response = self.auth.login(request).await?;
        let credentials = match response.token.or_else(|| self.service_token.clone()) {
            Some(token) => Credentials::bearer(token),
            None => Credentials::anonymous(),
        };
        let user = match response.user {
            Some(user) => user,
            None => self.auth.me(&credentials).await?,
        };

        let session = self.sessions.create(session_user(user), credentials);
        info!(
            target = "quire::application::admin::auth",
            user_id = %session.user().id,
            role = %session.user().role_label(),
            "signed in"
        );
        Ok(session)
    }
}

fn session_user(user: AuthUser) -> SessionUser {
    SessionUser {
        id: user.id,
        name: user.name.filter(|name| !name.trim().is_empty()),
        email: user.email,
        role_name: user.role_name,
    }
}

fn without_passwords(mut values: FormValues) -> FormValues {
    values.remove("password");
    values.remove("confirmPassword");
    values
}

fn email_rules() -> FieldRules {
    match Regex::new(EMAIL_PATTERN) {
        Ok(pattern) => FieldRules::default().required().pattern(pattern),
        Err(_) => FieldRules::default().required(),
    }
}

pub fn login_fields() -> Vec<Field> {
    vec![
        Field::new("email", "Email", FieldKind::Email)
            .placeholder("you@example.com")
            .rules(email_rules()),
        Field::new("password", "Password", FieldKind::Password)
            .rules(FieldRules::default().required()),
    ]
}

pub fn register_fields() -> Vec<Field> {
    vec![
        Field::new("name", "Name", FieldKind::Text)
            .rules(FieldRules::default().required().min_length(2)),
        Field::new("username", "Username", FieldKind::Text)
            .rules(FieldRules::default().required().min_length(2)),
        Field::new("email", "Email", FieldKind::Email)
            .placeholder("you@example.com")
            .rules(email_rules()),
        Field::new("password", "Password", FieldKind::Password)
            .rules(FieldRules::default().required().min_length(6)),
        Field::new("confirmPassword", "Confirm password", FieldKind::Password).rules(
            FieldRules::default().required().validate(|value, all| {
                if value.as_text() == Some(all.text("password")) {
                    Ok(())
                } else {
                    Err(PASSWORD_MISMATCH_MESSAGE.to_string())
                }
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use quire_api_types::LoginResponse;

    use super::*;

    #[derive(Default)]
    struct FakeAuth {
        calls: Mutex<Vec<String>>,
        token: Option<String>,
        include_user: bool,
        reject_login: bool,
    }

    impl FakeAuth {
        fn user() -> AuthUser {
            AuthUser {
                id: "u1".into(),
                name: Some("Ada".into()),
                email: "ada@example.com".into(),
                role_name: Some("admin".into()),
            }
        }
    }

    #[async_trait]
    impl AuthRepo for FakeAuth {
        async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, RepoError> {
            self.calls.lock().expect("calls").push(format!("login {}", request.email));
            if self.reject_login {
                return Err(RepoError::Rejected {
                    status: 401,
                    messages: vec!["Invalid credentials".into()],
                });
            }
            Ok(LoginResponse {
                token: self.token.clone(),
                user: self.include_user.then(Self::user),
            })
        }

        async fn register(&self, request: &RegisterRequest) -> Result<(), RepoError> {
            self.calls.lock().expect("calls").push(format!("register {}", request.username));
            Ok(())
        }

        async fn me(&self, auth: &Credentials) -> Result<AuthUser, RepoError> {
            self.calls
                .lock()
                .expect("calls")
                .push(format!("me {}", auth.token().unwrap_or("-")));
            Ok(Self::user())
        }

        async fn logout(&self, _auth: &Credentials) -> Result<(), RepoError> {
            self.calls.lock().expect("calls").push("logout".into());
            Err(RepoError::transport("gone"))
        }
    }

    fn service(fake: FakeAuth, service_token: Option<&str>) -> (AuthService, Arc<FakeAuth>) {
        let fake = Arc::new(fake);
        let sessions = Arc::new(SessionStore::new(Duration::from_secs(60)));
        (
            AuthService::new(fake.clone(), sessions, service_token.map(str::to_string)),
            fake,
        )
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn login_uses_the_issued_token() {
        let (service, fake) = service(
            FakeAuth {
                token: Some("jwt".into()),
                include_user: true,
                ..Default::default()
            },
            Some("svc"),
        );
        let session = service
            .login(&pairs(&[("email", "ada@example.com"), ("password", "pw")]))
            .await
            .expect("session");
        assert_eq!(session.credentials().token(), Some("jwt"));
        assert_eq!(session.user().role_name.as_deref(), Some("admin"));
        assert_eq!(*fake.calls.lock().expect("calls"), vec!["login ada@example.com"]);
        assert_eq!(service.sessions().len(), 1);
    }

    #[tokio::test]
    async fn missing_user_is_fetched_with_the_service_token() {
        let (service, fake) = service(FakeAuth::default(), Some("svc"));
        let session = service
            .login(&pairs(&[("email", "ada@example.com"), ("password", "pw")]))
            .await
            .expect("session");
        assert_eq!(session.credentials().token(), Some("svc"));
        assert_eq!(
            *fake.calls.lock().expect("calls"),
            vec!["login ada@example.com", "me svc"]
        );
    }

    #[tokio::test]
    async fn rejected_logins_surface_the_api_message() {
        let (service, _) = service(
            FakeAuth {
                reject_login: true,
                ..Default::default()
            },
            None,
        );
        let form = service
            .login(&pairs(&[("email", "ada@example.com"), ("password", "pw")]))
            .await
            .expect_err("rejected");
        assert_eq!(form.error.as_deref(), Some("Invalid credentials"));
        assert!(!form.values.contains("password"));
        assert!(service.sessions().is_empty());
    }

    #[tokio::test]
    async fn registration_checks_passwords_before_calling_the_api() {
        let (service, fake) = service(FakeAuth::default(), None);
        let form = service
            .register(&pairs(&[
                ("name", "Ada"),
                ("username", "ada"),
                ("email", "ada@example.com"),
                ("password", "secret1"),
                ("confirmPassword", "secret2"),
            ]))
            .await
            .expect_err("mismatch");
        assert_eq!(
            form.errors
                .get("confirmPassword")
                .map(FieldError::humanized)
                .as_deref(),
            Some(PASSWORD_MISMATCH_MESSAGE)
        );
        assert!(fake.calls.lock().expect("calls").is_empty());
    }

    #[tokio::test]
    async fn registration_signs_the_new_account_in() {
        let (service, fake) = service(
            FakeAuth {
                include_user: true,
                ..Default::default()
            },
            None,
        );
        service
            .register(&pairs(&[
                ("name", "Ada"),
                ("username", "ada"),
                ("email", "ada@example.com"),
                ("password", "secret1"),
                ("confirmPassword", "secret1"),
            ]))
            .await
            .expect("session");
        assert_eq!(
            *fake.calls.lock().expect("calls"),
            vec!["register ada", "login ada@example.com"]
        );
    }

    #[tokio::test]
    async fn logout_drops_the_session_even_when_upstream_fails() {
        let (service, _) = service(
            FakeAuth {
                include_user: true,
                ..Default::default()
            },
            None,
        );
        let session = service
            .login(&pairs(&[("email", "ada@example.com"), ("password", "pw")]))
            .await
            .expect("session");
        service.logout(&session).await;
        assert!(service.sessions().get(session.id()).is_none());
    }
}
