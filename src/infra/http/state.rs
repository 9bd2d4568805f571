use std::sync::Arc;

use crate::{
    application::{
        admin::{
            access::AccessService, auth::AuthService, chrome::AdminChromeService,
            dashboard::AdminDashboardService, posts::PostsService, profile::ProfileService,
            users::UsersService,
        },
        session::SessionStore,
    },
    config::{ApiSettings, SessionSettings, UploadSettings},
    infra::api::BlogApiClient,
};

/// Everything a console handler needs; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub session_cookie: Arc<str>,
    pub chrome: Arc<AdminChromeService>,
    pub dashboard: Arc<AdminDashboardService>,
    pub auth: Arc<AuthService>,
    pub access: Arc<AccessService>,
    pub users: Arc<UsersService>,
    pub posts: Arc<PostsService>,
    pub profile: Arc<ProfileService>,
    pub upload_limit_bytes: u64,
}

impl AppState {
    /// Wire every service to one API client.
    pub fn new(
        client: BlogApiClient,
        api: &ApiSettings,
        session: &SessionSettings,
        uploads: &UploadSettings,
    ) -> Self {
        let client = Arc::new(client);
        let sessions = Arc::new(SessionStore::new(session.idle_ttl));
        let upload_limit_bytes = uploads.max_request_bytes.get();
        let image_base = client.base_url().as_str().trim_end_matches('/').to_string();

        Self {
            sessions: sessions.clone(),
            session_cookie: Arc::from(session.cookie_name.as_str()),
            chrome: Arc::new(AdminChromeService::new()),
            dashboard: Arc::new(AdminDashboardService::new()),
            auth: Arc::new(AuthService::new(
                client.clone(),
                sessions,
                api.service_token.clone(),
            )),
            access: Arc::new(AccessService::new(client.clone(), client.clone())),
            users: Arc::new(UsersService::new(client.clone(), client.clone())),
            posts: Arc::new(PostsService::new(
                client.clone(),
                client.clone(),
                image_base,
                upload_limit_bytes,
            )),
            profile: Arc::new(ProfileService::new(client)),
            upload_limit_bytes,
        }
    }
}
