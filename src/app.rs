use std::sync::Arc;

use lib_core::{config::KeycloakConfig, token::KeycloakAuth, AppResult, ErrorContext};
use lib_domain::service::Service;

pub struct App {
    auth: KeycloakAuth,
    service: Service,
}

pub type AppState = Arc<App>;

impl App {
    pub async fn new() -> AppResult<AppState> {
        let app = App {
            auth: KeycloakAuth::new(&KeycloakConfig::new()).context("app:auth")?,
            service: Service::new().await.context("app:service")?,
        };
        Ok(Arc::new(app))
    }

    pub fn auth(&self) -> &KeycloakAuth {
        &self.auth
    }

    pub fn service(&self) -> &Service {
        &self.service
    }
}
