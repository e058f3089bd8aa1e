pub fn get_host_addr() -> String {
    let port = std::env::var("PORT").unwrap_or("8080".into());
    format!("[::]:{port}")
}

#[derive(Default)]
pub struct DbConfig {
    pub url: String,
    pub username: String,
    pub password: String,
}
impl DbConfig {
    pub fn new() -> Self {
        Self {
            url: std::env::var("DATABASE_URL").unwrap_or_default(),
            username: std::env::var("DATABASE_USERNAME").unwrap_or_default(),
            password: std::env::var("DATABASE_PASSWORD").unwrap_or_default(),
        }
    }
}

/// Keycloak realm and resource-server client settings
#[derive(Debug, Clone, Default)]
pub struct KeycloakConfig {
    /// Base URL without trailing slash, e.g. `https://sso.example.com`
    pub url: String,
    pub realm: String,

    /// Public client id, used for the entitlement endpoint
    pub client_id: String,

    /// Internal id of the resource-server client, used in the authz admin API
    pub client_uuid: String,
    pub client_secret: String,

    /// Realm RS256 public key in PEM form
    pub public_key: String,
    pub audience: String,
}

impl KeycloakConfig {
    pub fn new() -> Self {
        Self {
            url: std::env::var("KEYCLOAK_URL").unwrap_or_default().trim_end_matches('/').to_owned(),
            realm: std::env::var("KEYCLOAK_REALM").unwrap_or(String::from("fabric8")),
            client_id: std::env::var("KEYCLOAK_CLIENT_ID").unwrap_or_default(),
            client_uuid: std::env::var("KEYCLOAK_CLIENT_UUID").unwrap_or_default(),
            client_secret: std::env::var("KEYCLOAK_CLIENT_SECRET").unwrap_or_default(),
            public_key: std::env::var("KEYCLOAK_PUBLIC_KEY").unwrap_or_default(),
            audience: std::env::var("KEYCLOAK_AUDIENCE").unwrap_or_default(),
        }
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/auth/realms/{}/protocol/openid-connect/token", self.url, self.realm)
    }

    pub fn entitlement_endpoint(&self) -> String {
        format!("{}/auth/realms/{}/authz/entitlement/{}", self.url, self.realm, self.client_id)
    }

    pub fn policy_endpoint(&self, policy_id: &str) -> String {
        format!(
            "{}/auth/admin/realms/{}/clients/{}/authz/resource-server/policy/{}",
            self.url, self.realm, self.client_uuid, policy_id
        )
    }
}
