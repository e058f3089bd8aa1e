pub mod auth;

pub const AUTHORIZATION_HEADER: &str = "Authorization";
