//! Codec for the `config.users` value of a Keycloak user policy.
//!
//! Keycloak stores the member list as a single string shaped like
//! `["<uuid>","<uuid>"]` rather than a JSON array.

use uuid::Uuid;

use crate::{AppResult, ErrType};

const TRIM: &[char] = &['[', ']', '"'];

/// Decode a member list.
///
/// Every comma separated token is stripped of `[`, `]` and `"` and must
/// parse as a UUID; a single bad token fails the whole list. A value that
/// is empty once brackets and quotes are removed is an empty list.
pub fn decode(users: &str) -> AppResult<Vec<Uuid>> {
    if users.trim().trim_matches(TRIM).trim().is_empty() {
        return Ok(Vec::new());
    }

    users
        .split(',')
        .map(|token| {
            let id = token.trim().trim_matches(TRIM);
            Uuid::parse_str(id)
                .map_err(|err| ErrType::ServerError.err(err, format!("Invalid identity id in policy users: {id}")))
        })
        .collect()
}

/// Encode a member list in the Keycloak wire form
pub fn encode(ids: &[Uuid]) -> String {
    let joined = ids.iter().map(|id| format!("\"{id}\"")).collect::<Vec<_>>().join(",");
    format!("[{joined}]")
}
