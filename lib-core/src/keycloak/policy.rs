use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::users;
use crate::AppResult;

/// Keycloak `user` policy listing the members of a space
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeycloakPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub policy_type: String,
    #[serde(default)]
    pub logic: String,
    #[serde(default)]
    pub decision_strategy: String,
    #[serde(default)]
    pub config: PolicyConfig,

    /// Attributes this service does not interpret, sent back untouched on update
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
    /// Member list, see [`users`]
    #[serde(default, rename = "users")]
    pub user_ids: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl KeycloakPolicy {
    pub fn member_ids(&self) -> AppResult<Vec<Uuid>> {
        users::decode(&self.config.user_ids)
    }

    pub fn set_member_ids(&mut self, ids: &[Uuid]) {
        self.config.user_ids = users::encode(ids);
    }

    /// Returns `true` if the identity was not a member yet
    pub fn add_member(&mut self, identity_id: &Uuid) -> AppResult<bool> {
        let mut ids = self.member_ids()?;
        if ids.contains(identity_id) {
            return Ok(false);
        }
        ids.push(*identity_id);
        self.set_member_ids(&ids);
        Ok(true)
    }

    /// Returns `true` if the identity was a member
    pub fn remove_member(&mut self, identity_id: &Uuid) -> AppResult<bool> {
        let mut ids = self.member_ids()?;
        let before = ids.len();
        ids.retain(|id| id != identity_id);
        if ids.len() == before {
            return Ok(false);
        }
        self.set_member_ids(&ids);
        Ok(true)
    }
}

/// In-memory change applied to a fetched policy before it is written back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyUpdate {
    AddMember,
    RemoveMember,
}

impl PolicyUpdate {
    pub fn apply(self, policy: &mut KeycloakPolicy, identity_id: &Uuid) -> AppResult<bool> {
        match self {
            PolicyUpdate::AddMember => policy.add_member(identity_id),
            PolicyUpdate::RemoveMember => policy.remove_member(identity_id),
        }
    }
}

/// Protection API token paired with the policy snapshot it was fetched with
#[derive(Clone, PartialEq, Eq)]
pub struct ProtectionToken(String);

impl ProtectionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ProtectionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ProtectionToken(***)")
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn policy(users: &str) -> KeycloakPolicy {
        serde_json::from_value(json!({
            "id": "p-1",
            "name": "space-policy",
            "type": "user",
            "logic": "POSITIVE",
            "decisionStrategy": "UNANIMOUS",
            "config": { "users": users }
        }))
        .unwrap()
    }

    #[test]
    fn add_member_appends_once() {
        let id = Uuid::new_v4();
        let mut p = policy("[]");

        assert!(p.add_member(&id).unwrap());
        assert!(!p.add_member(&id).unwrap());
        assert_eq!(p.config.user_ids, format!("[\"{id}\"]"));
    }

    #[test]
    fn remove_member_reports_change() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut p = policy(&format!("[\"{a}\",\"{b}\"]"));

        assert!(p.remove_member(&a).unwrap());
        assert!(!p.remove_member(&a).unwrap());
        assert_eq!(p.member_ids().unwrap(), vec![b]);
    }

    #[test]
    fn mutators_fail_on_malformed_list() {
        let mut p = policy("[\"garbage\"]");
        assert!(PolicyUpdate::AddMember.apply(&mut p, &Uuid::new_v4()).is_err());
        assert_eq!(p.config.user_ids, "[\"garbage\"]");
    }

    #[test]
    fn unknown_attributes_survive_round_trip() {
        let raw = json!({
            "id": "p-1",
            "name": "space-policy",
            "type": "user",
            "logic": "POSITIVE",
            "decisionStrategy": "UNANIMOUS",
            "description": "members of the space",
            "config": { "users": "[]", "roles": "[]" }
        });
        let mut p: KeycloakPolicy = serde_json::from_value(raw).unwrap();
        p.add_member(&Uuid::new_v4()).unwrap();

        let out = serde_json::to_value(&p).unwrap();
        assert_eq!(out["description"], "members of the space");
        assert_eq!(out["config"]["roles"], "[]");
        assert_eq!(out["decisionStrategy"], "UNANIMOUS");
        assert_eq!(out["type"], "user");
    }

    #[test]
    fn token_debug_is_redacted() {
        let pat = ProtectionToken::new("secret");
        assert_eq!(format!("{pat:?}"), "ProtectionToken(***)");
    }
}
