//! The signed-in user's identity and profile patches.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The user as returned by the authentication endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub preferences: Map<String, Value>,
    /// Fields this client does not model, kept so they round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Identity {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            preferences: Map::new(),
            extra: Map::new(),
        }
    }

    /// Parse a user payload, either bare or wrapped as `{"user": {...}}`.
    pub fn from_payload(body: &str) -> serde_json::Result<Self> {
        match serde_json::from_str::<UserEnvelope>(body)? {
            UserEnvelope::Wrapped { user } => Ok(user),
            UserEnvelope::Bare(user) => Ok(user),
        }
    }

    /// Apply a profile patch in place.
    ///
    /// Preferences merge shallowly: patch keys overwrite, `null` removes.
    pub fn merge(&mut self, patch: &IdentityPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        for (key, value) in &patch.preferences {
            if value.is_null() {
                self.preferences.remove(key);
            } else {
                self.preferences.insert(key.clone(), value.clone());
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UserEnvelope {
    Wrapped { user: Identity },
    Bare(Identity),
}

/// A partial profile update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub preferences: Map<String, Value>,
}

impl IdentityPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.preferences.is_empty()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ana() -> Identity {
        serde_json::from_value(json!({
            "name": "Ana Ruiz",
            "email": "ana@shop.test",
            "preferences": { "theme": "dark", "currency": "EUR" },
            "id": 7,
            "role": "owner"
        }))
        .unwrap()
    }

    #[test]
    fn unknown_fields_round_trip() {
        let identity = ana();
        assert_eq!(identity.extra.get("id"), Some(&json!(7)));
        assert_eq!(identity.extra.get("role"), Some(&json!("owner")));

        let value = serde_json::to_value(&identity).unwrap();
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["preferences"]["theme"], json!("dark"));
    }

    #[test]
    fn missing_or_null_preferences_are_empty() {
        let identity: Identity =
            serde_json::from_value(json!({ "email": "a@b.test", "preferences": null })).unwrap();
        assert!(identity.preferences.is_empty());
        assert_eq!(identity.name, "");

        let identity: Identity = serde_json::from_value(json!({ "email": "a@b.test" })).unwrap();
        assert!(identity.preferences.is_empty());
    }

    #[test]
    fn merge_overwrites_and_removes() {
        let mut identity = ana();
        let patch: IdentityPatch = serde_json::from_value(json!({
            "name": "Ana R.",
            "preferences": { "theme": "light", "currency": null, "lang": "es" }
        }))
        .unwrap();

        identity.merge(&patch);

        assert_eq!(identity.name, "Ana R.");
        assert_eq!(identity.email, "ana@shop.test");
        assert_eq!(identity.preferences.get("theme"), Some(&json!("light")));
        assert_eq!(identity.preferences.get("lang"), Some(&json!("es")));
        assert!(!identity.preferences.contains_key("currency"));
        assert_eq!(identity.extra.get("id"), Some(&json!(7)));
    }

    #[test]
    fn payload_may_be_wrapped_or_bare() {
        let wrapped = Identity::from_payload(r#"{"user":{"email":"a@b.test"}}"#).unwrap();
        assert_eq!(wrapped.email, "a@b.test");

        let bare = Identity::from_payload(r#"{"name":"Bo","email":"bo@b.test"}"#).unwrap();
        assert_eq!(bare.name, "Bo");
        assert!(bare.extra.is_empty());

        assert!(Identity::from_payload(r#"{"name":"no email"}"#).is_err());
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let patch = IdentityPatch::default();
        assert!(patch.is_empty());
        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({}));
    }
}
