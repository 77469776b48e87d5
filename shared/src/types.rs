use serde::{Deserialize, Serialize};

// ========== USER ==========
/// User record kept in sync with the identity provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub clerk_id: String,
    pub username: String,
    pub email: String,
    pub image_url: String,
}

/// Fields written by a create-or-update, keyed by `clerk_id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertUser {
    pub clerk_id: String,
    pub username: String,
    pub email: String,
    pub image_url: String,
}

impl From<UpsertUser> for UserRecord {
    fn from(req: UpsertUser) -> Self {
        UserRecord {
            clerk_id: req.clerk_id,
            username: req.username,
            email: req.email,
            image_url: req.image_url,
        }
    }
}

// ========== WEBHOOK EVENT ==========
/// Verified webhook envelope. `data` stays untyped until the tag is known.
#[derive(Debug, Deserialize, Clone)]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    UserCreated,
    UserUpdated,
    Other,
}

impl WebhookEvent {
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            "user.created" => EventKind::UserCreated,
            "user.updated" => EventKind::UserUpdated,
            _ => EventKind::Other,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailAddress {
    pub email_address: String,
}

/// `data` of `user.created` / `user.updated`
#[derive(Debug, Deserialize, Clone)]
pub struct UserEventData {
    pub id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl UserEventData {
    /// First and last name joined by a space, skipping missing parts
    pub fn username(&self) -> String {
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// First address in the list
    pub fn email(&self) -> Option<&str> {
        self.email_addresses
            .first()
            .map(|addr| addr.email_address.as_str())
    }

    pub fn to_upsert(&self) -> UpsertUser {
        let email = match self.email() {
            Some(email) => email.to_string(),
            None => {
                tracing::warn!("User {} has no email address", self.id);
                String::new()
            }
        };

        UpsertUser {
            clerk_id: self.id.clone(),
            username: self.username(),
            email,
            image_url: self.image_url.clone().unwrap_or_default(),
        }
    }
}
