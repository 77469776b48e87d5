use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client as DynamoClient};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StoreError;
use crate::types::{UpsertUser, UserRecord};

/// Query and mutation capabilities the webhook handler needs from the user store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_external_id(&self, clerk_id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Create or update the record keyed by `user.clerk_id`. Last writer wins.
    async fn upsert_user(&self, user: UpsertUser) -> Result<(), StoreError>;
}

fn user_pk(clerk_id: &str) -> String {
    format!("USER#{}", clerk_id)
}

/// Users in a single DynamoDB table with PK=USER#clerk-id, SK=USER#clerk-id
pub struct DynamoUserStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoUserStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl UserStore for DynamoUserStore {
    async fn find_user_by_external_id(&self, clerk_id: &str) -> Result<Option<UserRecord>, StoreError> {
        let pk = user_pk(clerk_id);

        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk.clone()))
            .key("SK", AttributeValue::S(pk))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;

        let Some(item) = result.item() else {
            return Ok(None);
        };

        let attr = |name: &str| item.get(name).and_then(|v| v.as_s().ok()).map(|s| s.to_string());

        Ok(Some(UserRecord {
            clerk_id: attr("clerk_id")
                .ok_or_else(|| StoreError::MalformedItem(clerk_id.to_string(), "clerk_id"))?,
            username: attr("username").unwrap_or_default(),
            email: attr("email").unwrap_or_default(),
            image_url: attr("image_url").unwrap_or_default(),
        }))
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<(), StoreError> {
        let now = chrono::Utc::now().to_rfc3339();
        let pk = user_pk(&user.clerk_id);

        // UpdateItem creates the item when absent; created_at is only set once
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("PK", AttributeValue::S(pk.clone()))
            .key("SK", AttributeValue::S(pk))
            .update_expression(
                "SET clerk_id = :clerk_id, username = :username, email = :email, \
                 image_url = :image_url, entity_type = :entity_type, updated_at = :now, \
                 created_at = if_not_exists(created_at, :now)",
            )
            .expression_attribute_values(":clerk_id", AttributeValue::S(user.clerk_id.clone()))
            .expression_attribute_values(":username", AttributeValue::S(user.username))
            .expression_attribute_values(":email", AttributeValue::S(user.email))
            .expression_attribute_values(":image_url", AttributeValue::S(user.image_url))
            .expression_attribute_values(":entity_type", AttributeValue::S("user".to_string()))
            .expression_attribute_values(":now", AttributeValue::S(now))
            .send()
            .await
            .map_err(aws_sdk_dynamodb::Error::from)?;

        tracing::info!("User upserted: {}", user.clerk_id);
        Ok(())
    }
}

/// In-process store for local runs (`USER_STORE=memory`) and tests
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, clerk_id: &str) -> Option<UserRecord> {
        self.lock().get(clerk_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, UserRecord>> {
        self.users.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_user_by_external_id(&self, clerk_id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.get(clerk_id))
    }

    async fn upsert_user(&self, user: UpsertUser) -> Result<(), StoreError> {
        let record = UserRecord::from(user);
        self.lock().insert(record.clerk_id.clone(), record);
        Ok(())
    }
}
