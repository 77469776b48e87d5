use crate::error::SyncError;
use crate::store::UserStore;
use crate::types::{EventKind, UserEventData, WebhookEvent};

/// What a verified event did to the user store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Upserted { clerk_id: String, already_existed: bool },
    Ignored { event_type: String },
}

/// Apply a verified identity-provider event to the user store.
///
/// `user.created` and `user.updated` both end in the same upsert. Creation
/// first looks the user up so that a redundant create is visible in the
/// logs; the lookup never changes what gets written.
pub async fn sync_user_event(
    store: &dyn UserStore,
    event: &WebhookEvent,
) -> Result<SyncOutcome, SyncError> {
    let kind = event.kind();
    if kind == EventKind::Other {
        tracing::info!("Unhandled event type: {}", event.event_type);
        return Ok(SyncOutcome::Ignored {
            event_type: event.event_type.clone(),
        });
    }

    let data: UserEventData = serde_json::from_value(event.data.clone())?;

    let already_existed = match kind {
        EventKind::UserCreated => {
            let existing = store.find_user_by_external_id(&data.id).await?;
            if let Some(user) = &existing {
                tracing::info!("User already exists: {:?}", user);
            }
            existing.is_some()
        }
        _ => false,
    };

    upsert_from_event(store, &data).await?;

    Ok(SyncOutcome::Upserted {
        clerk_id: data.id,
        already_existed,
    })
}

async fn upsert_from_event(store: &dyn UserStore, data: &UserEventData) -> Result<(), SyncError> {
    tracing::info!("Syncing user: {}", data.id);
    store.upsert_user(data.to_upsert()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;

    fn event(event_type: &str, data: serde_json::Value) -> WebhookEvent {
        serde_json::from_value(serde_json::json!({ "type": event_type, "data": data })).unwrap()
    }

    fn user_data(id: &str, first: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "first_name": first,
            "last_name": "B",
            "image_url": "url1",
            "email_addresses": [{"email_address": "a@b.com"}]
        })
    }

    #[tokio::test]
    async fn test_created_for_new_user_upserts() {
        let store = MemoryUserStore::new();

        let outcome = sync_user_event(&store, &event("user.created", user_data("ext_1", "A")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Upserted { clerk_id: "ext_1".to_string(), already_existed: false }
        );
        assert_eq!(store.get("ext_1").unwrap().username, "A B");
    }

    #[tokio::test]
    async fn test_created_for_existing_user_still_updates() {
        let store = MemoryUserStore::new();
        sync_user_event(&store, &event("user.updated", user_data("ext_1", "A")))
            .await
            .unwrap();

        let outcome = sync_user_event(&store, &event("user.created", user_data("ext_1", "C")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Upserted { clerk_id: "ext_1".to_string(), already_existed: true }
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("ext_1").unwrap().username, "C B");
    }

    #[tokio::test]
    async fn test_unhandled_type_is_ignored() {
        let store = MemoryUserStore::new();

        let outcome = sync_user_event(
            &store,
            &event("organization.created", serde_json::json!({"id": "org_1"})),
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome::Ignored { event_type: "organization.created".to_string() }
        );
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_user_event_without_id_is_rejected() {
        let store = MemoryUserStore::new();

        let result = sync_user_event(&store, &event("user.updated", serde_json::json!({}))).await;

        assert!(matches!(result, Err(SyncError::InvalidUserData(_))));
        assert!(store.is_empty());
    }
}
