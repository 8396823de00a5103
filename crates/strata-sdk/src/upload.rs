use bytes::Bytes;
use serde_json::{json, Value};
use strata_types::{AssetType, InventoryType};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{SdkError, SdkResult};
use crate::manager::InventoryManager;

fn field<'a>(response: &'a Value, key: &str) -> Option<&'a str> {
    response.get(key).and_then(Value::as_str)
}

impl InventoryManager {
    /// Create an inventory item backed by a newly uploaded asset.
    ///
    /// The upload capability answers the item description with either an
    /// `uploader` URL to post the asset bytes to, or directly with the new
    /// ids. Returns `(item id, asset id)`.
    pub async fn create_item_from_asset(
        &self,
        data: Bytes,
        name: &str,
        description: &str,
        asset_type: AssetType,
        inv_type: InventoryType,
        folder_id: Uuid,
    ) -> SdkResult<(Uuid, Uuid)> {
        let capability = &self.config.upload_capability;
        let caps = self
            .caps
            .as_ref()
            .ok_or_else(|| SdkError::MissingCapability(capability.clone()))?;
        let url = caps
            .capability(capability)
            .ok_or_else(|| SdkError::MissingCapability(capability.clone()))?;

        let query = json!({
            "folder_id": folder_id,
            "asset_type": asset_type.name(),
            "inventory_type": inv_type.name(),
            "name": name,
            "description": description,
        });
        let mut response = caps.post_json(&url, query).await?;
        let mut pending = Some(data);

        loop {
            let state = field(&response, "state").unwrap_or_default().to_string();
            match state.to_lowercase().as_str() {
                "upload" => {
                    let data = pending
                        .take()
                        .ok_or_else(|| SdkError::UploadFailed("server asked for a second upload".into()))?;
                    let uploader = field(&response, "uploader")
                        .ok_or_else(|| SdkError::UploadFailed("upload response has no uploader".into()))?
                        .to_string();
                    debug!(%uploader, bytes = data.len(), "uploading asset");
                    response = caps.post_bytes(&uploader, data).await?;
                }
                "complete" => {
                    let id = |key| field(&response, key).and_then(|s| Uuid::parse_str(s).ok());
                    return match (id("new_inventory_item"), id("new_asset")) {
                        (Some(item_id), Some(asset_id)) => {
                            info!(item = %item_id, asset = %asset_id, name, "item created from asset");
                            Ok((item_id, asset_id))
                        }
                        _ => Err(SdkError::UploadFailed("Failed to parse asset and item UUIDs".into())),
                    };
                }
                _ => return Err(SdkError::UploadFailed(state)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_protocol::{capabilities, CapsRequestBody, InMemoryTransport, ProtocolError};

    use super::*;
    use crate::testing::{agent, manager, Harness};

    const CAP_URL: &str = "https://sim.example/cap/new-file";

    #[tokio::test]
    async fn upload_then_complete() {
        let Harness { caps, manager, .. } = manager();
        caps.grant(capabilities::NEW_FILE_AGENT_INVENTORY, CAP_URL);
        caps.push_response(Ok(json!({"state": "upload", "uploader": "https://sim.example/up/1"})));
        caps.push_response(Ok(json!({
            "state": "Complete",
            "new_inventory_item": Uuid::from_u128(1).to_string(),
            "new_asset": Uuid::from_u128(2).to_string(),
        })));

        let ids = manager
            .create_item_from_asset(
                Bytes::from_static(b"texture bytes"),
                "Wood",
                "grain",
                AssetType::Texture,
                InventoryType::Texture,
                Uuid::from_u128(0xF),
            )
            .await
            .unwrap();
        assert_eq!(ids, (Uuid::from_u128(1), Uuid::from_u128(2)));

        let requests = caps.requests();
        assert_eq!(requests.len(), 2);
        match &requests[0] {
            (url, CapsRequestBody::Json(body)) => {
                assert_eq!(url, CAP_URL);
                assert_eq!(body["asset_type"], "texture");
                assert_eq!(body["inventory_type"], "texture");
                assert_eq!(body["folder_id"], Uuid::from_u128(0xF).to_string());
            }
            other => panic!("expected a json request, got {other:?}"),
        }
        assert_eq!(
            requests[1],
            (
                "https://sim.example/up/1".to_string(),
                CapsRequestBody::Bytes(Bytes::from_static(b"texture bytes"))
            )
        );
    }

    #[tokio::test]
    async fn failure_state_is_reported() {
        let Harness { caps, manager, .. } = manager();
        caps.grant(capabilities::NEW_FILE_AGENT_INVENTORY, CAP_URL);
        caps.push_response(Ok(json!({"state": "Insufficient Funds"})));
        let err = manager
            .create_item_from_asset(Bytes::new(), "x", "", AssetType::Sound, InventoryType::Sound, Uuid::nil())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::UploadFailed(state) if state == "Insufficient Funds"));
    }

    #[tokio::test]
    async fn second_upload_request_fails() {
        let Harness { caps, manager, .. } = manager();
        caps.grant(capabilities::NEW_FILE_AGENT_INVENTORY, CAP_URL);
        caps.push_response(Ok(json!({"state": "upload", "uploader": "https://sim.example/up/1"})));
        caps.push_response(Ok(json!({"state": "upload", "uploader": "https://sim.example/up/2"})));
        let err = manager
            .create_item_from_asset(Bytes::new(), "x", "", AssetType::Sound, InventoryType::Sound, Uuid::nil())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::UploadFailed(_)));
        assert_eq!(caps.requests().len(), 2);
    }

    #[tokio::test]
    async fn complete_without_ids_fails() {
        let Harness { caps, manager, .. } = manager();
        caps.grant(capabilities::NEW_FILE_AGENT_INVENTORY, CAP_URL);
        caps.push_response(Ok(json!({"state": "complete", "new_asset": "not-a-uuid"})));
        let err = manager
            .create_item_from_asset(Bytes::new(), "x", "", AssetType::Sound, InventoryType::Sound, Uuid::nil())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::UploadFailed(msg) if msg.contains("UUIDs")));
    }

    #[tokio::test]
    async fn http_errors_propagate() {
        let Harness { caps, manager, .. } = manager();
        caps.grant(capabilities::NEW_FILE_AGENT_INVENTORY, CAP_URL);
        caps.push_response(Err(ProtocolError::Http("503".into())));
        let err = manager
            .create_item_from_asset(Bytes::new(), "x", "", AssetType::Sound, InventoryType::Sound, Uuid::nil())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::Protocol(ProtocolError::Http(_))));
    }

    #[tokio::test]
    async fn missing_capability() {
        let Harness { manager, .. } = manager();
        let err = manager
            .create_item_from_asset(Bytes::new(), "x", "", AssetType::Sound, InventoryType::Sound, Uuid::nil())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::MissingCapability(name) if name == "NewFileAgentInventory"));

        let bare = InventoryManager::builder(agent(), InMemoryTransport::new()).build();
        let err = bare
            .create_item_from_asset(Bytes::new(), "x", "", AssetType::Sound, InventoryType::Sound, Uuid::nil())
            .await
            .unwrap_err();
        assert!(matches!(err, SdkError::MissingCapability(_)));
    }
}
