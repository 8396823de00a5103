//! Inventories of in-world objects.
//!
//! A task inventory request is answered with the name of a temporary asset
//! holding the object's contents in the bracketed text format; the
//! contents are then downloaded through [`AssetFetch`](strata_protocol::AssetFetch)
//! and parsed.

use std::time::Duration;

use strata_protocol::{decode_field, OutboundMessage};
use strata_sync::bridge;
use strata_types::{InventoryNode, ItemRecord};
use tracing::debug;
use uuid::Uuid;

use crate::decode::item_to_block;
use crate::error::{SdkError, SdkResult};
use crate::manager::{Callback, InventoryManager, OneShot};

impl InventoryManager {
    /// List the contents of object `object_id`, addressed in the region by
    /// `local_id`. An object with an empty inventory completes with no
    /// records.
    pub fn request_task_inventory(&self, object_id: Uuid, local_id: u32, on_complete: Callback<Vec<InventoryNode>>) {
        let Some(assets) = self.assets.clone() else {
            return on_complete(Err(SdkError::InvalidRequest(
                "task inventory needs an asset collaborator".into(),
            )));
        };

        let callback = OneShot::new(on_complete);
        let reply = callback.clone();
        let handle = self.task_replies.register(
            object_id,
            Box::new(move |result| {
                let filename = match result {
                    Ok(filename) => filename,
                    Err(err) => return reply.fire(Err(err.into())),
                };
                if filename.is_empty() {
                    debug!(object = %object_id, "task inventory is empty");
                    return reply.fire(Ok(Vec::new()));
                }
                debug!(object = %object_id, %filename, "downloading task inventory");
                assets.request_bytes(
                    &filename,
                    Box::new(move |bytes| {
                        let parsed = bytes
                            .map_err(SdkError::from)
                            .and_then(|data| Ok(strata_text::parse(&decode_field(&data))?));
                        reply.fire(parsed);
                    }),
                );
            }),
        );

        if let Err(err) = self.send(OutboundMessage::RequestTaskInventory { local_id }) {
            self.task_replies.cancel(handle);
            callback.fire(Err(err));
        }
    }

    /// Blocking form of [`request_task_inventory`](Self::request_task_inventory).
    /// `timeout` bounds the reply and the download together.
    pub fn get_task_inventory(&self, object_id: Uuid, local_id: u32, timeout: Duration) -> SdkResult<Vec<InventoryNode>> {
        let (completer, waiter) = bridge();
        self.request_task_inventory(
            object_id,
            local_id,
            Box::new(move |result| {
                completer.complete(result);
            }),
        );
        waiter.wait(timeout)?
    }

    /// Add or replace an item in an object's inventory. Returns the
    /// transaction id of the update.
    pub fn update_task_inventory(&self, local_id: u32, item: &ItemRecord) -> SdkResult<Uuid> {
        let transaction_id = Uuid::now_v7();
        self.send(OutboundMessage::UpdateTaskInventory {
            local_id,
            item: item_to_block(item, transaction_id),
        })?;
        Ok(transaction_id)
    }

    pub fn remove_task_inventory(&self, local_id: u32, item_id: Uuid) -> SdkResult<()> {
        self.send(OutboundMessage::RemoveTaskInventory { local_id, item_id })
    }

    /// Copy an item out of an object into the agent's folder `folder_id`.
    pub fn move_task_inventory(&self, local_id: u32, item_id: Uuid, folder_id: Uuid) -> SdkResult<()> {
        self.send(OutboundMessage::MoveTaskInventory {
            local_id,
            item_id,
            folder_id,
        })
    }
}
