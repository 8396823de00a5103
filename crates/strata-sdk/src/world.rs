//! Moving inventory into and out of the world, and offering it to others.

use strata_protocol::{encode_field, OutboundMessage, RezParams};
use strata_types::{AssetType, DeRezDestination, InventoryNode, InventorySortOrder, ItemRecord};
use tracing::debug;
use uuid::Uuid;

use crate::decode::item_to_block;
use crate::error::SdkResult;
use crate::manager::{FolderQuery, InventoryManager};

/// Bytes per offered object: asset type, then the id.
const OFFER_ENTRY_LEN: usize = 17;

fn push_offer_entry(bucket: &mut Vec<u8>, asset_type: AssetType, id: Uuid) {
    bucket.push(asset_type.code() as u8);
    bucket.extend_from_slice(id.as_bytes());
}

impl InventoryManager {
    /// Rez an inventory item into the world. Returns the query id the
    /// simulator echoes when it reports the new object.
    pub fn request_rez_from_inventory(&self, item: &ItemRecord, params: RezParams) -> SdkResult<Uuid> {
        let query_id = Uuid::now_v7();
        self.send(OutboundMessage::RezObject {
            params,
            item: item_to_block(item, query_id),
        })?;
        debug!(item = %item.id, query = %query_id, "rez requested");
        Ok(query_id)
    }

    pub fn request_derez_to_inventory(
        &self,
        local_id: u32,
        destination: DeRezDestination,
        destination_id: Uuid,
        transaction_id: Uuid,
    ) -> SdkResult<()> {
        self.send(OutboundMessage::DeRezObject {
            local_id,
            destination,
            destination_id,
            transaction_id,
        })
    }

    /// Take an object back into the agent's objects folder. Returns the
    /// transaction id of the request.
    pub fn derez_to_inventory(&self, local_id: u32) -> SdkResult<Uuid> {
        let transaction_id = Uuid::now_v7();
        self.request_derez_to_inventory(
            local_id,
            DeRezDestination::AgentInventoryTake,
            self.find_folder_for_type(AssetType::Object),
            transaction_id,
        )?;
        Ok(transaction_id)
    }

    pub fn give_item(&self, item_id: Uuid, name: &str, asset_type: AssetType, recipient: Uuid) -> SdkResult<()> {
        let mut bucket = Vec::with_capacity(OFFER_ENTRY_LEN);
        push_offer_entry(&mut bucket, asset_type, item_id);
        self.offer(recipient, name, bucket)
    }

    /// Offer a folder and the items directly inside it. Lists the folder
    /// first, blocking for up to the configured default timeout.
    pub fn give_folder(&self, folder_id: Uuid, name: &str, asset_type: AssetType, recipient: Uuid) -> SdkResult<()> {
        let contents = self.folder_contents(
            FolderQuery::new(folder_id, self.agent_id)
                .items_only()
                .sorted(InventorySortOrder::BY_DATE),
            self.config.default_timeout,
        )?;
        let items: Vec<&ItemRecord> = contents.iter().filter_map(InventoryNode::as_item).collect();

        let mut bucket = Vec::with_capacity(OFFER_ENTRY_LEN * (items.len() + 1));
        push_offer_entry(&mut bucket, asset_type, folder_id);
        for item in items {
            push_offer_entry(&mut bucket, item.asset_type, item.id);
        }
        self.offer(recipient, name, bucket)
    }

    fn offer(&self, recipient: Uuid, name: &str, bucket: Vec<u8>) -> SdkResult<()> {
        debug!(%recipient, name, entries = bucket.len() / OFFER_ENTRY_LEN, "offering inventory");
        self.send(OutboundMessage::InventoryOffer {
            recipient,
            session_id: Uuid::now_v7(),
            name: encode_field(name),
            bucket,
        })
    }
}
