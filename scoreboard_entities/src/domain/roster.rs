use std::collections::HashMap;

use sea_orm::{prelude::*, sea_query::OnConflict, ActiveValue, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ScoreboardError;
use crate::schema;

use super::Group;

// Four bind variables per row, well below SQLite's variable limit.
const UPSERT_CHUNK_SIZE: usize = 500;

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RosterItem {
    pub id: String,
    pub name: String,
    pub group: Group,
    pub sub_event_id: Uuid,
}

impl RosterItem {
    fn from_model(model: schema::roster_item::Model) -> Result<Self, ScoreboardError> {
        Ok(RosterItem {
            id: model.id,
            name: model.name,
            group: model.group_type.parse()?,
            sub_event_id: model.sub_event_id,
        })
    }

    fn to_active_model(&self) -> schema::roster_item::ActiveModel {
        schema::roster_item::ActiveModel {
            id: ActiveValue::Set(self.id.clone()),
            sub_event_id: ActiveValue::Set(self.sub_event_id),
            name: ActiveValue::Set(self.name.clone()),
            group_type: ActiveValue::Set(self.group.as_str().to_string()),
        }
    }

    pub async fn get_all<C>(db: &C, sub_event_id: Option<Uuid>) -> Result<Vec<RosterItem>, ScoreboardError> where C: ConnectionTrait {
        let mut query = schema::roster_item::Entity::find().order_by_asc(schema::roster_item::Column::Id);
        if let Some(sub_event_id) = sub_event_id {
            query = query.filter(schema::roster_item::Column::SubEventId.eq(sub_event_id));
        }
        query.all(db).await?.into_iter().map(Self::from_model).collect()
    }

    /// Inserts or updates the items keyed by (id, sub_event_id). Large
    /// batches are written in chunks within one transaction.
    pub async fn upsert_many<C>(db: &C, items: &[RosterItem]) -> Result<(), ScoreboardError> where C: ConnectionTrait + TransactionTrait {
        if items.is_empty() {
            return Ok(());
        }

        let transaction = db.begin().await?;
        for chunk in items.chunks(UPSERT_CHUNK_SIZE) {
            schema::roster_item::Entity::insert_many(chunk.iter().map(RosterItem::to_active_model))
                .on_conflict(
                    OnConflict::columns([schema::roster_item::Column::Id, schema::roster_item::Column::SubEventId])
                        .update_columns([schema::roster_item::Column::Name, schema::roster_item::Column::GroupType])
                        .to_owned(),
                )
                .exec(&transaction)
                .await?;
        }
        transaction.commit().await?;

        debug!(count = items.len(), "Upserted roster items");
        Ok(())
    }
}

/// Participant id to authoritative roster item, for a single sub-event.
#[derive(Debug, Clone, Default)]
pub struct RosterIndex {
    items: HashMap<String, RosterItem>,
}

impl RosterIndex {
    pub fn get(&self, participant_id: &str) -> Option<&RosterItem> {
        self.items.get(participant_id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> FromIterator<&'a RosterItem> for RosterIndex {
    fn from_iter<T: IntoIterator<Item = &'a RosterItem>>(iter: T) -> Self {
        RosterIndex {
            items: iter.into_iter().map(|item| (item.id.clone(), item.clone())).collect(),
        }
    }
}

/// Client-side roster across all sub-events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RosterBook {
    items: Vec<RosterItem>,
}

impl RosterBook {
    pub fn new(items: Vec<RosterItem>) -> Self {
        let mut book = RosterBook::default();
        book.upsert_batch(items);
        book
    }

    pub fn items(&self) -> &[RosterItem] {
        &self.items
    }

    /// Later items in the batch win over earlier ones with the same key.
    pub fn upsert_batch(&mut self, items: Vec<RosterItem>) {
        for item in items {
            match self.items.iter_mut().find(|i| i.id == item.id && i.sub_event_id == item.sub_event_id) {
                Some(existing) => *existing = item,
                None => self.items.push(item),
            }
        }
    }

    pub fn for_sub_event(&self, sub_event_id: Uuid) -> Vec<RosterItem> {
        self.items.iter().filter(|i| i.sub_event_id == sub_event_id).cloned().collect()
    }

    pub fn index_for_sub_event(&self, sub_event_id: Uuid) -> RosterIndex {
        self.items.iter().filter(|i| i.sub_event_id == sub_event_id).collect()
    }

    pub fn lookup(&self, sub_event_id: Uuid, participant_id: &str) -> Option<&RosterItem> {
        self.items.iter().find(|i| i.sub_event_id == sub_event_id && i.id == participant_id)
    }

    pub fn remove_sub_event(&mut self, sub_event_id: Uuid) -> usize {
        let before = self.items.len();
        self.items.retain(|i| i.sub_event_id != sub_event_id);
        before - self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, name: &str, group: Group, sub_event: u128) -> RosterItem {
        RosterItem { id: id.into(), name: name.into(), group, sub_event_id: Uuid::from_u128(sub_event) }
    }

    #[test]
    fn test_upsert_batch_is_keyed_per_sub_event() {
        let mut book = RosterBook::new(vec![
            item("A001", "Alice", Group::Junior, 1),
            item("A001", "Alice", Group::Junior, 2),
        ]);
        book.upsert_batch(vec![item("A001", "Alicia", Group::Senior, 1), item("A002", "Bob", Group::Junior, 1)]);

        assert_eq!(book.items().len(), 3);
        assert_eq!(book.lookup(Uuid::from_u128(1), "A001").unwrap().name, "Alicia");
        assert_eq!(book.lookup(Uuid::from_u128(2), "A001").unwrap().name, "Alice");
    }

    #[test]
    fn test_index_only_contains_sub_event() {
        let book = RosterBook::new(vec![
            item("A001", "Alice", Group::Junior, 1),
            item("A002", "Bob", Group::Senior, 2),
        ]);
        let index = book.index_for_sub_event(Uuid::from_u128(1));
        assert_eq!(index.len(), 1);
        assert!(index.get("A002").is_none());
    }
}
