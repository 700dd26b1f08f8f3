use chrono::NaiveDateTime;
use sea_orm::{prelude::*, sea_query::OnConflict, ActiveValue, QueryOrder, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NotFoundError, ScoreboardError, ValidationError};
use crate::schema;

use super::{Group, Round};

/// A single scored attempt of a participant in one round of a sub-event.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub participant_id: String,
    pub participant_name: String,
    pub group: Group,
    pub round: Round,
    pub score: f64,
    pub time: f64,
    pub timestamp: NaiveDateTime,
    pub sub_event_id: Uuid,
}

/// The user-editable part of an entry, as typed into the score form.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EntryDraft {
    pub participant_id: String,
    #[serde(default)]
    pub participant_name: String,
    #[serde(default)]
    pub group: Group,
    pub round: Round,
    pub score: f64,
    pub time: f64,
}

impl EntryDraft {
    /// Returns the normalized draft: trimmed id, name defaulting to the id.
    pub fn validate(&self) -> Result<EntryDraft, ValidationError> {
        let participant_id = self.participant_id.trim();
        if participant_id.is_empty() {
            return Err(ValidationError::new("participantId", "Participant id must not be empty"));
        }
        if !self.score.is_finite() || self.score < 0.0 {
            return Err(ValidationError::new("score", "Score must be a number of at least 0"));
        }
        if !self.time.is_finite() || self.time <= 0.0 {
            return Err(ValidationError::new("time", "Time must be a positive number of seconds"));
        }

        let participant_name = match self.participant_name.trim() {
            "" => participant_id.to_string(),
            name => name.to_string(),
        };

        Ok(EntryDraft {
            participant_id: participant_id.to_string(),
            participant_name,
            group: self.group,
            round: self.round,
            score: self.score,
            time: self.time,
        })
    }

    pub fn into_entry(self, sub_event_id: Uuid) -> Result<Entry, ValidationError> {
        let draft = self.validate()?;
        Ok(Entry {
            id: Uuid::new_v4(),
            participant_id: draft.participant_id,
            participant_name: draft.participant_name,
            group: draft.group,
            round: draft.round,
            score: draft.score,
            time: draft.time,
            timestamp: chrono::Utc::now().naive_utc(),
            sub_event_id,
        })
    }
}

impl Entry {
    pub fn draft(&self) -> EntryDraft {
        EntryDraft {
            participant_id: self.participant_id.clone(),
            participant_name: self.participant_name.clone(),
            group: self.group,
            round: self.round,
            score: self.score,
            time: self.time,
        }
    }

    /// Runs the draft validation over an entry received from elsewhere,
    /// keeping its id, timestamp and sub-event.
    pub fn validated(self) -> Result<Entry, ValidationError> {
        let draft = self.draft().validate()?;
        Ok(self.with_draft(draft))
    }

    pub fn with_draft(self, draft: EntryDraft) -> Entry {
        Entry {
            participant_id: draft.participant_id,
            participant_name: draft.participant_name,
            group: draft.group,
            round: draft.round,
            score: draft.score,
            time: draft.time,
            ..self
        }
    }

    pub fn collides_with(&self, other: &Entry) -> bool {
        self.id != other.id
            && self.sub_event_id == other.sub_event_id
            && self.participant_id == other.participant_id
            && self.round == other.round
    }

    /// An entry id stays with the sub-event it was first stored in.
    pub fn check_same_sub_event(&self, stored_sub_event_id: Uuid) -> Result<(), ValidationError> {
        if stored_sub_event_id != self.sub_event_id {
            return Err(ValidationError::new("subEventId", "Entry belongs to a different sub-event"));
        }
        Ok(())
    }

    fn from_model(model: schema::entry::Model) -> Result<Self, ScoreboardError> {
        Ok(Entry {
            id: model.uuid,
            participant_id: model.participant_id,
            participant_name: model.participant_name,
            group: model.group_type.parse()?,
            round: Round::try_from(model.round)?,
            score: model.score,
            time: model.time,
            timestamp: model.timestamp,
            sub_event_id: model.sub_event_id,
        })
    }

    fn to_active_model(&self) -> schema::entry::ActiveModel {
        schema::entry::ActiveModel {
            uuid: ActiveValue::Set(self.id),
            participant_id: ActiveValue::Set(self.participant_id.clone()),
            participant_name: ActiveValue::Set(self.participant_name.clone()),
            group_type: ActiveValue::Set(self.group.as_str().to_string()),
            round: ActiveValue::Set(self.round.number()),
            score: ActiveValue::Set(self.score),
            time: ActiveValue::Set(self.time),
            timestamp: ActiveValue::Set(self.timestamp),
            sub_event_id: ActiveValue::Set(self.sub_event_id),
        }
    }

    pub async fn get_all<C>(db: &C, sub_event_id: Option<Uuid>) -> Result<Vec<Entry>, ScoreboardError> where C: ConnectionTrait {
        let mut query = schema::entry::Entity::find().order_by_asc(schema::entry::Column::Timestamp);
        if let Some(sub_event_id) = sub_event_id {
            query = query.filter(schema::entry::Column::SubEventId.eq(sub_event_id));
        }
        let rows = query.all(db).await?;
        rows.into_iter().map(Self::from_model).collect()
    }

    pub async fn get<C>(db: &C, id: Uuid) -> Result<Entry, ScoreboardError> where C: ConnectionTrait {
        let row = schema::entry::Entity::find_by_id(id).one(db).await?;
        match row {
            Some(row) => Self::from_model(row),
            None => Err(NotFoundError::new("Entry", id).into()),
        }
    }

    async fn delete_collisions<C>(&self, db: &C) -> Result<u64, DbErr> where C: ConnectionTrait {
        let result = schema::entry::Entity::delete_many()
            .filter(schema::entry::Column::SubEventId.eq(self.sub_event_id))
            .filter(schema::entry::Column::ParticipantId.eq(self.participant_id.clone()))
            .filter(schema::entry::Column::Round.eq(self.round.number()))
            .filter(schema::entry::Column::Uuid.ne(self.id))
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Inserts the entry, replacing every stored entry with the same
    /// participant, round and sub-event. Reusing the id of an entry stored
    /// in another sub-event is a validation error.
    pub async fn upsert<C>(&self, db: &C) -> Result<(), ScoreboardError> where C: ConnectionTrait + TransactionTrait {
        let sub_event = schema::sub_event::Entity::find_by_id(self.sub_event_id).one(db).await?;
        if sub_event.is_none() {
            return Err(NotFoundError::new("SubEvent", self.sub_event_id).into());
        }

        let transaction = db.begin().await?;
        if let Some(stored) = schema::entry::Entity::find_by_id(self.id).one(&transaction).await? {
            self.check_same_sub_event(stored.sub_event_id)?;
        }
        let removed = self.delete_collisions(&transaction).await?;
        schema::entry::Entity::insert(self.to_active_model())
            .on_conflict(
                OnConflict::column(schema::entry::Column::Uuid)
                    .update_columns([
                        schema::entry::Column::ParticipantId,
                        schema::entry::Column::ParticipantName,
                        schema::entry::Column::GroupType,
                        schema::entry::Column::Round,
                        schema::entry::Column::Score,
                        schema::entry::Column::Time,
                        schema::entry::Column::Timestamp,
                    ])
                    .to_owned(),
            )
            .exec(&transaction)
            .await?;
        transaction.commit().await?;

        debug!(entry = %self.id, participant = %self.participant_id, round = %self.round, removed, "Upserted entry");
        Ok(())
    }

    /// Overwrites the editable fields of the stored entry with the given id.
    /// The stored timestamp and sub-event are kept.
    pub async fn replace<C>(db: &C, id: Uuid, draft: &EntryDraft) -> Result<Entry, ScoreboardError> where C: ConnectionTrait + TransactionTrait {
        let draft = draft.validate()?;

        let transaction = db.begin().await?;
        let existing = match schema::entry::Entity::find_by_id(id).one(&transaction).await? {
            Some(row) => Self::from_model(row)?,
            None => return Err(NotFoundError::new("Entry", id).into()),
        };
        let updated = existing.with_draft(draft);
        updated.to_active_model().update(&transaction).await?;
        let removed = updated.delete_collisions(&transaction).await?;
        transaction.commit().await?;

        debug!(entry = %id, removed, "Replaced entry");
        Ok(updated)
    }

    pub async fn delete<C>(db: &C, id: Uuid) -> Result<(), ScoreboardError> where C: ConnectionTrait {
        let result = schema::entry::Entity::delete_by_id(id).exec(db).await?;
        if result.rows_affected == 0 {
            return Err(NotFoundError::new("Entry", id).into());
        }
        Ok(())
    }
}

/// In-memory entry store with the same replace-on-insert semantics as the
/// `entry` table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryBook {
    entries: Vec<Entry>,
}

impl EntryBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Discards the current content and loads `entries` in order.
    pub fn set_entries(&mut self, entries: Vec<Entry>) {
        self.entries.clear();
        for entry in entries {
            self.upsert(entry);
        }
    }

    /// Stores `entry`, returning the entries it displaced.
    pub fn upsert(&mut self, entry: Entry) -> Vec<Entry> {
        let (displaced, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.id == entry.id || e.collides_with(&entry));
        self.entries = kept;
        self.entries.push(entry);
        displaced
    }

    /// Overwrites the entry with the same id in place and drops any other
    /// entry sharing its composite key.
    pub fn replace(&mut self, entry: Entry) -> Result<Vec<Entry>, NotFoundError> {
        let position = self.entries.iter().position(|e| e.id == entry.id)
            .ok_or_else(|| NotFoundError::new("Entry", entry.id))?;
        self.entries[position] = entry.clone();

        let (displaced, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.collides_with(&entry));
        self.entries = kept;
        Ok(displaced)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Entry, NotFoundError> {
        let position = self.entries.iter().position(|e| e.id == id)
            .ok_or_else(|| NotFoundError::new("Entry", id))?;
        Ok(self.entries.remove(position))
    }

    pub fn for_sub_event(&self, sub_event_id: Uuid) -> Vec<Entry> {
        self.entries.iter().filter(|e| e.sub_event_id == sub_event_id).cloned().collect()
    }

    /// Most recent first.
    pub fn recent_for_sub_event(&self, sub_event_id: Uuid, limit: usize) -> Vec<&Entry> {
        let mut entries = self.entries.iter().enumerate()
            .filter(|(_, e)| e.sub_event_id == sub_event_id)
            .collect::<Vec<_>>();
        entries.sort_by(|(ia, a), (ib, b)| b.timestamp.cmp(&a.timestamp).then(ib.cmp(ia)));
        entries.into_iter().take(limit).map(|(_, e)| e).collect()
    }

    pub fn remove_sub_event(&mut self, sub_event_id: Uuid) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.sub_event_id != sub_event_id);
        before - self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::*;

    fn draft(participant_id: &str, round: Round, score: f64, time: f64) -> EntryDraft {
        EntryDraft {
            participant_id: participant_id.to_string(),
            participant_name: "".to_string(),
            group: Group::Junior,
            round,
            score,
            time,
        }
    }

    fn entry(id: u128, participant_id: &str, round: Round, score: f64) -> Entry {
        Entry {
            id: Uuid::from_u128(id),
            participant_id: participant_id.to_string(),
            participant_name: participant_id.to_string(),
            group: Group::Junior,
            round,
            score,
            time: 30.0,
            timestamp: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap().and_hms_opt(9, 0, id as u32).unwrap(),
            sub_event_id: Uuid::from_u128(1),
        }
    }

    #[test]
    fn test_draft_trims_id_and_defaults_name() {
        let draft = draft("  A001 ", Round::First, 8.0, 30.0).validate().unwrap();
        assert_eq!(draft.participant_id, "A001");
        assert_eq!(draft.participant_name, "A001");
    }

    #[test]
    fn test_draft_rejects_bad_values() {
        assert_matches!(draft("   ", Round::First, 8.0, 30.0).validate(), Err(ValidationError { field, .. }) if field == "participantId");
        assert_matches!(draft("A001", Round::First, -1.0, 30.0).validate(), Err(ValidationError { field, .. }) if field == "score");
        assert_matches!(draft("A001", Round::First, f64::NAN, 30.0).validate(), Err(ValidationError { field, .. }) if field == "score");
        assert_matches!(draft("A001", Round::First, 8.0, 0.0).validate(), Err(ValidationError { field, .. }) if field == "time");
        assert!(draft("A001", Round::First, 0.0, 0.1).validate().is_ok());
    }

    #[test]
    fn test_into_entry_assigns_sub_event() {
        let entry = draft("A001", Round::Second, 8.0, 30.0).into_entry(Uuid::from_u128(7)).unwrap();
        assert_eq!(entry.sub_event_id, Uuid::from_u128(7));
        assert_eq!(entry.round, Round::Second);
    }

    #[test]
    fn test_upsert_replaces_same_composite_key() {
        let mut book = EntryBook::new();
        book.upsert(entry(1, "A001", Round::First, 8.0));
        book.upsert(entry(2, "A001", Round::Second, 7.0));
        let displaced = book.upsert(entry(3, "A001", Round::First, 9.0));

        assert_eq!(displaced.len(), 1);
        assert_eq!(displaced[0].id, Uuid::from_u128(1));
        assert_eq!(book.len(), 2);
        assert_eq!(book.get(Uuid::from_u128(3)).unwrap().score, 9.0);
    }

    #[test]
    fn test_replace_drops_collisions() {
        let mut book = EntryBook::new();
        book.upsert(entry(1, "A001", Round::First, 8.0));
        book.upsert(entry(2, "A001", Round::Second, 7.0));

        let mut moved = entry(2, "A001", Round::First, 7.5);
        moved.timestamp = book.get(Uuid::from_u128(2)).unwrap().timestamp;
        let displaced = book.replace(moved).unwrap();

        assert_eq!(displaced.iter().map(|e| e.id).collect::<Vec<_>>(), vec![Uuid::from_u128(1)]);
        assert_eq!(book.len(), 1);
        assert_eq!(book.entries()[0].round, Round::First);
    }

    #[test]
    fn test_replace_and_remove_unknown_ids() {
        let mut book = EntryBook::new();
        assert!(book.replace(entry(1, "A001", Round::First, 8.0)).is_err());
        assert_matches!(book.remove(Uuid::from_u128(9)), Err(NotFoundError { kind: "Entry", .. }));
    }

    #[test]
    fn test_remove_sub_event_only_touches_that_event() {
        let mut book = EntryBook::new();
        book.upsert(entry(1, "A001", Round::First, 8.0));
        let mut other = entry(2, "A001", Round::First, 8.0);
        other.sub_event_id = Uuid::from_u128(2);
        book.upsert(other);

        assert_eq!(book.remove_sub_event(Uuid::from_u128(1)), 1);
        assert_eq!(book.for_sub_event(Uuid::from_u128(2)).len(), 1);
        assert!(book.for_sub_event(Uuid::from_u128(1)).is_empty());
    }

    #[test]
    fn test_recent_entries_are_newest_first() {
        let mut book = EntryBook::new();
        book.upsert(entry(1, "A001", Round::First, 8.0));
        book.upsert(entry(5, "A002", Round::First, 8.0));
        book.upsert(entry(3, "A003", Round::First, 8.0));

        let recent = book.recent_for_sub_event(Uuid::from_u128(1), 2);
        assert_eq!(recent.iter().map(|e| e.participant_id.as_str()).collect::<Vec<_>>(), vec!["A002", "A003"]);
    }
}
