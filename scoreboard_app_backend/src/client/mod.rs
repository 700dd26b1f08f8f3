use async_trait::async_trait;
use scoreboard_entities::{
    domain::referee::NewReferee,
    prelude::*,
};
use scoreboard_server::auth::SessionUser;
use sea_orm::prelude::Uuid;

use crate::error::ClientError;

mod local;
mod rest;

pub use local::LocalStore;
pub use rest::RestStore;

/// The operations a scoring client needs from wherever the competition
/// data lives. Implementations keep their own credentials after `login`.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<SessionUser, ClientError>;
    async fn logout(&self) -> Result<(), ClientError>;
    async fn change_admin_password(&self, password: &str) -> Result<(), ClientError>;

    async fn get_info(&self) -> Result<CompetitionInfo, ClientError>;
    async fn update_info(&self, info: &CompetitionInfo) -> Result<(), ClientError>;

    async fn get_sub_events(&self) -> Result<Vec<SubEvent>, ClientError>;
    async fn create_sub_event(&self, name: &str) -> Result<SubEvent, ClientError>;
    async fn rename_sub_event(&self, id: Uuid, name: &str) -> Result<SubEvent, ClientError>;
    async fn delete_sub_event(&self, id: Uuid) -> Result<(), ClientError>;

    async fn get_referees(&self) -> Result<Vec<Referee>, ClientError>;
    async fn create_referee(&self, referee: &NewReferee) -> Result<Referee, ClientError>;
    async fn delete_referee(&self, id: Uuid) -> Result<(), ClientError>;

    async fn get_entries(&self, sub_event_id: Option<Uuid>) -> Result<Vec<Entry>, ClientError>;
    /// Upserts by composite key under the entry's own id.
    async fn create_entry(&self, entry: &Entry) -> Result<Entry, ClientError>;
    async fn update_entry(&self, id: Uuid, draft: &EntryDraft) -> Result<Entry, ClientError>;
    async fn delete_entry(&self, id: Uuid) -> Result<(), ClientError>;

    async fn get_roster(&self, sub_event_id: Option<Uuid>) -> Result<Vec<RosterItem>, ClientError>;
    async fn upload_roster(&self, items: &[RosterItem]) -> Result<(), ClientError>;
}
