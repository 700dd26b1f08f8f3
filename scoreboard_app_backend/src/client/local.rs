use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use scoreboard_entities::{
    domain::referee::{NewReferee, ADMIN_USERNAME},
    mock::MockCompetition,
    prelude::*,
};
use scoreboard_server::auth::{hash_password, verify_password, Role, SessionUser};
use sea_orm::prelude::Uuid;
use tokio::sync::Mutex;
use tracing::debug;

use super::RemoteStore;
use crate::error::ClientError;

#[derive(Debug, Default)]
struct LocalData {
    info: CompetitionInfo,
    admin_password_hash: String,
    sub_events: Vec<SubEvent>,
    referees: Vec<(Referee, String)>,
    entries: EntryBook,
    roster: RosterBook,
    user: Option<SessionUser>,
}

impl LocalData {
    fn require_user(&self) -> Result<&SessionUser, ClientError> {
        self.user.as_ref().ok_or_else(|| ClientError::Unauthorized("Not logged in".into()))
    }

    fn require_admin(&self) -> Result<(), ClientError> {
        match self.require_user()?.role {
            Role::Admin => Ok(()),
            Role::Referee => Err(ClientError::Unauthorized("Only the administrator may do this".into())),
        }
    }

    fn check_can_write_sub_event(&self, sub_event_id: Uuid) -> Result<(), ClientError> {
        let user = self.require_user()?;
        match (user.role, user.assigned_event_id) {
            (Role::Admin, _) => Ok(()),
            (Role::Referee, Some(assigned)) if assigned == sub_event_id => Ok(()),
            (Role::Referee, _) => Err(ClientError::Unauthorized("You are not assigned to this sub-event".into())),
        }
    }

    fn require_sub_event(&self, id: Uuid) -> Result<&SubEvent, ClientError> {
        self.sub_events.iter().find(|s| s.id == id)
            .ok_or_else(|| NotFoundError::new("SubEvent", id).into())
    }
}

/// In-memory `RemoteStore` with the server's rules: composite-key upserts,
/// cascading sub-event deletes and role checks.
#[derive(Debug)]
pub struct LocalStore {
    data: Mutex<LocalData>,
    fail_writes: AtomicBool,
}

impl LocalStore {
    pub fn new(admin_password: &str) -> Result<Self, ClientError> {
        let admin_password_hash = hash_password(admin_password).map_err(|e| ClientError::RemoteIO(e.to_string()))?;
        Ok(LocalStore {
            data: Mutex::new(LocalData { admin_password_hash, ..Default::default() }),
            fail_writes: AtomicBool::new(false),
        })
    }

    pub fn from_mock(mock: MockCompetition, admin_password: &str) -> Result<Self, ClientError> {
        let mut store = Self::new(admin_password)?;
        let data = store.data.get_mut();
        data.sub_events.push(mock.sub_event);
        data.roster.upsert_batch(mock.roster);
        data.entries.set_entries(mock.entries);
        Ok(store)
    }

    /// While set, every mutating call fails with `RemoteIO` and leaves the
    /// data untouched.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), ClientError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClientError::RemoteIO("Store is not accepting writes".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    async fn login(&self, username: &str, password: &str) -> Result<SessionUser, ClientError> {
        let mut data = self.data.lock().await;
        let invalid = || ClientError::Unauthorized("Invalid credentials".into());

        let user = if username == ADMIN_USERNAME {
            if !verify_password(&data.admin_password_hash, password) {
                return Err(invalid());
            }
            SessionUser { role: Role::Admin, username: ADMIN_USERNAME.to_string(), assigned_event_id: None }
        } else {
            let (referee, hash) = data.referees.iter()
                .find(|(r, _)| r.username == username.trim())
                .ok_or_else(invalid)?;
            if !verify_password(hash, password) {
                return Err(invalid());
            }
            SessionUser { role: Role::Referee, username: referee.username.clone(), assigned_event_id: Some(referee.sub_event_id) }
        };

        data.user = Some(user.clone());
        Ok(user)
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.data.lock().await.user = None;
        Ok(())
    }

    async fn change_admin_password(&self, password: &str) -> Result<(), ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        data.require_admin()?;
        if password.is_empty() {
            return Err(ValidationError::new("password", "Password must not be empty").into());
        }
        data.admin_password_hash = hash_password(password).map_err(|e| ClientError::RemoteIO(e.to_string()))?;
        Ok(())
    }

    async fn get_info(&self) -> Result<CompetitionInfo, ClientError> {
        Ok(self.data.lock().await.info.clone())
    }

    async fn update_info(&self, info: &CompetitionInfo) -> Result<(), ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        data.require_admin()?;
        info.validate()?;
        data.info = info.clone();
        Ok(())
    }

    async fn get_sub_events(&self) -> Result<Vec<SubEvent>, ClientError> {
        let mut sub_events = self.data.lock().await.sub_events.clone();
        sub_events.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sub_events)
    }

    async fn create_sub_event(&self, name: &str) -> Result<SubEvent, ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        data.require_admin()?;
        let sub_event = SubEvent::new(name)?;
        data.sub_events.push(sub_event.clone());
        Ok(sub_event)
    }

    async fn rename_sub_event(&self, id: Uuid, name: &str) -> Result<SubEvent, ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        data.require_admin()?;
        let renamed = SubEvent { id, ..SubEvent::new(name)? };
        let existing = data.sub_events.iter_mut().find(|s| s.id == id)
            .ok_or_else(|| NotFoundError::new("SubEvent", id))?;
        *existing = renamed.clone();
        Ok(renamed)
    }

    async fn delete_sub_event(&self, id: Uuid) -> Result<(), ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        data.require_admin()?;
        data.require_sub_event(id)?;

        data.sub_events.retain(|s| s.id != id);
        let entries = data.entries.remove_sub_event(id);
        let roster = data.roster.remove_sub_event(id);
        data.referees.retain(|(r, _)| r.sub_event_id != id);
        debug!(sub_event = %id, entries, roster, "Deleted sub-event");
        Ok(())
    }

    async fn get_referees(&self) -> Result<Vec<Referee>, ClientError> {
        let data = self.data.lock().await;
        data.require_admin()?;
        Ok(data.referees.iter().map(|(r, _)| r.clone()).collect())
    }

    async fn create_referee(&self, referee: &NewReferee) -> Result<Referee, ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        data.require_admin()?;
        let referee = referee.validate()?;
        data.require_sub_event(referee.sub_event_id)?;
        if data.referees.iter().any(|(r, _)| r.username == referee.username) {
            return Err(ValidationError::new("username", "Username is already taken").into());
        }

        let hash = hash_password(&referee.password).map_err(|e| ClientError::RemoteIO(e.to_string()))?;
        let created = Referee { id: Uuid::new_v4(), username: referee.username, sub_event_id: referee.sub_event_id };
        data.referees.push((created.clone(), hash));
        Ok(created)
    }

    async fn delete_referee(&self, id: Uuid) -> Result<(), ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        data.require_admin()?;
        let before = data.referees.len();
        data.referees.retain(|(r, _)| r.id != id);
        if data.referees.len() == before {
            return Err(NotFoundError::new("Referee", id).into());
        }
        Ok(())
    }

    async fn get_entries(&self, sub_event_id: Option<Uuid>) -> Result<Vec<Entry>, ClientError> {
        let data = self.data.lock().await;
        let mut entries = match sub_event_id {
            Some(id) => data.entries.for_sub_event(id),
            None => data.entries.entries().to_vec(),
        };
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }

    async fn create_entry(&self, entry: &Entry) -> Result<Entry, ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        data.check_can_write_sub_event(entry.sub_event_id)?;
        let entry = entry.clone().validated()?;
        data.require_sub_event(entry.sub_event_id)?;
        if let Some(stored) = data.entries.get(entry.id) {
            entry.check_same_sub_event(stored.sub_event_id)?;
        }
        data.entries.upsert(entry.clone());
        Ok(entry)
    }

    async fn update_entry(&self, id: Uuid, draft: &EntryDraft) -> Result<Entry, ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        let existing = data.entries.get(id).cloned().ok_or_else(|| NotFoundError::new("Entry", id))?;
        data.check_can_write_sub_event(existing.sub_event_id)?;
        let updated = existing.with_draft(draft.validate()?);
        data.entries.replace(updated.clone())?;
        Ok(updated)
    }

    async fn delete_entry(&self, id: Uuid) -> Result<(), ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        let existing = data.entries.get(id).ok_or_else(|| NotFoundError::new("Entry", id))?;
        let sub_event_id = existing.sub_event_id;
        data.check_can_write_sub_event(sub_event_id)?;
        data.entries.remove(id)?;
        Ok(())
    }

    async fn get_roster(&self, sub_event_id: Option<Uuid>) -> Result<Vec<RosterItem>, ClientError> {
        let data = self.data.lock().await;
        Ok(match sub_event_id {
            Some(id) => data.roster.for_sub_event(id),
            None => data.roster.items().to_vec(),
        })
    }

    async fn upload_roster(&self, items: &[RosterItem]) -> Result<(), ClientError> {
        self.check_writable()?;
        let mut data = self.data.lock().await;
        for item in items {
            data.check_can_write_sub_event(item.sub_event_id)?;
            data.require_sub_event(item.sub_event_id)?;
            if item.id.trim().is_empty() {
                return Err(ValidationError::new("id", "Participant id must not be empty").into());
            }
        }
        data.roster.upsert_batch(items.to_vec());
        Ok(())
    }
}
