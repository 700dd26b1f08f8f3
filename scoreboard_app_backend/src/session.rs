use std::io::Read;

use scoreboard_entities::{
    domain::referee::NewReferee,
    export::{export_file_name, export_standings_csv, CsvExportOptions},
    prelude::*,
};
use scoreboard_server::auth::{Role, SessionUser};
use sea_orm::prelude::Uuid;
use tracing::{debug, info, warn};

use crate::client::RemoteStore;
use crate::error::ClientError;
use crate::import::{ParseResult, ParseWarning, RosterImportError, RosterReaderConfig};

/// Who the client is acting as.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthSession {
    #[default]
    Anonymous,
    Admin { username: String },
    Referee { username: String, assigned_event: Uuid },
}

impl TryFrom<SessionUser> for AuthSession {
    type Error = ClientError;

    fn try_from(user: SessionUser) -> Result<Self, Self::Error> {
        match (user.role, user.assigned_event_id) {
            (Role::Admin, _) => Ok(AuthSession::Admin { username: user.username }),
            (Role::Referee, Some(assigned_event)) => Ok(AuthSession::Referee { username: user.username, assigned_event }),
            (Role::Referee, None) => Err(ClientError::Unauthorized("Referee account has no sub-event".into())),
        }
    }
}

impl AuthSession {
    pub async fn login<S>(store: &S, username: &str, password: &str) -> Result<AuthSession, ClientError>
    where
        S: RemoteStore + ?Sized,
    {
        let session = AuthSession::try_from(store.login(username, password).await?)?;
        info!(username = session.username().unwrap_or_default(), "Logged in");
        Ok(session)
    }

    /// Always ends anonymous; a failing remote logout is only logged.
    pub async fn logout<S>(&mut self, store: &S)
    where
        S: RemoteStore + ?Sized,
    {
        if *self == AuthSession::Anonymous {
            return;
        }
        if let Err(e) = store.logout().await {
            warn!("Remote logout failed: {}", e);
        }
        *self = AuthSession::Anonymous;
    }

    pub fn username(&self) -> Option<&str> {
        match self {
            AuthSession::Anonymous => None,
            AuthSession::Admin { username } | AuthSession::Referee { username, .. } => Some(username),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, AuthSession::Admin { .. })
    }

    pub fn assigned_event(&self) -> Option<Uuid> {
        match self {
            AuthSession::Referee { assigned_event, .. } => Some(*assigned_event),
            _ => None,
        }
    }

    pub fn can_write(&self, sub_event_id: Uuid) -> bool {
        match self {
            AuthSession::Anonymous => false,
            AuthSession::Admin { .. } => true,
            AuthSession::Referee { assigned_event, .. } => *assigned_event == sub_event_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Scoring,
    Display,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvExport {
    pub file_name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterImportSummary {
    pub imported: usize,
    pub warnings: Vec<ParseWarning>,
}

/// Client state for one user: everything loaded from the store, the
/// selected sub-event and the entry being edited.
///
/// Entry and roster writes are applied locally first. If the store then
/// rejects them, all data is reloaded and the error is returned as
/// `ClientError::RemoteIO`.
pub struct ScoreSession<S> {
    store: S,
    auth: AuthSession,
    view_mode: ViewMode,
    info: CompetitionInfo,
    sub_events: Vec<SubEvent>,
    referees: Vec<Referee>,
    entries: EntryBook,
    roster: RosterBook,
    current_sub_event: Option<Uuid>,
    editing: Option<Uuid>,
}

impl<S> ScoreSession<S> where S: RemoteStore {
    pub fn new(store: S) -> Self {
        ScoreSession {
            store,
            auth: AuthSession::Anonymous,
            view_mode: ViewMode::default(),
            info: CompetitionInfo::default(),
            sub_events: vec![],
            referees: vec![],
            entries: EntryBook::new(),
            roster: RosterBook::default(),
            current_sub_event: None,
            editing: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn auth(&self) -> &AuthSession {
        &self.auth
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        self.view_mode = view_mode;
    }

    pub fn info(&self) -> &CompetitionInfo {
        &self.info
    }

    pub fn sub_events(&self) -> &[SubEvent] {
        &self.sub_events
    }

    pub fn referees(&self) -> &[Referee] {
        &self.referees
    }

    pub fn entries(&self) -> &EntryBook {
        &self.entries
    }

    pub fn roster(&self) -> &RosterBook {
        &self.roster
    }

    pub fn current_sub_event(&self) -> Option<&SubEvent> {
        self.current_sub_event.and_then(|id| self.sub_events.iter().find(|s| s.id == id))
    }

    pub fn editing(&self) -> Option<&Entry> {
        self.editing.and_then(|id| self.entries.get(id))
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        self.auth = AuthSession::login(&self.store, username, password).await?;
        self.editing = None;
        self.reload().await
    }

    pub async fn logout(&mut self) {
        self.auth.logout(&self.store).await;
        self.editing = None;
        self.referees.clear();
    }

    /// Replaces all local state with the store's.
    pub async fn reload(&mut self) -> Result<(), ClientError> {
        let info = self.store.get_info().await?;
        let sub_events = self.store.get_sub_events().await?;
        let entries = self.store.get_entries(None).await?;
        let roster = self.store.get_roster(None).await?;
        let referees = if self.auth.is_admin() { self.store.get_referees().await? } else { vec![] };

        self.info = info;
        self.sub_events = sub_events;
        self.entries.set_entries(entries);
        self.roster = RosterBook::new(roster);
        self.referees = referees;
        self.settle_selection();

        debug!(entries = self.entries.len(), sub_events = self.sub_events.len(), "Reloaded session");
        Ok(())
    }

    /// Fetches entries only, as the display view does on every tick.
    pub async fn refresh_entries(&mut self) -> Result<(), ClientError> {
        let entries = self.store.get_entries(None).await?;
        self.entries.set_entries(entries);
        self.settle_selection();
        Ok(())
    }

    fn settle_selection(&mut self) {
        self.current_sub_event = match self.auth.assigned_event() {
            Some(assigned) => Some(assigned),
            None => self.current_sub_event
                .filter(|id| self.sub_events.iter().any(|s| s.id == *id))
                .or_else(|| self.sub_events.first().map(|s| s.id)),
        };
        if self.editing.is_some_and(|id| self.entries.get(id).is_none()) {
            self.editing = None;
        }
    }

    pub fn select_sub_event(&mut self, sub_event_id: Uuid) -> Result<(), ClientError> {
        if self.auth.assigned_event().is_some_and(|assigned| assigned != sub_event_id) {
            return Err(ClientError::Unauthorized("Referees cannot switch sub-events".into()));
        }
        if !self.sub_events.iter().any(|s| s.id == sub_event_id) {
            return Err(NotFoundError::new("SubEvent", sub_event_id).into());
        }
        if self.current_sub_event != Some(sub_event_id) {
            self.editing = None;
        }
        self.current_sub_event = Some(sub_event_id);
        Ok(())
    }

    fn require_current(&self) -> Result<Uuid, ClientError> {
        self.current_sub_event
            .ok_or_else(|| ValidationError::new("subEventId", "No sub-event selected").into())
    }

    fn require_write(&self, sub_event_id: Uuid) -> Result<(), ClientError> {
        if self.auth.can_write(sub_event_id) {
            Ok(())
        } else {
            Err(ClientError::Unauthorized("You may not change this sub-event".into()))
        }
    }

    fn require_admin(&self) -> Result<(), ClientError> {
        if self.auth.is_admin() {
            Ok(())
        } else {
            Err(ClientError::Unauthorized("Only the administrator may do this".into()))
        }
    }

    /// Reloads after a rejected write and turns the rejection into `RemoteIO`.
    async fn recover(&mut self, err: ClientError) -> ClientError {
        warn!("Remote write failed, reloading: {}", err);
        if let Err(reload_err) = self.reload().await {
            warn!("Reload after failed write also failed: {}", reload_err);
        }
        match err {
            ClientError::RemoteIO(message) => ClientError::RemoteIO(message),
            other => ClientError::RemoteIO(other.to_string()),
        }
    }

    pub fn standings(&self) -> Standings {
        match self.current_sub_event {
            Some(id) => Standings::compute_for_sub_event(self.entries.entries(), self.roster.items(), id),
            None => Standings::default(),
        }
    }

    pub fn ranked(&self, group: Group) -> Vec<RankedRow> {
        self.standings().ranked(group, Some(&self.info.award_config))
    }

    pub fn export_csv(&self, group: Group, options: &CsvExportOptions, with_awards: bool) -> Result<CsvExport, ClientError> {
        self.require_current()?;
        let config = with_awards.then_some(&self.info.award_config);
        let content = export_standings_csv(&self.standings(), group, config, options)?;
        let file_name = export_file_name(group, options.locale, chrono::Local::now().date_naive());
        Ok(CsvExport { file_name, content })
    }

    /// Most recent entries of the current sub-event first.
    pub fn recent_entries(&self, limit: usize) -> Vec<&Entry> {
        match self.current_sub_event {
            Some(id) => self.entries.recent_for_sub_event(id, limit),
            None => vec![],
        }
    }

    /// Roster data for filling in the score form.
    pub fn lookup_participant(&self, participant_id: &str) -> Option<&RosterItem> {
        self.roster.lookup(self.current_sub_event?, participant_id.trim())
    }

    pub fn start_editing(&mut self, entry_id: Uuid) -> Result<EntryDraft, ClientError> {
        let entry = self.entries.get(entry_id).ok_or_else(|| NotFoundError::new("Entry", entry_id))?;
        self.require_write(entry.sub_event_id)?;
        let draft = entry.draft();
        self.editing = Some(entry_id);
        Ok(draft)
    }

    pub fn cancel_editing(&mut self) {
        self.editing = None;
    }

    pub async fn add_entry(&mut self, draft: EntryDraft) -> Result<Entry, ClientError> {
        let sub_event_id = self.require_current()?;
        self.require_write(sub_event_id)?;
        let entry = draft.into_entry(sub_event_id)?;

        self.entries.upsert(entry.clone());
        self.settle_selection();
        if let Err(e) = self.store.create_entry(&entry).await {
            return Err(self.recover(e).await);
        }
        debug!(entry = %entry.id, participant = %entry.participant_id, "Added entry");
        Ok(entry)
    }

    pub async fn update_entry(&mut self, entry_id: Uuid, draft: EntryDraft) -> Result<Entry, ClientError> {
        let draft = draft.validate()?;
        let existing = self.entries.get(entry_id).cloned().ok_or_else(|| NotFoundError::new("Entry", entry_id))?;
        self.require_write(existing.sub_event_id)?;

        let updated = existing.with_draft(draft.clone());
        self.entries.replace(updated.clone())?;
        self.editing = None;
        if let Err(e) = self.store.update_entry(entry_id, &draft).await {
            return Err(self.recover(e).await);
        }
        Ok(updated)
    }

    pub async fn delete_entry(&mut self, entry_id: Uuid) -> Result<(), ClientError> {
        let existing = self.entries.get(entry_id).ok_or_else(|| NotFoundError::new("Entry", entry_id))?;
        self.require_write(existing.sub_event_id)?;

        self.entries.remove(entry_id)?;
        if self.editing == Some(entry_id) {
            self.editing = None;
        }
        if let Err(e) = self.store.delete_entry(entry_id).await {
            return Err(self.recover(e).await);
        }
        Ok(())
    }

    /// Imports a CSV roster into the current sub-event. Nothing is applied
    /// when the file cannot be parsed.
    pub async fn import_roster<R: Read>(&mut self, mut reader: R) -> Result<RosterImportSummary, ClientError> {
        let sub_event_id = self.require_current()?;
        self.require_write(sub_event_id)?;

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).map_err(RosterImportError::from)?;
        let config = RosterReaderConfig::default_from_file(&buffer[..])?;
        let parsed = config.parse(&buffer[..], sub_event_id)?;
        self.apply_roster(parsed).await
    }

    /// Like `import_roster`, for sheets already split into cells. The first
    /// row is the header.
    pub async fn import_roster_rows(&mut self, rows: Vec<Vec<String>>) -> Result<RosterImportSummary, ClientError> {
        let sub_event_id = self.require_current()?;
        self.require_write(sub_event_id)?;

        let mut rows = rows.into_iter();
        let header = rows.next().ok_or(RosterImportError::NoValidRows)?;
        let config = RosterReaderConfig::from_header_row(&header[..]);
        let parsed = config.parse_rows(rows, sub_event_id)?;
        self.apply_roster(parsed).await
    }

    async fn apply_roster(&mut self, parsed: ParseResult) -> Result<RosterImportSummary, ClientError> {
        let ParseResult { items, warnings } = parsed;
        let imported = items.len();

        self.roster.upsert_batch(items.clone());
        if let Err(e) = self.store.upload_roster(&items).await {
            return Err(self.recover(e).await);
        }
        info!(imported, skipped = warnings.len(), "Imported roster");
        Ok(RosterImportSummary { imported, warnings })
    }

    pub async fn update_info(&mut self, info: CompetitionInfo) -> Result<(), ClientError> {
        self.require_admin()?;
        info.validate()?;
        self.store.update_info(&info).await?;
        self.info = info;
        Ok(())
    }

    pub async fn create_sub_event(&mut self, name: &str) -> Result<SubEvent, ClientError> {
        self.require_admin()?;
        SubEvent::new(name)?;
        let sub_event = self.store.create_sub_event(name).await?;
        self.sub_events.push(sub_event.clone());
        self.settle_selection();
        Ok(sub_event)
    }

    pub async fn rename_sub_event(&mut self, sub_event_id: Uuid, name: &str) -> Result<SubEvent, ClientError> {
        self.require_admin()?;
        SubEvent::new(name)?;
        let renamed = self.store.rename_sub_event(sub_event_id, name).await?;
        if let Some(existing) = self.sub_events.iter_mut().find(|s| s.id == sub_event_id) {
            *existing = renamed.clone();
        }
        Ok(renamed)
    }

    /// Drops the sub-event with its entries, roster and referees.
    pub async fn delete_sub_event(&mut self, sub_event_id: Uuid) -> Result<(), ClientError> {
        self.require_admin()?;
        self.store.delete_sub_event(sub_event_id).await?;

        self.sub_events.retain(|s| s.id != sub_event_id);
        self.entries.remove_sub_event(sub_event_id);
        self.roster.remove_sub_event(sub_event_id);
        self.referees.retain(|r| r.sub_event_id != sub_event_id);
        self.settle_selection();
        Ok(())
    }

    pub async fn create_referee(&mut self, referee: NewReferee) -> Result<Referee, ClientError> {
        self.require_admin()?;
        let referee = referee.validate()?;
        let created = self.store.create_referee(&referee).await?;
        self.referees.push(created.clone());
        Ok(created)
    }

    pub async fn delete_referee(&mut self, referee_id: Uuid) -> Result<(), ClientError> {
        self.require_admin()?;
        self.store.delete_referee(referee_id).await?;
        self.referees.retain(|r| r.id != referee_id);
        Ok(())
    }

    pub async fn change_admin_password(&mut self, password: &str) -> Result<(), ClientError> {
        self.require_admin()?;
        if password.is_empty() {
            return Err(ValidationError::new("password", "Password must not be empty").into());
        }
        self.store.change_admin_password(password).await
    }
}
