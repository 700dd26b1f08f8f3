use std::{error::Error, sync::Arc, time::Duration};

use assert_matches::assert_matches;
use scoreboard_app_backend::{
    refresh::DisplayRefresh, AuthSession, ClientError, LocalStore, PeriodicRefresh, RemoteStore, ScoreSession, ViewMode,
};
use scoreboard_entities::{
    domain::referee::NewReferee,
    export::CsvExportOptions,
    prelude::*,
};
use tokio::sync::Mutex;
use tracing_test::traced_test;

mod common;
use common::{draft, local_admin_session, mock_competition, mock_sub_event};

#[tokio::test]
async fn test_anonymous_session_can_read_but_not_write() -> Result<(), Box<dyn Error>> {
    let mut session = ScoreSession::new(LocalStore::from_mock(mock_competition(), "admin")?);
    session.reload().await?;

    assert_eq!(session.current_sub_event().map(|s| s.id), Some(mock_sub_event()));
    assert!(!session.ranked(Group::Junior).is_empty());
    assert_matches!(
        session.add_entry(draft("A001", Group::Junior, Round::First, 1.0, 1.0)).await,
        Err(ClientError::Unauthorized(_))
    );
    Ok(())
}

#[tokio::test]
async fn test_added_entry_shows_in_standings() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let mut new = draft("Z999", Group::Senior, Round::First, 100.0, 10.0);
    new.participant_name = "Zed".into();

    let entry = session.add_entry(new).await?;
    let ranked = session.ranked(Group::Senior);

    assert_eq!(ranked[0].stats.participant_id, "Z999");
    assert_eq!(ranked[0].stats.participant_name, "Zed");
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(session.recent_entries(1)[0].id, entry.id);
    assert_eq!(session.store().get_entries(None).await?.iter().filter(|e| e.id == entry.id).count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_resubmitting_a_round_replaces_it() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let before = session.entries().len();

    session.add_entry(draft("A001", Group::Junior, Round::First, 55.0, 20.0)).await?;

    assert_eq!(session.entries().len(), before);
    assert_eq!(session.store().get_entries(None).await?.len(), before);
    let first_round = session.entries().entries().iter()
        .filter(|e| e.participant_id == "A001" && e.round == Round::First)
        .collect::<Vec<_>>();
    assert_eq!(first_round.len(), 1);
    assert_eq!(first_round[0].score, 55.0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_draft_never_reaches_store() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    session.store().set_fail_writes(true);

    let result = session.add_entry(draft("A001", Group::Junior, Round::First, 5.0, 0.0)).await;
    assert_matches!(result, Err(ClientError::Validation(ValidationError { field, .. })) if field == "time");

    let result = session.add_entry(draft("  ", Group::Junior, Round::First, 5.0, 3.0)).await;
    assert_matches!(result, Err(ClientError::Validation(ValidationError { field, .. })) if field == "participantId");
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_failed_write_reloads_authoritative_state() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let before = session.entries().clone();
    session.store().set_fail_writes(true);

    let result = session.add_entry(draft("Z999", Group::Senior, Round::First, 100.0, 10.0)).await;

    assert_matches!(result, Err(ClientError::RemoteIO(_)));
    assert_eq!(session.entries().len(), before.len());
    assert!(session.entries().entries().iter().all(|e| e.participant_id != "Z999"));
    assert!(logs_contain("Remote write failed, reloading"));
    Ok(())
}

#[tokio::test]
async fn test_failed_update_restores_entry() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let entry = session.entries().entries()[0].clone();
    session.store().set_fail_writes(true);

    let mut changed = entry.draft();
    changed.score += 1.0;
    assert_matches!(session.update_entry(entry.id, changed).await, Err(ClientError::RemoteIO(_)));
    assert_eq!(session.entries().get(entry.id).map(|e| e.score), Some(entry.score));
    Ok(())
}

#[tokio::test]
async fn test_update_clears_edit_state() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let entry = session.entries().entries()[0].clone();

    let mut form = session.start_editing(entry.id)?;
    assert_eq!(session.editing().map(|e| e.id), Some(entry.id));

    form.time = 12.5;
    let updated = session.update_entry(entry.id, form).await?;

    assert!(session.editing().is_none());
    assert_eq!(updated.timestamp, entry.timestamp);
    assert_eq!(session.store().get_entries(None).await?.iter().find(|e| e.id == entry.id).map(|e| e.time), Some(12.5));
    Ok(())
}

#[tokio::test]
async fn test_deleting_edited_entry_clears_edit_state() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let entry = session.entries().entries()[0].clone();
    session.start_editing(entry.id)?;

    session.delete_entry(entry.id).await?;

    assert!(session.editing().is_none());
    assert!(session.entries().get(entry.id).is_none());
    assert_matches!(session.delete_entry(entry.id).await, Err(ClientError::NotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_referee_is_locked_to_assigned_sub_event() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let other = session.create_sub_event("Sumo").await?;
    session.create_referee(NewReferee {
        username: "judge".into(),
        password: "pw".into(),
        sub_event_id: mock_sub_event(),
    }).await?;
    session.select_sub_event(other.id)?;

    session.logout().await;
    assert_eq!(session.auth(), &AuthSession::Anonymous);
    session.login("judge", "pw").await?;

    assert_eq!(session.auth().assigned_event(), Some(mock_sub_event()));
    assert_eq!(session.current_sub_event().map(|s| s.id), Some(mock_sub_event()));
    assert!(session.referees().is_empty());
    assert_matches!(session.select_sub_event(other.id), Err(ClientError::Unauthorized(_)));
    assert_matches!(session.create_sub_event("Other").await, Err(ClientError::Unauthorized(_)));

    session.add_entry(draft("A002", Group::Senior, Round::Second, 80.0, 30.0)).await?;
    Ok(())
}

#[tokio::test]
async fn test_roster_import_renames_participants() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let file = "编号,姓名,组别\nA001,新名字,初级组\nX1,,高级组\n,空行,初级组\n";

    let summary = session.import_roster(file.as_bytes()).await?;

    assert_eq!(summary.imported, 2);
    assert_eq!(summary.warnings.len(), 1);
    assert_eq!(session.lookup_participant(" A001 ").map(|r| r.name.as_str()), Some("新名字"));
    assert_eq!(session.lookup_participant("X1").map(|r| (r.name.as_str(), r.group)), Some(("X1", Group::Senior)));
    let a001 = session.ranked(Group::Junior).into_iter().find(|r| r.stats.participant_id == "A001");
    assert_eq!(a001.map(|r| r.stats.participant_name), Some("新名字".to_string()));
    assert_eq!(session.store().get_roster(Some(mock_sub_event())).await?.len(), 21);
    Ok(())
}

#[tokio::test]
async fn test_malformed_roster_applies_nothing() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let roster = session.roster().clone();

    let result = session.import_roster(&b"id,name\nA001,\xff\xfe\n"[..]).await;

    assert_matches!(result, Err(ClientError::Parse(_)));
    assert_eq!(session.roster(), &roster);
    Ok(())
}

#[tokio::test]
async fn test_roster_rows_import() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let rows = vec![
        vec!["Name".to_string(), "ID".to_string(), "Group".to_string()],
        vec!["Ann".to_string(), "B7".to_string(), "Senior".to_string()],
    ];

    let summary = session.import_roster_rows(rows).await?;

    assert_eq!(summary.imported, 1);
    assert_eq!(session.lookup_participant("B7").map(|r| r.group), Some(Group::Senior));
    Ok(())
}

#[tokio::test]
async fn test_delete_sub_event_cascades() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let other = session.create_sub_event("Sumo").await?;

    session.delete_sub_event(mock_sub_event()).await?;

    assert!(session.entries().is_empty());
    assert!(session.roster().items().is_empty());
    assert_eq!(session.current_sub_event().map(|s| s.id), Some(other.id));
    assert!(session.store().get_entries(None).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_export_of_current_sub_event() -> Result<(), Box<dyn Error>> {
    let session = local_admin_session().await?;

    let export = session.export_csv(Group::Junior, &CsvExportOptions::default(), true)?;

    assert!(export.file_name.starts_with("比赛排名_初级组_"));
    assert!(export.file_name.ends_with(".csv"));
    assert!(export.content.starts_with('\u{feff}'));
    assert_eq!(export.content.lines().count(), 1 + session.ranked(Group::Junior).len());
    assert!(export.content.contains("一等奖"));
    Ok(())
}

#[tokio::test]
async fn test_info_update_changes_award_tiers() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    let info = CompetitionInfo {
        name: "测试赛".into(),
        award_config: AwardConfig { first: 100, second: 0, third: 0 },
    };

    session.update_info(info.clone()).await?;

    assert_eq!(session.store().get_info().await?, info);
    assert!(session.ranked(Group::Junior).iter().all(|r| r.award == Some(AwardTier::First)));

    let invalid = CompetitionInfo { name: " ".into(), ..info };
    assert_matches!(session.update_info(invalid).await, Err(ClientError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn test_display_refresh_picks_up_remote_entries() -> Result<(), Box<dyn Error>> {
    let mut session = local_admin_session().await?;
    session.set_view_mode(ViewMode::Display);
    let shared = Arc::new(Mutex::new(session));
    let refresh = PeriodicRefresh::spawn(DisplayRefresh::new(shared.clone()), Duration::from_millis(10));

    let entry = draft("Z1", Group::Junior, Round::First, 10.0, 10.0).into_entry(mock_sub_event())?;
    shared.lock().await.store().create_entry(&entry).await?;
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert!(shared.lock().await.entries().get(entry.id).is_some());
    refresh.stop().await;
    Ok(())
}

#[tokio::test]
async fn test_scoring_mode_does_not_poll() -> Result<(), Box<dyn Error>> {
    let session = local_admin_session().await?;
    let shared = Arc::new(Mutex::new(session));
    let refresh = PeriodicRefresh::spawn(DisplayRefresh::new(shared.clone()), Duration::from_millis(10));

    let entry = draft("Z1", Group::Junior, Round::First, 10.0, 10.0).into_entry(mock_sub_event())?;
    shared.lock().await.store().create_entry(&entry).await?;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(shared.lock().await.entries().get(entry.id).is_none());
    refresh.stop().await;
    Ok(())
}
