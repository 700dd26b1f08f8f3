use std::error::Error;

use scoreboard_app_backend::{LocalStore, ScoreSession};
use scoreboard_entities::{
    prelude::{EntryDraft, Group, Round},
    mock::{make_mock_competition_with_options, MockCompetition, MockOption},
};
use scoreboard_server::{app_with_state, state::AppState};
use sea_orm::prelude::Uuid;

pub const MOCK_SUB_EVENT: u128 = 1;

pub fn mock_sub_event() -> Uuid {
    Uuid::from_u128(MOCK_SUB_EVENT)
}

pub fn mock_competition() -> MockCompetition {
    make_mock_competition_with_options(MockOption { deterministic_uuids: true, ..Default::default() })
}

#[allow(dead_code)]
pub fn draft(participant_id: &str, group: Group, round: Round, score: f64, time: f64) -> EntryDraft {
    EntryDraft {
        participant_id: participant_id.to_string(),
        participant_name: String::new(),
        group,
        round,
        score,
        time,
    }
}

#[allow(dead_code)]
pub async fn local_admin_session() -> Result<ScoreSession<LocalStore>, Box<dyn Error>> {
    let mut session = ScoreSession::new(LocalStore::from_mock(mock_competition(), "admin")?);
    session.login("admin", "admin").await?;
    Ok(session)
}

/// Serves the API with the mock competition on an ephemeral port and
/// returns its base url.
#[allow(dead_code)]
pub async fn spawn_server() -> Result<String, Box<dyn Error>> {
    let state = AppState::new_test_app().await;
    mock_competition().save_all(&state.db).await?;
    let app = app_with_state(state).await;

    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let server = axum::Server::from_tcp(listener)?.serve(app.into_make_service());
    tokio::spawn(server);
    Ok(format!("http://{}", addr))
}
