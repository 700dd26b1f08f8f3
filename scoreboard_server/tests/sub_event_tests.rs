mod common;

use common::{Auth, Fixture, FixtureOptions, MOCK_SUB_EVENT};
use scoreboard_entities::prelude::{CompetitionInfo, Entry, Group, RosterItem, SubEvent};
use scoreboard_server::{events::{SubEventRequest, UpdateInfoRequest}, roster::RosterBatchRequest, standings::StandingsResponse};
use scoreboard_entities::awards::AwardConfig;
use sea_orm::prelude::Uuid;
use tracing_test::traced_test;

async fn mock_fixture() -> Fixture {
    Fixture::new(FixtureOptions { mock_default_sub_event: true, ..Default::default() }).await
}

#[tokio::test]
#[traced_test]
async fn test_create_rename_and_list_sub_events() {
    let mut fixture = Fixture::default().await;
    let mut response = fixture.post_json("/api/events", SubEventRequest { name: " Sumo ".into() }).await;
    let created: SubEvent = response.json().await;
    assert_eq!(created.name, "Sumo");

    let response = fixture.put_json(&format!("/api/events/{}", created.id), SubEventRequest { name: "Mini Sumo".into() }).await;
    assert_eq!(response.status(), 200);

    let response = fixture.post_json("/api/events", SubEventRequest { name: "  ".into() }).await;
    assert_eq!(response.status(), 400);

    let mut fixture = fixture.with_auth(Auth::None);
    let mut response = fixture.get("/api/events").await;
    let events: Vec<SubEvent> = response.json().await;
    assert_eq!(events, vec![SubEvent { id: created.id, name: "Mini Sumo".into() }]);
}

#[tokio::test]
#[traced_test]
async fn test_delete_sub_event_cascades() {
    let mut fixture = mock_fixture().await;
    let response = fixture.delete(&format!("/api/events/{}", Uuid::from_u128(MOCK_SUB_EVENT))).await;
    assert_eq!(response.status(), 200);

    let mut response = fixture.get("/api/entries").await;
    let entries: Vec<Entry> = response.json().await;
    assert!(entries.is_empty());
    let mut response = fixture.get("/api/roster").await;
    let roster: Vec<RosterItem> = response.json().await;
    assert!(roster.is_empty());

    let response = fixture.delete(&format!("/api/events/{}", Uuid::from_u128(MOCK_SUB_EVENT))).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_roster_batch_upserts() {
    let mut fixture = mock_fixture().await;
    let items = vec![
        RosterItem { id: "A001".into(), name: "Renamed".into(), group: Group::Senior, sub_event_id: Uuid::from_u128(MOCK_SUB_EVENT) },
        RosterItem { id: "Z001".into(), name: "New".into(), group: Group::Junior, sub_event_id: Uuid::from_u128(MOCK_SUB_EVENT) },
    ];
    let response = fixture.post_json("/api/roster/batch", RosterBatchRequest { items }).await;
    assert_eq!(response.status(), 200);

    let mut response = fixture.get(&format!("/api/roster?subEventId={}", Uuid::from_u128(MOCK_SUB_EVENT))).await;
    let roster: Vec<RosterItem> = response.json().await;
    assert_eq!(roster.len(), 21);
    assert_eq!(roster.iter().find(|i| i.id == "A001").unwrap().name, "Renamed");

    let unknown = vec![RosterItem { id: "A1".into(), name: "X".into(), group: Group::Junior, sub_event_id: Uuid::from_u128(77) }];
    let response = fixture.post_json("/api/roster/batch", RosterBatchRequest { items: unknown }).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_standings_and_info() {
    let mut fixture = mock_fixture().await;
    let response = fixture.post_json("/api/info", UpdateInfoRequest {
        name: "Spring Cup".into(),
        config: AwardConfig { first: 10, second: 20, third: 30 },
    }).await;
    assert_eq!(response.status(), 200);

    let mut fixture = fixture.with_auth(Auth::None);
    let mut response = fixture.get("/api/info").await;
    let info: CompetitionInfo = response.json().await;
    assert_eq!(info.name, "Spring Cup");

    let mut response = fixture.get(&format!("/api/events/{}/standings", Uuid::from_u128(MOCK_SUB_EVENT))).await;
    assert_eq!(response.status(), 200);
    let standings: StandingsResponse = response.json().await;
    assert_eq!(standings.junior.len(), 10);
    assert_eq!(standings.junior[0].rank, 1);
    assert!(standings.junior[0].award.is_some());
    assert!(standings.junior[9].award.is_none());

    let response = fixture.get(&format!("/api/events/{}/standings", Uuid::from_u128(404))).await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
#[traced_test]
async fn test_export_csv() {
    let mut fixture = mock_fixture().await.with_auth(Auth::None);
    let mut response = fixture.get(&format!("/api/events/{}/export?group=senior", Uuid::from_u128(MOCK_SUB_EVENT))).await;
    assert_eq!(response.status(), 200);
    assert!(response.header("content-type").unwrap().starts_with("text/csv"));
    assert!(response.header("content-disposition").unwrap().contains("filename*=UTF-8''"));

    let body = response.text().await;
    let lines = body.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 11);
    assert!(lines[0].contains("排名,组别,队员编号"));
    assert!(lines[1].starts_with("1,高级组,"));

    let mut response = fixture.get(&format!("/api/events/{}/export?group=junior&locale=en", Uuid::from_u128(MOCK_SUB_EVENT))).await;
    let body = response.text().await;
    assert!(body.contains("Rank,Group,Participant ID"));
}
