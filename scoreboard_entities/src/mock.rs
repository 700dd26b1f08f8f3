use chrono::{Duration, NaiveDate};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sea_orm::{prelude::*, TransactionTrait};

use crate::domain::{entry::Entry, roster::RosterItem, sub_event::SubEvent, Group, Round};
use crate::error::ScoreboardError;

const SURNAMES: [&str; 20] = ["赵", "钱", "孙", "李", "周", "吴", "郑", "王", "冯", "陈", "褚", "卫", "蒋", "沈", "韩", "杨", "朱", "秦", "尤", "许"];
const GIVEN_NAMES: [&str; 20] = ["伟", "芳", "娜", "敏", "静", "秀", "强", "军", "杰", "磊", "洋", "勇", "艳", "杰", "娟", "涛", "明", "超", "秀", "丽"];

/// Sample participant number `i` (0-based): id, name and alternating group.
pub fn sample_participant(i: usize) -> (String, String, Group) {
    let id = format!("A{:03}", i + 1);
    let name = format!("{}{}", SURNAMES[i % SURNAMES.len()], GIVEN_NAMES[(i * 3) % GIVEN_NAMES.len()]);
    let group = if i % 2 == 0 { Group::Junior } else { Group::Senior };
    (id, name, group)
}

#[derive(Debug)]
pub struct MockOption {
    pub deterministic_uuids: bool,
    pub num_participants: usize,
    /// Share of participants that also have a second-round entry, in percent.
    pub second_round_share: u32,
    pub seed: u64,
}

impl Default for MockOption {
    fn default() -> Self {
        Self {
            deterministic_uuids: false,
            num_participants: 20,
            second_round_share: 70,
            seed: 2025,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MockCompetition {
    pub sub_event: SubEvent,
    pub roster: Vec<RosterItem>,
    pub entries: Vec<Entry>,
}

pub fn make_mock_competition() -> MockCompetition {
    make_mock_competition_with_options(Default::default())
}

pub fn make_mock_competition_with_options(options: MockOption) -> MockCompetition {
    /*
    Sub-event: 1
    Entries: 1000..
    */
    let mut rng = StdRng::seed_from_u64(options.seed);
    let uuid = |n: u128| if options.deterministic_uuids { Uuid::from_u128(n) } else { Uuid::new_v4() };

    let sub_event = SubEvent { id: uuid(1), name: "机器人竞速".to_string() };
    let start = NaiveDate::from_ymd_opt(2025, 5, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap_or_default();

    let mut roster = vec![];
    let mut entries = vec![];
    for i in 0..options.num_participants {
        let (id, name, group) = sample_participant(i);
        roster.push(RosterItem { id: id.clone(), name: name.clone(), group, sub_event_id: sub_event.id });

        let mut rounds = vec![Round::First];
        if rng.gen_range(0..100) < options.second_round_share {
            rounds.push(Round::Second);
        }
        for round in rounds {
            let n = entries.len();
            entries.push(Entry {
                id: uuid(1000 + n as u128),
                participant_id: id.clone(),
                participant_name: name.clone(),
                group,
                round,
                score: rng.gen_range(0..=100u32) as f64,
                time: (rng.gen_range(150..=1200u32) as f64) / 10.0,
                timestamp: start + Duration::seconds(n as i64 * 45),
                sub_event_id: sub_event.id,
            });
        }
    }

    MockCompetition { sub_event, roster, entries }
}

impl MockCompetition {
    pub async fn save_all<C>(&self, db: &C) -> Result<(), ScoreboardError> where C: ConnectionTrait + TransactionTrait {
        self.sub_event.save(db).await?;
        RosterItem::upsert_many(db, &self.roster).await?;
        for entry in &self.entries {
            entry.upsert(db).await?;
        }
        Ok(())
    }
}
