use std::cmp::Ordering;
use std::collections::HashMap;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use sea_orm::prelude::*;
use serde::{Deserialize, Serialize};

use crate::awards::{AwardConfig, AwardCutoffs, AwardTier};
use crate::domain::{entry::Entry, roster::{RosterIndex, RosterItem}, Group, Round};
use crate::error::ScoreboardError;

/// Per-participant view derived from the entries of one sub-event.
#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantStats {
    pub participant_id: String,
    pub participant_name: String,
    pub group: Group,
    pub round1: Option<Entry>,
    pub round2: Option<Entry>,
    pub best_entry: Option<Entry>,
}

impl ParticipantStats {
    pub fn round(&self, round: Round) -> Option<&Entry> {
        match round {
            Round::First => self.round1.as_ref(),
            Round::Second => self.round2.as_ref(),
        }
    }

    fn sort_key(&self) -> (OrderedFloat<f64>, OrderedFloat<f64>) {
        match &self.best_entry {
            Some(best) => (-OrderedFloat(best.score), OrderedFloat(best.time)),
            None => (OrderedFloat(f64::INFINITY), OrderedFloat(f64::INFINITY)),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RankedRow {
    pub rank: usize,
    #[serde(flatten)]
    pub stats: ParticipantStats,
    pub award: Option<AwardTier>,
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Default)]
pub struct Standings {
    pub junior: Vec<ParticipantStats>,
    pub senior: Vec<ParticipantStats>,
}

/// The better of two attempts: higher score, then lower time, then round 1.
pub fn best_entry<'a>(round1: Option<&'a Entry>, round2: Option<&'a Entry>) -> Option<&'a Entry> {
    match (round1, round2) {
        (None, None) => None,
        (Some(e), None) | (None, Some(e)) => Some(e),
        (Some(r1), Some(r2)) => {
            let ordering = OrderedFloat(r1.score).cmp(&OrderedFloat(r2.score))
                .then_with(|| OrderedFloat(r2.time).cmp(&OrderedFloat(r1.time)));
            match ordering {
                Ordering::Less => Some(r2),
                Ordering::Greater | Ordering::Equal => Some(r1),
            }
        }
    }
}

#[derive(Default)]
struct RetainedRounds<'a> {
    rounds: [Option<(usize, &'a Entry)>; 2],
}

impl<'a> RetainedRounds<'a> {
    fn offer(&mut self, position: usize, entry: &'a Entry) {
        let slot = &mut self.rounds[(entry.round.number() - 1) as usize];
        let keep_current = matches!(slot, Some((_, current)) if current.timestamp > entry.timestamp);
        if !keep_current {
            *slot = Some((position, entry));
        }
    }

    fn most_recent(&self) -> Option<&'a Entry> {
        self.rounds.iter()
            .flatten()
            .max_by_key(|(position, entry)| (entry.timestamp, *position))
            .map(|(_, entry)| *entry)
    }
}

impl Standings {
    /// Ranks the given entries. Callers pass entries and roster of a single
    /// sub-event.
    pub fn compute(entries: &[Entry], roster: &RosterIndex) -> Standings {
        let mut participants: HashMap<&str, RetainedRounds> = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            participants.entry(entry.participant_id.as_str()).or_default().offer(position, entry);
        }

        let mut standings = Standings::default();
        for (participant_id, retained) in participants {
            let round1 = retained.rounds[0].map(|(_, e)| e);
            let round2 = retained.rounds[1].map(|(_, e)| e);

            let (participant_name, group) = match roster.get(participant_id) {
                Some(item) => (item.name.clone(), item.group),
                None => {
                    let latest = retained.most_recent();
                    let name = latest.map(|e| e.participant_name.trim()).filter(|n| !n.is_empty()).unwrap_or(participant_id);
                    (name.to_string(), latest.map(|e| e.group).unwrap_or_default())
                }
            };

            let stats = ParticipantStats {
                participant_id: participant_id.to_string(),
                participant_name,
                group,
                best_entry: best_entry(round1, round2).cloned(),
                round1: round1.cloned(),
                round2: round2.cloned(),
            };
            match group {
                Group::Junior => standings.junior.push(stats),
                Group::Senior => standings.senior.push(stats),
            }
        }

        for group in [&mut standings.junior, &mut standings.senior] {
            group.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()).then_with(|| a.participant_id.cmp(&b.participant_id)));
        }
        standings
    }

    /// Filters both inputs to `sub_event_id` before ranking.
    pub fn compute_for_sub_event(entries: &[Entry], roster: &[RosterItem], sub_event_id: Uuid) -> Standings {
        let entries = entries.iter().filter(|e| e.sub_event_id == sub_event_id).cloned().collect_vec();
        let roster: RosterIndex = roster.iter().filter(|i| i.sub_event_id == sub_event_id).collect();
        Self::compute(&entries, &roster)
    }

    pub async fn load<C>(db: &C, sub_event_id: Uuid) -> Result<Standings, ScoreboardError> where C: ConnectionTrait {
        let entries = Entry::get_all(db, Some(sub_event_id)).await?;
        let roster = RosterItem::get_all(db, Some(sub_event_id)).await?;
        Ok(Self::compute(&entries, &roster.iter().collect()))
    }

    pub fn group(&self, group: Group) -> &[ParticipantStats] {
        match group {
            Group::Junior => &self.junior,
            Group::Senior => &self.senior,
        }
    }

    /// Rows of one group with 1-based ranks and, given a config, award tiers.
    pub fn ranked(&self, group: Group, config: Option<&AwardConfig>) -> Vec<RankedRow> {
        let rows = self.group(group);
        let cutoffs = config.map(|c| AwardCutoffs::new(rows.len(), c));
        rows.iter().enumerate().map(|(idx, stats)| {
            let rank = idx + 1;
            RankedRow {
                rank,
                stats: stats.clone(),
                award: cutoffs.and_then(|c| c.tier_for_rank(rank)),
            }
        }).collect()
    }
}
