use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::awards::{AwardConfig, AwardTier};
use crate::domain::{entry::Entry, Group};
use crate::ranking::Standings;

const UTF8_BOM: &str = "\u{feff}";
const MISSING: &str = "-";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Could not write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Could not flush CSV writer: {0}")]
    Flush(String),
    #[error("CSV output is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy, Default)]
pub enum ExportLocale {
    #[default]
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "en")]
    English,
}

impl ExportLocale {
    fn headers(&self) -> [&'static str; 11] {
        match self {
            ExportLocale::Chinese => [
                "排名", "组别", "队员编号", "姓名", "最终得分", "最终耗时",
                "第一轮得分", "第一轮耗时", "第二轮得分", "第二轮耗时", "获奖等级",
            ],
            ExportLocale::English => [
                "Rank", "Group", "Participant ID", "Name", "Final Score", "Final Time",
                "Round 1 Score", "Round 1 Time", "Round 2 Score", "Round 2 Time", "Award",
            ],
        }
    }

    pub fn group_label(&self, group: Group) -> &'static str {
        match (self, group) {
            (ExportLocale::Chinese, Group::Junior) => "初级组",
            (ExportLocale::Chinese, Group::Senior) => "高级组",
            (ExportLocale::English, Group::Junior) => "Junior",
            (ExportLocale::English, Group::Senior) => "Senior",
        }
    }

    pub fn tier_label(&self, tier: AwardTier) -> &'static str {
        match (self, tier) {
            (ExportLocale::Chinese, AwardTier::First) => "一等奖",
            (ExportLocale::Chinese, AwardTier::Second) => "二等奖",
            (ExportLocale::Chinese, AwardTier::Third) => "三等奖",
            (ExportLocale::English, AwardTier::First) => "First Prize",
            (ExportLocale::English, AwardTier::Second) => "Second Prize",
            (ExportLocale::English, AwardTier::Third) => "Third Prize",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CsvExportOptions {
    pub locale: ExportLocale,
    pub include_bom: bool,
}

impl Default for CsvExportOptions {
    fn default() -> Self {
        CsvExportOptions { locale: ExportLocale::Chinese, include_bom: true }
    }
}

fn round_cells(entry: Option<&Entry>) -> [String; 2] {
    match entry {
        Some(e) => [e.score.to_string(), e.time.to_string()],
        None => [MISSING.to_string(), MISSING.to_string()],
    }
}

/// Writes the standings of one group. Without a config every award cell is `-`.
pub fn export_standings_csv(standings: &Standings, group: Group, config: Option<&AwardConfig>, options: &CsvExportOptions) -> Result<String, ExportError> {
    let locale = options.locale;
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(vec![]);

    writer.write_record(locale.headers())?;
    for row in standings.ranked(group, config) {
        let stats = &row.stats;
        let (final_score, final_time) = stats.best_entry.as_ref()
            .map(|e| (e.score, e.time))
            .unwrap_or((0.0, 0.0));
        let [r1_score, r1_time] = round_cells(stats.round1.as_ref());
        let [r2_score, r2_time] = round_cells(stats.round2.as_ref());
        let award = row.award.map(|t| locale.tier_label(t)).unwrap_or(MISSING);

        writer.write_record([
            row.rank.to_string(),
            locale.group_label(stats.group).to_string(),
            stats.participant_id.clone(),
            stats.participant_name.clone(),
            final_score.to_string(),
            final_time.to_string(),
            r1_score,
            r1_time,
            r2_score,
            r2_time,
            award.to_string(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Flush(e.to_string()))?;
    let body = String::from_utf8(bytes)?;
    Ok(if options.include_bom { format!("{}{}", UTF8_BOM, body) } else { body })
}

pub fn export_file_name(group: Group, locale: ExportLocale, date: NaiveDate) -> String {
    let date = date.format("%Y-%m-%d");
    match locale {
        ExportLocale::Chinese => format!("比赛排名_{}_{}.csv", locale.group_label(group), date),
        ExportLocale::English => format!("standings_{}_{}.csv", group, date),
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::prelude::Uuid;

    use super::*;
    use crate::domain::{roster::RosterIndex, Round};

    fn entry(id: u128, participant_id: &str, round: Round, score: f64, time: f64) -> Entry {
        Entry {
            id: Uuid::from_u128(id),
            participant_id: participant_id.to_string(),
            participant_name: format!("P{}", participant_id),
            group: Group::Junior,
            round,
            score,
            time,
            timestamp: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap().and_hms_opt(10, 0, id as u32).unwrap(),
            sub_event_id: Uuid::from_u128(1),
        }
    }

    fn standings() -> Standings {
        Standings::compute(&[
            entry(1, "A001", Round::First, 8.0, 30.5),
            entry(2, "A001", Round::Second, 9.0, 40.0),
            entry(3, "A002", Round::Second, 7.0, 20.0),
        ], &RosterIndex::default())
    }

    #[test]
    fn test_chinese_export_with_awards() {
        let config = AwardConfig { first: 50, second: 50, third: 0 };
        let csv = export_standings_csv(&standings(), Group::Junior, Some(&config), &CsvExportOptions::default()).unwrap();
        let lines = csv.lines().collect::<Vec<_>>();

        assert!(lines[0].starts_with('\u{feff}'));
        assert_eq!(lines[0].trim_start_matches('\u{feff}'), "排名,组别,队员编号,姓名,最终得分,最终耗时,第一轮得分,第一轮耗时,第二轮得分,第二轮耗时,获奖等级");
        assert_eq!(lines[1], "1,初级组,A001,PA001,9,40,8,30.5,9,40,一等奖");
        assert_eq!(lines[2], "2,初级组,A002,PA002,7,20,-,-,7,20,二等奖");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_export_without_config_has_no_awards() {
        let options = CsvExportOptions { locale: ExportLocale::English, include_bom: false };
        let csv = export_standings_csv(&standings(), Group::Junior, None, &options).unwrap();
        let lines = csv.lines().collect::<Vec<_>>();

        assert!(lines[0].starts_with("Rank,Group,"));
        assert!(lines[1].ends_with(",-"));
        assert!(lines[1].contains(",Junior,"));
    }

    #[test]
    fn test_empty_group_writes_header_only() {
        let csv = export_standings_csv(&standings(), Group::Senior, None, &CsvExportOptions::default()).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_names_with_commas_are_quoted() {
        let mut e = entry(1, "A001", Round::First, 8.0, 30.0);
        e.participant_name = "Li, Lei".into();
        let standings = Standings::compute(&[e], &RosterIndex::default());
        let options = CsvExportOptions { locale: ExportLocale::English, include_bom: false };
        let csv = export_standings_csv(&standings, Group::Junior, None, &options).unwrap();
        assert!(csv.contains("\"Li, Lei\""));
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        assert_eq!(export_file_name(Group::Junior, ExportLocale::Chinese, date), "比赛排名_初级组_2025-05-01.csv");
        assert_eq!(export_file_name(Group::Senior, ExportLocale::English, date), "standings_senior_2025-05-01.csv");
    }
}
