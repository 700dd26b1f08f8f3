pub use crate::domain::{
    competition::CompetitionInfo,
    entry::{Entry, EntryBook, EntryDraft},
    referee::Referee,
    roster::{RosterBook, RosterIndex, RosterItem},
    sub_event::SubEvent,
    Group,
    Round,
};
pub use crate::awards::{AwardConfig, AwardCutoffs, AwardTier};
pub use crate::ranking::{ParticipantStats, RankedRow, Standings};
pub use crate::error::{NotFoundError, ScoreboardError, ValidationError};
