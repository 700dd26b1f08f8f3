use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Percentages of a group receiving each award tier. They need not sum to 100.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, Clone, Copy)]
pub struct AwardConfig {
    pub first: u32,
    pub second: u32,
    pub third: u32,
}

impl Default for AwardConfig {
    fn default() -> Self {
        AwardConfig { first: 15, second: 25, third: 30 }
    }
}

impl AwardConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [("first", self.first), ("second", self.second), ("third", self.third)] {
            if value > 100 {
                return Err(ValidationError::new(field, "Percentage must be between 0 and 100"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Clone, Copy, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AwardTier {
    First,
    Second,
    Third,
}

/// Last rank (inclusive) receiving each tier in a group of a given size.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct AwardCutoffs {
    pub first: usize,
    pub second: usize,
    pub third: usize,
}

fn rounded_share(group_size: usize, percent: u64) -> usize {
    ((group_size as u64 * percent + 50) / 100) as usize
}

impl AwardCutoffs {
    pub fn new(group_size: usize, config: &AwardConfig) -> Self {
        let first = config.first as u64;
        let second = first + config.second as u64;
        let third = second + config.third as u64;
        AwardCutoffs {
            first: rounded_share(group_size, first),
            second: rounded_share(group_size, second),
            third: rounded_share(group_size, third),
        }
    }

    /// `rank` is 1-based.
    pub fn tier_for_rank(&self, rank: usize) -> Option<AwardTier> {
        if rank == 0 {
            None
        } else if rank <= self.first {
            Some(AwardTier::First)
        } else if rank <= self.second {
            Some(AwardTier::Second)
        } else if rank <= self.third {
            Some(AwardTier::Third)
        } else {
            None
        }
    }
}
