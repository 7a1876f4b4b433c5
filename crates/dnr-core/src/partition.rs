//! Rule ID partitioning
//!
//! Every configuration owns a fixed, disjoint block of rule IDs. Clearing a
//! configuration's rules means clearing its whole block, which can never
//! touch another configuration's rules. The first ID of each block is
//! reserved for the tag sentinel.
//!
//! The ranges are part of the persisted state: resizing one changes which
//! installed IDs count as belonging to a configuration, so a resize needs a
//! migration that clears the old block first.

use crate::{Error, Result};
use dnr_rules::RuleId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

/// Rules reserved for the tracker-blocking dataset
pub const TDS_RULE_ID_RANGE: RuleIdRange = RuleIdRange::new(1, 10_001);

/// Rules reserved for the auxiliary config dataset
pub const CONFIG_RULE_ID_RANGE: RuleIdRange = RuleIdRange::new(10_001, 20_001);

/// The closed set of synchronized configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigName {
    /// Tracker-blocking dataset
    Tds,
    /// Auxiliary configuration dataset
    Config,
}

impl ConfigName {
    /// Every configuration, in listener registration order
    pub const ALL: [ConfigName; 2] = [ConfigName::Config, ConfigName::Tds];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tds => "tds",
            Self::Config => "config",
        }
    }

    /// The configuration's rule ID partition
    pub const fn rule_id_range(self) -> RuleIdRange {
        match self {
            Self::Tds => TDS_RULE_ID_RANGE,
            Self::Config => CONFIG_RULE_ID_RANGE,
        }
    }

    /// The configuration whose partition contains `id`, if any
    pub fn owning(id: RuleId) -> Option<ConfigName> {
        Self::ALL
            .into_iter()
            .find(|name| name.rule_id_range().contains(id))
    }

    /// Position of `self` in [`Self::ALL`]
    pub(crate) const fn index(self) -> usize {
        let mut i = 0;
        while i < Self::ALL.len() {
            if Self::ALL[i] as u8 == self as u8 {
                return i;
            }
            i += 1;
        }
        unreachable!()
    }
}

impl fmt::Display for ConfigName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tds" => Ok(Self::Tds),
            "config" => Ok(Self::Config),
            _ => Err(Error::UnknownConfiguration {
                name: s.to_string(),
            }),
        }
    }
}

/// Half-open block of rule IDs `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleIdRange {
    start: RuleId,
    end: RuleId,
}

impl RuleIdRange {
    /// # Panics
    /// Panics if the range would hold fewer than two IDs or starts at 0.
    pub const fn new(start: RuleId, end: RuleId) -> Self {
        assert!(start >= 1, "rule IDs start at 1");
        assert!(end > start + 1, "a partition needs room for the sentinel and data rules");
        Self { start, end }
    }

    pub const fn start(&self) -> RuleId {
        self.start
    }

    pub const fn end(&self) -> RuleId {
        self.end
    }

    /// ID reserved for the tag sentinel
    pub const fn sentinel_id(&self) -> RuleId {
        self.start
    }

    /// First ID handed to the ruleset generator
    pub const fn first_data_id(&self) -> RuleId {
        self.start + 1
    }

    pub const fn contains(&self, id: RuleId) -> bool {
        id >= self.start && id < self.end
    }

    /// Every ID in the partition, sentinel included
    pub fn ids(&self) -> Range<RuleId> {
        self.start..self.end
    }

    pub const fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    /// Always false for ranges built through [`Self::new`]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// How many data rules fit next to the sentinel
    pub const fn data_capacity(&self) -> usize {
        self.len() - 1
    }

    pub const fn overlaps(&self, other: &RuleIdRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for RuleIdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
