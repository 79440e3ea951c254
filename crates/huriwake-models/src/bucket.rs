//! Person-count buckets.
//!
//! Every detected count maps to exactly one bucket. The mapping is total and
//! pure; folder names for each bucket come from [`crate::FolderLayout`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification bucket derived from a detected subject count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bucket {
    /// 3 to 5 people
    #[serde(rename = "3~5")]
    ThreeToFive,
    /// 6 to 10 people
    #[serde(rename = "6~10")]
    SixToTen,
    /// 11 or more people
    #[serde(rename = "11+")]
    ElevenPlus,
    /// Fewer than 3 people
    #[serde(rename = "other")]
    Other,
}

impl Bucket {
    /// All buckets in review order. Reclassify actions index into this list.
    pub const ALL: [Bucket; 4] = [
        Bucket::ThreeToFive,
        Bucket::SixToTen,
        Bucket::ElevenPlus,
        Bucket::Other,
    ];

    /// Classify a detected count.
    pub fn classify(count: u32) -> Self {
        match count {
            3..=5 => Bucket::ThreeToFive,
            6..=10 => Bucket::SixToTen,
            11.. => Bucket::ElevenPlus,
            _ => Bucket::Other,
        }
    }

    /// Canonical label.
    pub fn label(&self) -> &'static str {
        match self {
            Bucket::ThreeToFive => "3~5",
            Bucket::SixToTen => "6~10",
            Bucket::ElevenPlus => "11+",
            Bucket::Other => "other",
        }
    }

    /// Zero-based position in [`Bucket::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Bucket::ThreeToFive => 0,
            Bucket::SixToTen => 1,
            Bucket::ElevenPlus => 2,
            Bucket::Other => 3,
        }
    }

    /// Look up a bucket by its one-based review number (`cat1` is the first bucket).
    pub fn from_number(number: u32) -> Option<Self> {
        let index = usize::try_from(number).ok()?.checked_sub(1)?;
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a detected count.
pub fn classify(count: u32) -> Bucket {
    Bucket::classify(count)
}
