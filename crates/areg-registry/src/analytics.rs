use serde::{Deserialize, Serialize};

use areg_types::Sequence;

/// Per-asset side counters and the running rating mean.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsRecord {
    pub views: u64,
    pub downloads: u64,
    pub collaborations: u64,
    pub last_access: Option<Sequence>,
    /// Running mean, truncated toward zero after every rating.
    pub average_rating: u64,
    pub rating_count: u64,
}

impl AnalyticsRecord {
    pub fn record_view(&mut self, now: Sequence) {
        self.views += 1;
        self.last_access = Some(now);
    }

    pub fn record_download(&mut self, now: Sequence) {
        self.downloads += 1;
        self.last_access = Some(now);
    }

    pub fn record_collaboration(&mut self) {
        self.collaborations += 1;
    }

    /// Fold one rating into the mean and return the new average.
    ///
    /// `new = floor((old * count + rating) / (count + 1))`. The truncation at
    /// each step means the result can drift below the exact mean.
    pub fn apply_rating(&mut self, rating: u8) -> u64 {
        let count = u128::from(self.rating_count);
        let total = u128::from(self.average_rating) * count + u128::from(rating);
        // The quotient never exceeds the largest rating, so it fits.
        self.average_rating = (total / (count + 1)) as u64;
        self.rating_count += 1;
        self.average_rating
    }
}
