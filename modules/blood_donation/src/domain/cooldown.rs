use chrono::{DateTime, Duration, Utc};

use crate::contract::model::CooldownRemaining;

pub const DEFAULT_COOLDOWN_DAYS: u32 = 59;
/// Upper bound accepted from configuration.
pub const MAX_COOLDOWN_DAYS: u32 = 3_650;

/// Post-donation waiting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    period: Duration,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self::from_days(DEFAULT_COOLDOWN_DAYS)
    }
}

impl CooldownPolicy {
    pub fn from_days(days: u32) -> Self {
        Self {
            period: Duration::days(i64::from(days)),
        }
    }

    /// Saturates at the latest representable instant.
    pub fn ends_at(&self, donated_at: DateTime<Utc>) -> DateTime<Utc> {
        donated_at
            .checked_add_signed(self.period)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// The end instant itself is already outside the window.
    pub fn is_active(&self, donated_at: DateTime<Utc>, as_of: DateTime<Utc>) -> bool {
        as_of < self.ends_at(donated_at)
    }

    pub fn remaining(
        &self,
        donated_at: DateTime<Utc>,
        as_of: DateTime<Utc>,
    ) -> Option<CooldownRemaining> {
        self.is_active(donated_at, as_of).then(|| {
            CooldownRemaining::from_seconds((self.ends_at(donated_at) - as_of).num_seconds())
        })
    }
}
