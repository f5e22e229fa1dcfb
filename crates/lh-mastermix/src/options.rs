//! Consolidation options.

use lh_core::{VOLUME_EPSILON_UL, ensure_finite};

use crate::error::{MastermixError, MastermixResult};
use crate::keys::ReagentKey;

/// Tuning for mastermix consolidation. Volumes in uL.
#[derive(Clone, Debug, PartialEq)]
pub struct MastermixOptions {
    /// Smallest volume worth transferring on its own; reagents below it get pooled.
    pub min_transfer: f64,
    /// Largest volume a single mastermix well may hold.
    pub max_volume: f64,
    /// Reactions prepared beyond the number of wells served.
    pub extra_reactions: u32,
    /// Reagent name pairs that must never share a mastermix.
    pub excluded: Vec<(String, String)>,
    /// Fixed walk-order seed. Disables retries.
    pub seed: Option<u64>,
    /// Retry budget when no seed is given.
    pub max_attempts: u32,
    /// Dead volume of the mastermix plate. Prepared on top of what the wells draw.
    pub dead_volume: f64,
}

impl Default for MastermixOptions {
    fn default() -> Self {
        Self {
            min_transfer: 5.0,
            max_volume: 2000.0,
            extra_reactions: 1,
            excluded: Vec::new(),
            seed: None,
            max_attempts: 1000,
            dead_volume: 0.0,
        }
    }
}

impl MastermixOptions {
    pub fn validate(&self) -> MastermixResult<()> {
        let invalid = |reason: String| Err(MastermixError::InvalidOptions { reason });
        for (what, value) in [
            ("min_transfer", self.min_transfer),
            ("max_volume", self.max_volume),
        ] {
            if ensure_finite(value, "mastermix volume").is_err() || value <= 0.0 {
                return invalid(format!("{what} must be positive, got {value}"));
            }
        }
        if self.max_volume < self.min_transfer {
            return invalid(format!(
                "max_volume {} is below min_transfer {}",
                self.max_volume, self.min_transfer
            ));
        }
        if ensure_finite(self.dead_volume, "dead volume").is_err() || self.dead_volume < 0.0 {
            return invalid(format!("dead_volume must be non-negative, got {}", self.dead_volume));
        }
        if self.max_attempts == 0 {
            return invalid("max_attempts must be at least 1".to_string());
        }
        Ok(())
    }

    /// True when `a` and `b` may not be pooled.
    pub fn is_excluded(&self, a: &str, b: &str) -> bool {
        self.excluded
            .iter()
            .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
    }

    /// True when `candidate` may join a mastermix already holding `members`.
    pub fn compatible<'a>(
        &self,
        members: impl IntoIterator<Item = &'a ReagentKey>,
        candidate: &ReagentKey,
    ) -> bool {
        members.into_iter().all(|m| {
            m != candidate
                && m.name() != candidate.name()
                && !self.is_excluded(m.name(), candidate.name())
        })
    }

    /// Reactions to prepare for `members` serving `wells` wells.
    ///
    /// One count for the whole mix: every well plus the margin, enough extra
    /// to leave the plate's dead volume behind, and enough for the smallest
    /// member to be transferable into the mastermix.
    pub fn reactions(&self, members: &[ReagentKey], wells: usize) -> u64 {
        let per_well: f64 = members.iter().map(ReagentKey::volume).sum();
        let v_min = members
            .iter()
            .map(ReagentKey::volume)
            .fold(f64::INFINITY, f64::min);
        let mut count = wells as u64 + self.extra_reactions as u64;
        if per_well > 0.0 && per_well.is_finite() && self.dead_volume > 0.0 {
            count += (self.dead_volume / per_well - VOLUME_EPSILON_UL).ceil().max(0.0) as u64;
        }
        if v_min > 0.0 && v_min.is_finite() {
            count = count.max((self.min_transfer / v_min).ceil() as u64);
        }
        count
    }

    /// Total prepared volume of a mastermix of `members` over `wells` wells.
    pub fn prepared_volume(&self, members: &[ReagentKey], wells: usize) -> f64 {
        let per_well: f64 = members.iter().map(ReagentKey::volume).sum();
        per_well * self.reactions(members, wells) as f64
    }

    /// True when the prepared mastermix stays within `max_volume`.
    pub fn fits(&self, members: &[ReagentKey], wells: usize) -> bool {
        self.prepared_volume(members, wells) <= self.max_volume
    }
}
