//! Greedy mastermix assignment and the retry loop around it.
//!
//! One attempt walks the allocation units below `min_transfer` in a given
//! order and grows a mastermix for each:
//!
//! 1. start from the unit's still-unserved wells and pull in its linked units
//! 2. while the per-well volume is under `min_transfer`, absorb the donor
//!    (unused unit first, else an earlier mastermix) with the largest
//!    well overlap; the part of the well-set the donor does not cover is
//!    pushed on a split stack and grown afterwards
//! 3. finalize and subtract the served wells from every member
//!
//! The attempt ends in [`Attempt::Solved`] or [`Attempt::NoSolution`]. The
//! retry loop re-runs it with shuffled walk orders until one solves, the
//! budget is spent, or a fixed seed was requested.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use lh_core::VOLUME_EPSILON_UL;
use tracing::{debug, info};

use crate::analysis::{Units, linked_groups};
use crate::error::{Infeasible, InfeasibleCause, MastermixError, MastermixResult};
use crate::keys::{DestWell, ReagentKey};
use crate::options::MastermixOptions;
use crate::order::WalkOrder;

/// A solved mastermix before it is named and placed on a plate.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub members: Vec<ReagentKey>,
    pub wells: BTreeSet<DestWell>,
}

impl Draft {
    /// Sum of member volumes delivered to each well, uL.
    pub fn per_well_volume(&self) -> f64 {
        self.members.iter().map(ReagentKey::volume).sum()
    }
}

/// Outcome of one greedy pass.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Solved(Vec<Draft>),
    NoSolution(Infeasible),
}

/// Where a candidate member came from, so finalizing can debit the right pool.
#[derive(Debug, Clone)]
enum Part {
    Unit(ReagentKey),
    Mix(usize),
}

#[derive(Debug, Clone)]
struct Candidate {
    parts: Vec<Part>,
    members: Vec<ReagentKey>,
    wells: BTreeSet<DestWell>,
}

impl Candidate {
    fn seed(key: &ReagentKey, wells: BTreeSet<DestWell>) -> Self {
        Self {
            parts: vec![Part::Unit(key.clone())],
            members: vec![key.clone()],
            wells,
        }
    }

    fn volume(&self) -> f64 {
        self.members.iter().map(ReagentKey::volume).sum()
    }

    fn with(&self, extra: &[ReagentKey]) -> Vec<ReagentKey> {
        self.members.iter().chain(extra).cloned().collect()
    }
}

struct Donor {
    part: Part,
    members: Vec<ReagentKey>,
    overlap: BTreeSet<DestWell>,
}

struct Assignment<'a> {
    options: &'a MastermixOptions,
    linked: &'a IndexMap<ReagentKey, Vec<ReagentKey>>,
    order: &'a [ReagentKey],
    unserved: IndexMap<ReagentKey, BTreeSet<DestWell>>,
    drafts: Vec<Draft>,
}

/// Run one greedy pass over `order`.
pub fn solve(
    units: &Units,
    linked: &IndexMap<ReagentKey, Vec<ReagentKey>>,
    order: &[ReagentKey],
    options: &MastermixOptions,
) -> Attempt {
    let mut assignment = Assignment {
        options,
        linked,
        order,
        unserved: units.demand(),
        drafts: Vec::new(),
    };
    match assignment.run() {
        Ok(()) => Attempt::Solved(assignment.drafts),
        Err(reason) => Attempt::NoSolution(reason),
    }
}

impl Assignment<'_> {
    fn run(&mut self) -> Result<(), Infeasible> {
        let threshold = self.options.min_transfer - VOLUME_EPSILON_UL;
        let order = self.order;
        for key in order.iter().filter(|k| k.volume() < threshold) {
            let wells = self.unserved_wells(key);
            if wells.is_empty() {
                continue;
            }
            let mut seed = Candidate::seed(key, wells);
            self.add_linked(&mut seed);

            let mut pending = vec![seed];
            while let Some(mut candidate) = pending.pop() {
                self.grow(&mut candidate, &mut pending)?;
                self.finalize(candidate)?;
            }
        }
        Ok(())
    }

    fn unserved_wells(&self, key: &ReagentKey) -> BTreeSet<DestWell> {
        self.unserved.get(key).cloned().unwrap_or_default()
    }

    fn add_linked(&self, candidate: &mut Candidate) {
        let Some(linked) = candidate.members.first().and_then(|k| self.linked.get(k)) else {
            return;
        };
        for other in linked {
            let covers = self
                .unserved
                .get(other)
                .is_some_and(|w| w.is_superset(&candidate.wells));
            if covers
                && self.options.compatible(&candidate.members, other)
                && self
                    .options
                    .fits(&candidate.with(std::slice::from_ref(other)), candidate.wells.len())
            {
                candidate.parts.push(Part::Unit(other.clone()));
                candidate.members.push(other.clone());
            }
        }
    }

    fn grow(
        &self,
        candidate: &mut Candidate,
        pending: &mut Vec<Candidate>,
    ) -> Result<(), Infeasible> {
        while candidate.volume() < self.options.min_transfer - VOLUME_EPSILON_UL {
            let Some(donor) = self
                .unit_donor(candidate)
                .or_else(|| self.mix_donor(candidate))
            else {
                return Err(Infeasible {
                    reagent: candidate.members[0].clone(),
                    wells: candidate.wells.len(),
                    cause: InfeasibleCause::NoDonor,
                });
            };

            let leftover: BTreeSet<DestWell> =
                candidate.wells.difference(&donor.overlap).copied().collect();
            if !leftover.is_empty() {
                pending.push(Candidate {
                    parts: candidate.parts.clone(),
                    members: candidate.members.clone(),
                    wells: leftover,
                });
            }
            candidate.wells = donor.overlap;
            candidate.parts.push(donor.part);
            candidate.members.extend(donor.members);
        }
        Ok(())
    }

    /// Unused unit with the largest overlap; the earliest in walk order wins ties.
    fn unit_donor(&self, candidate: &Candidate) -> Option<Donor> {
        let mut best: Option<Donor> = None;
        for key in self.order {
            if !self.options.compatible(&candidate.members, key) {
                continue;
            }
            let Some(wells) = self.unserved.get(key) else {
                continue;
            };
            let overlap: BTreeSet<DestWell> =
                wells.intersection(&candidate.wells).copied().collect();
            if overlap.is_empty()
                || best.as_ref().is_some_and(|b| b.overlap.len() >= overlap.len())
                || !self
                    .options
                    .fits(&candidate.with(std::slice::from_ref(key)), overlap.len())
            {
                continue;
            }
            best = Some(Donor {
                part: Part::Unit(key.clone()),
                members: vec![key.clone()],
                overlap,
            });
        }
        best
    }

    /// Earlier mastermix with the largest overlap.
    fn mix_donor(&self, candidate: &Candidate) -> Option<Donor> {
        let mut best: Option<Donor> = None;
        for (idx, draft) in self.drafts.iter().enumerate() {
            if !draft
                .members
                .iter()
                .all(|m| self.options.compatible(&candidate.members, m))
            {
                continue;
            }
            let overlap: BTreeSet<DestWell> =
                draft.wells.intersection(&candidate.wells).copied().collect();
            if overlap.is_empty()
                || best.as_ref().is_some_and(|b| b.overlap.len() >= overlap.len())
                || !self.options.fits(&candidate.with(&draft.members), overlap.len())
            {
                continue;
            }
            best = Some(Donor {
                part: Part::Mix(idx),
                members: draft.members.clone(),
                overlap,
            });
        }
        best
    }

    fn finalize(&mut self, candidate: Candidate) -> Result<(), Infeasible> {
        let wells = candidate.wells.len();
        if !self.options.fits(&candidate.members, wells) {
            return Err(Infeasible {
                reagent: candidate.members[0].clone(),
                wells,
                cause: InfeasibleCause::ExceedsMaximum {
                    volume: self.options.prepared_volume(&candidate.members, wells),
                    max_volume: self.options.max_volume,
                },
            });
        }
        for part in &candidate.parts {
            let pool = match part {
                Part::Unit(key) => self.unserved.get_mut(key),
                Part::Mix(idx) => self.drafts.get_mut(*idx).map(|d| &mut d.wells),
            };
            if let Some(pool) = pool {
                pool.retain(|w| !candidate.wells.contains(w));
            }
        }
        self.drafts.push(Draft {
            members: candidate.members,
            wells: candidate.wells,
        });
        Ok(())
    }
}

/// Solve with retries. Returns the drafts and the number of attempts made.
///
/// Without a seed the first attempt walks in ascending-volume order and
/// retry `n` shuffles with seed `n - 1`. With a seed exactly one shuffled
/// attempt runs.
pub fn search(
    units: &Units,
    options: &MastermixOptions,
    walk: &mut impl WalkOrder,
) -> MastermixResult<(Vec<Draft>, u32)> {
    let linked = linked_groups(units, options);
    let ascending = units.ascending();

    let mut attempt: u32 = 0;
    loop {
        let seed = match (options.seed, attempt) {
            (Some(seed), _) => Some(seed),
            (None, 0) => None,
            (None, n) => Some(u64::from(n) - 1),
        };
        attempt += 1;

        let mut order = ascending.clone();
        if let Some(seed) = seed {
            walk.arrange(seed, &mut order);
        }
        match solve(units, &linked, &order, options) {
            Attempt::Solved(drafts) => {
                info!(
                    attempts = attempt,
                    mastermixes = drafts.len(),
                    "mastermix assignment solved"
                );
                return Ok((drafts, attempt));
            }
            Attempt::NoSolution(reason) => {
                debug!(attempt, ?seed, %reason, "mastermix attempt failed");
                if options.seed.is_some() || attempt >= options.max_attempts {
                    return Err(MastermixError::NoSolution {
                        attempts: attempt,
                        reason,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lh_labware::Layout;

    fn opts() -> MastermixOptions {
        MastermixOptions {
            min_transfer: 2.0,
            max_volume: 1000.0,
            extra_reactions: 1,
            ..Default::default()
        }
    }

    fn run(destination: Layout, options: &MastermixOptions) -> Attempt {
        let units = Units::from_destinations(&[destination]);
        let linked = linked_groups(&units, options);
        solve(&units, &linked, &units.ascending(), options)
    }

    #[test]
    fn linked_pair_forms_one_mastermix() {
        let mut d = Layout::new("Dest", "96", 8, 12).unwrap();
        d.add_content_to_range("A4:A6", "Inducer", 1.0, None).unwrap();
        d.add_content_to_range("A4:A6", "LB", 80.0, None).unwrap();
        let Attempt::Solved(drafts) = run(d, &opts()) else {
            panic!("expected a solution");
        };
        assert_eq!(drafts.len(), 1);
        assert_eq!(
            drafts[0].members,
            vec![ReagentKey::new("Inducer", 1.0), ReagentKey::new("LB", 80.0)]
        );
        assert_eq!(drafts[0].wells.len(), 3);
        assert_eq!(drafts[0].per_well_volume(), 81.0);
    }

    #[test]
    fn partial_donor_splits_the_well_set() {
        // Dye sits in four wells; Water only covers two of them, Buffer the other two
        let mut d = Layout::new("Dest", "96", 8, 12).unwrap();
        d.add_content_to_range("A1:A4", "Dye", 0.5, None).unwrap();
        d.add_content_to_range("A1:A2", "Water", 10.0, None).unwrap();
        d.add_content_to_range("A3:A4", "Buffer", 5.0, None).unwrap();
        let Attempt::Solved(drafts) = run(d, &opts()) else {
            panic!("expected a solution");
        };
        assert_eq!(drafts.len(), 2);
        let names: Vec<Vec<&str>> = drafts
            .iter()
            .map(|d| d.members.iter().map(ReagentKey::name).collect())
            .collect();
        assert!(names.contains(&vec!["Dye", "Water"]));
        assert!(names.contains(&vec!["Dye", "Buffer"]));
        assert!(drafts.iter().all(|d| d.wells.len() == 2));
    }

    #[test]
    fn earlier_mastermix_can_donate() {
        // Tag only shares wells with the Dye+Water mastermix
        let mut d = Layout::new("Dest", "96", 8, 12).unwrap();
        d.add_content_to_range("A1:A2", "Dye", 0.5, None).unwrap();
        d.add_content_to_range("A1:A2", "Water", 10.0, None).unwrap();
        d.add_content(lh_labware::WellId::new(0, 0), "Tag", 1.0, None).unwrap();
        let options = opts();
        let units = Units::from_destinations(&[d]);
        let linked = linked_groups(&units, &options);
        let order = vec![
            ReagentKey::new("Dye", 0.5),
            ReagentKey::new("Water", 10.0),
            ReagentKey::new("Tag", 1.0),
        ];
        let Attempt::Solved(drafts) = solve(&units, &linked, &order, &options) else {
            panic!("expected a solution");
        };
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].wells.len(), 1);
        assert_eq!(drafts[1].members.len(), 3);
        assert_eq!(drafts[1].wells.len(), 1);
    }

    #[test]
    fn excluded_partner_means_no_solution() {
        let mut d = Layout::new("Dest", "96", 8, 12).unwrap();
        d.add_content_to_range("A4:A6", "Inducer", 1.0, None).unwrap();
        d.add_content_to_range("A4:A6", "LB", 80.0, None).unwrap();
        let options = MastermixOptions {
            excluded: vec![("LB".into(), "Inducer".into())],
            ..opts()
        };
        let Attempt::NoSolution(reason) = run(d, &options) else {
            panic!("expected failure");
        };
        assert_eq!(reason.reagent, ReagentKey::new("Inducer", 1.0));
        assert_eq!(reason.cause, InfeasibleCause::NoDonor);
    }

    #[test]
    fn reagents_above_threshold_are_left_alone() {
        let mut d = Layout::new("Dest", "96", 8, 12).unwrap();
        d.add_content_to_range("A1:A3", "LB", 80.0, None).unwrap();
        d.add_content_to_range("A1:A3", "Glucose", 5.0, None).unwrap();
        let Attempt::Solved(drafts) = run(d, &opts()) else {
            panic!("expected a solution");
        };
        assert!(drafts.is_empty());
    }

    struct Reverse(Vec<u64>);

    impl WalkOrder for Reverse {
        fn arrange(&mut self, seed: u64, keys: &mut [ReagentKey]) {
            self.0.push(seed);
            keys.reverse();
        }
    }

    #[test]
    fn retries_until_budget_spent() {
        let mut d = Layout::new("Dest", "96", 8, 12).unwrap();
        d.add_content_to_range("A4:A6", "Inducer", 1.0, None).unwrap();
        d.add_content_to_range("A4:A6", "LB", 80.0, None).unwrap();
        let units = Units::from_destinations(&[d]);
        let options = MastermixOptions {
            excluded: vec![("LB".into(), "Inducer".into())],
            max_attempts: 4,
            ..opts()
        };
        let mut walk = Reverse(Vec::new());
        let err = search(&units, &options, &mut walk).unwrap_err();
        assert!(matches!(err, MastermixError::NoSolution { attempts: 4, .. }));
        assert_eq!(walk.0, [0, 1, 2]);
    }

    #[test]
    fn fixed_seed_runs_once() {
        let mut d = Layout::new("Dest", "96", 8, 12).unwrap();
        d.add_content_to_range("A4:A6", "Inducer", 1.0, None).unwrap();
        d.add_content_to_range("A4:A6", "LB", 80.0, None).unwrap();
        let units = Units::from_destinations(&[d]);
        let options = MastermixOptions {
            excluded: vec![("LB".into(), "Inducer".into())],
            seed: Some(42),
            ..opts()
        };
        let mut walk = Reverse(Vec::new());
        let err = search(&units, &options, &mut walk).unwrap_err();
        assert!(matches!(err, MastermixError::NoSolution { attempts: 1, .. }));
        assert_eq!(walk.0, [42]);
    }
}
