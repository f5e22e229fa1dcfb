//! Protocol aggregate: the layouts of one planning run and the transfer lists
//! generated for them.

use lh_labware::{Layout, ProfileLookup};

use crate::action::TransferList;
use crate::error::PlanResult;
use crate::feasibility::FeasibilityReport;
use crate::planner::{PlanOutcome, plan_transfers};

#[derive(Debug, Clone)]
pub struct Protocol {
    title: String,
    sources: Vec<Layout>,
    destinations: Vec<Layout>,
    transfer_lists: Vec<TransferList>,
    reports: Vec<FeasibilityReport>,
}

impl Protocol {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sources: Vec::new(),
            destinations: Vec::new(),
            transfer_lists: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Plan `sources` into `destinations` in a single stage.
    pub fn plan(
        title: impl Into<String>,
        sources: Vec<Layout>,
        destinations: Vec<Layout>,
        profiles: &impl ProfileLookup,
    ) -> PlanResult<Self> {
        let mut protocol = Self::new(title);
        protocol.plan_stage(sources, destinations, profiles)?;
        Ok(protocol)
    }

    /// Plan one more stage and append its transfer lists.
    ///
    /// On failure nothing is added and the given layouts are dropped.
    pub fn plan_stage(
        &mut self,
        sources: Vec<Layout>,
        destinations: Vec<Layout>,
        profiles: &impl ProfileLookup,
    ) -> PlanResult<()> {
        let outcome = plan_transfers(sources, &destinations, profiles)?;
        self.record(outcome, destinations);
        Ok(())
    }

    /// Append a planning outcome together with the destinations it served.
    pub fn record(&mut self, outcome: PlanOutcome, destinations: Vec<Layout>) {
        self.sources.extend(outcome.sources);
        self.destinations.extend(destinations);
        self.transfer_lists.extend(outcome.transfer_lists);
        self.reports.push(outcome.report);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn sources(&self) -> &[Layout] {
        &self.sources
    }

    pub fn destinations(&self) -> &[Layout] {
        &self.destinations
    }

    pub fn transfer_lists(&self) -> &[TransferList] {
        &self.transfer_lists
    }

    pub fn reports(&self) -> &[FeasibilityReport] {
        &self.reports
    }

    pub fn action_count(&self) -> usize {
        self.transfer_lists.iter().map(TransferList::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lh_labware::{PlateProfiles, SourcePlateProfile, WellId};

    #[test]
    fn stages_accumulate() {
        let a1: WellId = "A1".parse().unwrap();
        let profiles = PlateProfiles::empty().with(
            "Src",
            SourcePlateProfile::new("Src", 1.0, 1.0, 100.0).unwrap(),
        );

        let mut s = Layout::new("S", "Src", 16, 24).unwrap();
        s.add_content(a1, "Red", 10.0, None).unwrap();
        let mut d = Layout::new("D", "96", 8, 12).unwrap();
        d.add_content(a1, "Red", 2.0, None).unwrap();

        let mut protocol = Protocol::plan("Run", vec![s], vec![d], &profiles).unwrap();
        assert_eq!(protocol.action_count(), 2);

        let mut s2 = Layout::new("S2", "Src", 16, 24).unwrap();
        s2.add_content(a1, "Blue", 10.0, None).unwrap();
        let mut d2 = Layout::new("D2", "96", 8, 12).unwrap();
        d2.add_content(a1, "Blue", 1.0, None).unwrap();
        protocol.plan_stage(vec![s2], vec![d2], &profiles).unwrap();

        assert_eq!(protocol.title(), "Run");
        assert_eq!(protocol.transfer_lists().len(), 2);
        assert_eq!(protocol.sources().len(), 2);
        assert_eq!(protocol.destinations().len(), 2);
        assert_eq!(protocol.reports().len(), 2);
        assert_eq!(protocol.action_count(), 3);
    }
}
