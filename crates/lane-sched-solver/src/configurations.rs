// Copyright (c) 2025 Felix Kahle.
//
// Permission is hereby granted, free of charge, to any person obtaining
// a copy of this software and associated documentation files (the
// "Software"), to deal in the Software without restriction, including
// without limitation the rights to use, copy, modify, merge, publish,
// distribute, sublicense, and/or sell copies of the Software, and to
// permit persons to whom the Software is furnished to do so, subject to
// the following conditions:
//
// The above copyright notice and this permission notice shall be
// included in all copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND,
// EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF
// MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
// NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE
// LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION
// OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION
// WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! # Configurations Manager
//!
//! Collects the candidate relocations for the current violator and keeps
//! the best one under (plan makespan, hard, soft, duration summary).
//! While the violator's current position caps the makespan, candidates
//! are tried by physically moving it so successive trials see an
//! up-to-date plan; otherwise a throwaway placement is evaluated without
//! touching the plan. Lane-switching items that fail a trial retry once
//! per alternative duration map.
//!
//! Escape attempts feed whole candidate plans through the same manager,
//! ordered by (hard, makespan, soft).

use crate::{
    err::PlanError,
    plan::SchedulePlan,
    violations::{Violator, ViolationsManager, ViolatorUpdate},
};
use lane_sched_core::{
    SolverVariable,
    severity::Severity,
    time::{TimeDelta, TimePoint},
};
use lane_sched_model::item::ScheduledItem;
use std::sync::Arc;

/// One improving candidate placement for the current violator.
#[derive(Debug, Clone)]
pub struct Configuration<T: SolverVariable, C: SolverVariable> {
    item: ScheduledItem<T>,
    update: ViolatorUpdate<T, C>,
    plan_makespan: TimePoint<T>,
}

impl<T: SolverVariable, C: SolverVariable> Configuration<T, C> {
    #[inline]
    fn key(&self) -> (TimePoint<T>, Severity<C>, Severity<C>, TimeDelta<T>) {
        (
            self.plan_makespan,
            self.update.violator().hard(),
            self.update.violator().soft(),
            self.item.item().duration_summary(),
        )
    }

    #[inline]
    pub fn item(&self) -> &ScheduledItem<T> {
        &self.item
    }

    #[inline]
    pub fn plan_makespan(&self) -> TimePoint<T> {
        self.plan_makespan
    }
}

/// A whole candidate replacement plan with its comparison metric.
#[derive(Debug, Clone)]
pub struct PlanConfiguration<T: SolverVariable, C: SolverVariable> {
    plan: SchedulePlan<T>,
    hard: Severity<C>,
    soft: Severity<C>,
    makespan: TimePoint<T>,
}

impl<T: SolverVariable, C: SolverVariable> PlanConfiguration<T, C> {
    #[inline]
    fn key(&self) -> (Severity<C>, TimePoint<T>, Severity<C>) {
        (self.hard, self.makespan, self.soft)
    }

    #[inline]
    pub fn plan(&self) -> &SchedulePlan<T> {
        &self.plan
    }

    #[inline]
    pub fn hard(&self) -> Severity<C> {
        self.hard
    }

    #[inline]
    pub fn soft(&self) -> Severity<C> {
        self.soft
    }

    #[inline]
    pub fn makespan(&self) -> TimePoint<T> {
        self.makespan
    }

    #[inline]
    pub fn into_plan(self) -> SchedulePlan<T> {
        self.plan
    }
}

#[derive(Debug, Default)]
pub struct ConfigurationsManager<T: SolverVariable, C: SolverVariable> {
    reference: Option<ScheduledItem<T>>,
    best: Option<Configuration<T, C>>,
    best_plan: Option<PlanConfiguration<T, C>>,
}

impl<T: SolverVariable, C: SolverVariable> ConfigurationsManager<T, C> {
    pub fn new() -> Self {
        Self {
            reference: None,
            best: None,
            best_plan: None,
        }
    }

    /// Starts a fresh relocation attempt for `violator`.
    pub fn reset(&mut self, violator: &Violator<T, C>) {
        self.reference = Some(violator.item().clone());
        self.best = None;
    }

    #[inline]
    pub fn reference(&self) -> Option<&ScheduledItem<T>> {
        self.reference.as_ref()
    }

    /// Evaluates placing the current violator at `candidate`. Returns
    /// whether any improving configuration was registered.
    pub fn add_configuration(
        &mut self,
        violations: &mut ViolationsManager<T, C>,
        plan: &mut SchedulePlan<T>,
        candidate: TimePoint<T>,
    ) -> Result<bool, PlanError> {
        let reference = self
            .reference
            .clone()
            .expect("reset must precede add_configuration");
        if candidate == reference.start() {
            return Ok(false);
        }
        let id = reference.id();
        let current = plan
            .get(id)
            .cloned()
            .expect("the violator is scheduled");

        // While the violator caps the makespan, move it for real so the
        // remaining candidates are judged against the relaxed plan.
        let placed = if current.latest_end() == plan.makespan() {
            plan.move_item(id, candidate)?
        } else {
            current.with_start(candidate)
        };

        if let Some(update) = violations.try_violator_update(&placed, plan) {
            self.register(placed, update, plan);
            return Ok(true);
        }

        // A stuck lane-switching item may still fit with one of its
        // alternative duration maps.
        if placed.item().is_lane_switching() {
            let mut any = false;
            for index in 0..placed.item().alternatives().len() {
                let switched = placed
                    .item()
                    .switched(index)
                    .expect("alternative indices are in range");
                let rendition = ScheduledItem::new(Arc::new(switched), candidate);
                if let Some(update) = violations.try_violator_update(&rendition, plan) {
                    self.register(rendition, update, plan);
                    any = true;
                }
            }
            return Ok(any);
        }

        Ok(false)
    }

    fn register(
        &mut self,
        item: ScheduledItem<T>,
        update: ViolatorUpdate<T, C>,
        plan: &SchedulePlan<T>,
    ) {
        let plan_makespan = plan.makespan().max(item.latest_end());
        let configuration = Configuration {
            item,
            update,
            plan_makespan,
        };
        let better = match &self.best {
            None => true,
            Some(best) => configuration.key() < best.key(),
        };
        if better {
            self.best = Some(configuration);
        }
    }

    /// Exchanges the violator's placement with the best configuration and
    /// commits the trial update. Returns `false` when nothing improved.
    pub fn apply_best_configuration(
        &mut self,
        violations: &mut ViolationsManager<T, C>,
        plan: &mut SchedulePlan<T>,
    ) -> Result<bool, PlanError> {
        let Some(best) = self.best.take() else {
            return Ok(false);
        };
        let id = best.item.id();
        let current = plan
            .get(id)
            .cloned()
            .expect("the violator is scheduled");
        plan.exchange(&current, best.item.clone())?;
        violations.update_violator(best.update);
        Ok(true)
    }

    /// Moves the violator back to where the attempt started, undoing the
    /// in-place candidate trials.
    pub fn apply_reference_configuration(
        &mut self,
        plan: &mut SchedulePlan<T>,
    ) -> Result<(), PlanError> {
        let Some(reference) = self.reference.clone() else {
            return Ok(());
        };
        let current = plan
            .get(reference.id())
            .cloned()
            .expect("the violator is scheduled");
        if current.start() != reference.start() {
            plan.move_item(reference.id(), reference.start())?;
        }
        Ok(())
    }

    /// Forgets plan candidates from a previous escape.
    pub fn reset_plan_configurations(&mut self) {
        self.best_plan = None;
    }

    /// Offers a candidate replacement plan with its whole-plan metric.
    pub fn add_plan_configuration(
        &mut self,
        plan: SchedulePlan<T>,
        hard: Severity<C>,
        soft: Severity<C>,
    ) {
        let makespan = plan.makespan();
        let configuration = PlanConfiguration {
            plan,
            hard,
            soft,
            makespan,
        };
        let better = match &self.best_plan {
            None => true,
            Some(best) => configuration.key() < best.key(),
        };
        if better {
            self.best_plan = Some(configuration);
        }
    }

    /// The best candidate plan collected so far, if any.
    pub fn take_best_plan_configuration(&mut self) -> Option<PlanConfiguration<T, C>> {
        self.best_plan.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::prelude::{
        DependencyConstraint, NoOverlapConstraint, StartNowConstraint,
    };
    use lane_sched_core::time::TimeDelta;
    use lane_sched_model::{
        id::{ItemId, LaneId},
        item::Item,
    };
    use std::collections::BTreeMap;

    fn item(id: u64, lane: u32, duration: i64) -> Arc<Item<i64>> {
        let mut durations = BTreeMap::new();
        durations.insert(LaneId::new(lane), TimeDelta::new(duration));
        Arc::new(Item::new(ItemId::new(id), durations, vec![]).unwrap())
    }

    fn manager() -> ViolationsManager<i64, i64> {
        ViolationsManager::new(
            vec![Arc::new(StartNowConstraint::new())],
            vec![
                Arc::new(NoOverlapConstraint::new()),
                Arc::new(DependencyConstraint::new()),
            ],
            false,
        )
    }

    #[test]
    fn test_skips_reference_start() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10), TimePoint::new(0)).unwrap();
        plan.add(item(2, 0, 10), TimePoint::new(0)).unwrap();
        let mut violations = manager();
        violations.initialize(&plan);

        let violator = violations.biggest_violator(None).unwrap();
        let mut configurations = ConfigurationsManager::new();
        configurations.reset(&violator);
        let added = configurations
            .add_configuration(&mut violations, &mut plan, violator.item().start())
            .unwrap();
        assert!(!added);
    }

    #[test]
    fn test_finds_and_applies_improving_move() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10), TimePoint::new(0)).unwrap();
        plan.add(item(2, 0, 10), TimePoint::new(0)).unwrap();
        let mut violations = manager();
        violations.initialize(&plan);

        let violator = violations.biggest_violator(None).unwrap();
        let mut configurations = ConfigurationsManager::new();
        configurations.reset(&violator);
        for candidate in plan.start_candidates() {
            configurations
                .add_configuration(&mut violations, &mut plan, candidate)
                .unwrap();
        }
        let applied = configurations
            .apply_best_configuration(&mut violations, &mut plan)
            .unwrap();
        assert!(applied);
        // The pair no longer overlaps.
        let worst = violations.biggest_violator(None).unwrap();
        assert!(worst.hard().is_zero());
        assert_eq!(plan.makespan(), TimePoint::new(20));
    }

    #[test]
    fn test_reference_restores_in_place_trials() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10), TimePoint::new(0)).unwrap();
        let mut violations = manager();
        violations.initialize(&plan);

        // The only item always caps the makespan, so candidate trials
        // physically move it.
        let violator = violations.biggest_violator(None).unwrap();
        let mut configurations = ConfigurationsManager::new();
        configurations.reset(&violator);
        configurations
            .add_configuration(&mut violations, &mut plan, TimePoint::new(500))
            .unwrap();
        assert_eq!(
            plan.get(ItemId::new(1)).unwrap().start(),
            TimePoint::new(500)
        );
        configurations.apply_reference_configuration(&mut plan).unwrap();
        assert_eq!(plan.get(ItemId::new(1)).unwrap().start(), TimePoint::zero());
    }

    #[test]
    fn test_switching_item_retries_alternatives() {
        let mut durations = BTreeMap::new();
        durations.insert(LaneId::new(0), TimeDelta::new(10));
        let mut alternative = BTreeMap::new();
        alternative.insert(LaneId::new(1), TimeDelta::new(10));
        let switcher = Arc::new(
            Item::with_alternatives(ItemId::new(2), durations, vec![], vec![alternative]).unwrap(),
        );

        let mut plan = SchedulePlan::new();
        // Lane 0 is blocked for good by a fixed item.
        let blocker = plan.add(item(1, 0, 100), TimePoint::new(0)).unwrap();
        plan.fixate(&blocker).unwrap();
        plan.add(Arc::clone(&switcher), TimePoint::new(0)).unwrap();

        let mut violations = manager();
        violations.initialize(&plan);
        let violator = violations.biggest_violator(None).unwrap();
        assert_eq!(violator.id(), ItemId::new(2));

        let mut configurations = ConfigurationsManager::new();
        configurations.reset(&violator);
        // Start 5 still overlaps the blocker on lane 0, but the
        // alternative rendition on lane 1 is conflict-free.
        let added = configurations
            .add_configuration(&mut violations, &mut plan, TimePoint::new(5))
            .unwrap();
        assert!(added);
        configurations
            .apply_best_configuration(&mut violations, &mut plan)
            .unwrap();

        let placed = plan.get(ItemId::new(2)).unwrap();
        assert!(placed.item().duration_on(LaneId::new(1)).is_some());
        assert_eq!(placed.start(), TimePoint::new(5));
        // The old active map is offered back as an alternative.
        assert_eq!(placed.item().alternatives().len(), 1);
    }

    #[test]
    fn test_best_plan_ordering_prefers_fewer_hard() {
        let mut configurations: ConfigurationsManager<i64, i64> = ConfigurationsManager::new();
        let mut plan_a = SchedulePlan::new();
        plan_a.add(item(1, 0, 10), TimePoint::new(0)).unwrap();
        let mut plan_b = SchedulePlan::new();
        plan_b.add(item(1, 0, 10), TimePoint::new(90)).unwrap();

        // Shorter plan but with hard load loses against hard-free plan.
        configurations.add_plan_configuration(plan_a, Severity::new(5), Severity::zero());
        configurations.add_plan_configuration(plan_b, Severity::zero(), Severity::new(90));
        let best = configurations.take_best_plan_configuration().unwrap();
        assert!(best.hard().is_zero());
        assert_eq!(best.makespan(), TimePoint::new(100));
    }
}
