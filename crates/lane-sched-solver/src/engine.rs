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

//! # Heuristic-Repair Driver
//!
//! The min-conflicts style repair loop. A greedy start plan is improved
//! by repeatedly relocating the worst violator to its best candidate
//! start; when no violator can improve, the search bound narrows to the
//! next-smaller violator, and when that is exhausted too, one of three
//! local-optimum escapes perturbs the plan: rescheduling the stuck item's
//! dependency cone, shifting the conflict closure right past the
//! makespan, or making room on the left and shifting it back in.
//!
//! Items that never interact can be partitioned into independent
//! clusters and scheduled concurrently, sharing only the read-only
//! constraint lists.

use crate::{
    configurations::ConfigurationsManager,
    constraint::{ItemPairConstraint, SingleItemConstraint, UpdateableConstraint},
    constraints::prelude::{DependencyConstraint, NoOverlapConstraint, StartNowConstraint},
    err::{CircularConstraintError, SchedulingError},
    plan::SchedulePlan,
    violations::{Violator, ViolationsManager},
};
use lane_sched_core::{
    SolverVariable,
    time::{TimeDelta, TimePoint},
};
use lane_sched_model::{
    id::{ItemId, LaneId},
    item::{Item, ScheduledItem},
    problem::Problem,
};
use rayon::prelude::*;
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};
use tracing::{debug, instrument, trace};

/// Driver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Reuse the previous run's result as a warm start.
    pub caching_result_plan: bool,
    /// Schedule independent item clusters concurrently.
    pub parallel_scheduling: bool,
    /// Prune candidate starts with the conflict predictor.
    pub use_prediction: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            caching_result_plan: true,
            parallel_scheduling: false,
            use_prediction: true,
        }
    }
}

enum ShiftLockFailure {
    /// A locked item re-entered the violated set.
    Circular(ItemId),
    /// The closure reached a fixed item, which cannot be shifted.
    Fixed(ItemId),
}

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            rank: vec![0; len],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return;
        }
        match self.rank[ra].cmp(&self.rank[rb]) {
            std::cmp::Ordering::Less => self.parent[ra] = rb,
            std::cmp::Ordering::Greater => self.parent[rb] = ra,
            std::cmp::Ordering::Equal => {
                self.parent[rb] = ra;
                self.rank[ra] += 1;
            }
        }
    }
}

/// The heuristic-repair scheduler.
pub struct HeuristicRepairScheduler<T = i64, C = i64>
where
    T: SolverVariable,
    C: SolverVariable,
{
    config: SchedulerConfig,
    singles: Vec<Arc<dyn SingleItemConstraint<T, C>>>,
    pairs: Vec<Arc<dyn ItemPairConstraint<T, C>>>,
    updateables: Vec<Arc<dyn UpdateableConstraint<T>>>,
    cached_plan: Option<SchedulePlan<T>>,
    snapshots: Vec<Vec<ScheduledItem<T>>>,
    backsteps: u64,
}

impl<T, C> HeuristicRepairScheduler<T, C>
where
    T: SolverVariable + 'static,
    C: SolverVariable + TryFrom<T> + 'static,
{
    /// A scheduler with the default constraint set: no lane overlap,
    /// dependencies, and the start-now preference.
    pub fn new(config: SchedulerConfig) -> Self {
        Self::with_constraints(
            config,
            vec![Arc::new(StartNowConstraint::new())],
            vec![
                Arc::new(NoOverlapConstraint::new()),
                Arc::new(DependencyConstraint::new()),
            ],
            Vec::new(),
        )
    }
}

impl<T, C> HeuristicRepairScheduler<T, C>
where
    T: SolverVariable,
    C: SolverVariable,
{
    pub fn with_constraints(
        config: SchedulerConfig,
        singles: Vec<Arc<dyn SingleItemConstraint<T, C>>>,
        pairs: Vec<Arc<dyn ItemPairConstraint<T, C>>>,
        updateables: Vec<Arc<dyn UpdateableConstraint<T>>>,
    ) -> Self {
        Self {
            config,
            singles,
            pairs,
            updateables,
            cached_plan: None,
            snapshots: Vec::new(),
            backsteps: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// The per-step plan copies recorded during the last run.
    #[inline]
    pub fn snapshots(&self) -> &[Vec<ScheduledItem<T>>] {
        &self.snapshots
    }

    /// How often the last run failed to improve the current violator and
    /// had to narrow its bound or escape.
    #[inline]
    pub fn backsteps(&self) -> u64 {
        self.backsteps
    }

    pub fn clear_cached_result_plan(&mut self) {
        self.cached_plan = None;
    }

    /// Runs the repair loop on `problem` and returns the resulting plan.
    #[instrument(skip_all, fields(items = problem.total_items()))]
    pub fn schedule(&mut self, problem: &Problem<T>) -> Result<SchedulePlan<T>, SchedulingError<T>> {
        self.snapshots.clear();
        self.backsteps = 0;

        for updateable in &self.updateables {
            updateable.refresh(problem);
        }

        if self.config.parallel_scheduling {
            let clusters = self.partition_clusters(problem);
            if clusters.len() > 1 {
                return self.schedule_clusters(clusters);
            }
        }

        let plan = self.solve_sequential(problem)?;
        if self.config.caching_result_plan {
            self.cached_plan = Some(plan.clone());
        }
        Ok(plan)
    }

    /// Partitions the items into connected components of the
    /// `needs_checking` relation.
    fn partition_clusters(&self, problem: &Problem<T>) -> Vec<Problem<T>> {
        let movable_count = problem.items().len();
        let all: Vec<&Item<T>> = problem.iter_all_items().collect();
        let mut sets = DisjointSet::new(all.len());
        for i in 0..all.len() {
            for j in (i + 1)..all.len() {
                if self.pairs.iter().any(|c| c.needs_checking(all[i], all[j])) {
                    sets.union(i, j);
                }
            }
        }

        let mut cluster_of_root: HashMap<usize, usize> = HashMap::new();
        let mut items: Vec<Vec<Arc<Item<T>>>> = Vec::new();
        let mut fixed: Vec<Vec<ScheduledItem<T>>> = Vec::new();
        for (idx, _) in all.iter().enumerate() {
            let root = sets.find(idx);
            let cluster = *cluster_of_root.entry(root).or_insert_with(|| {
                items.push(Vec::new());
                fixed.push(Vec::new());
                items.len() - 1
            });
            if idx < movable_count {
                items[cluster].push(Arc::clone(&problem.items()[idx]));
            } else {
                fixed[cluster].push(problem.fixed()[idx - movable_count].clone());
            }
        }

        items
            .into_iter()
            .zip(fixed)
            .map(|(items, fixed)| {
                Problem::new(items, fixed).expect("cluster ids are unique within the problem")
            })
            .collect()
    }

    /// Schedules every cluster concurrently with an independent driver
    /// and merges the resulting plans. The relative order of items across
    /// clusters is not preserved.
    fn schedule_clusters(
        &mut self,
        clusters: Vec<Problem<T>>,
    ) -> Result<SchedulePlan<T>, SchedulingError<T>> {
        debug!(clusters = clusters.len(), "scheduling clusters in parallel");
        let worker_config = SchedulerConfig {
            parallel_scheduling: false,
            caching_result_plan: false,
            ..self.config.clone()
        };
        let singles = self.singles.clone();
        let pairs = self.pairs.clone();

        let outcomes: Vec<Result<(SchedulePlan<T>, Vec<Vec<ScheduledItem<T>>>, u64), SchedulingError<T>>> =
            clusters
                .into_par_iter()
                .map(|cluster| {
                    let mut worker = HeuristicRepairScheduler::with_constraints(
                        worker_config.clone(),
                        singles.clone(),
                        pairs.clone(),
                        Vec::new(),
                    );
                    let plan = worker.solve_sequential(&cluster)?;
                    Ok((plan, worker.snapshots, worker.backsteps))
                })
                .collect();

        let mut merged = SchedulePlan::new();
        for outcome in outcomes {
            let (plan, snapshots, backsteps) = outcome?;
            for scheduled in plan.iter() {
                merged
                    .schedule(scheduled.clone())
                    .map_err(crate::err::PlanError::from)?;
                if plan.is_fixed(scheduled.id()) {
                    merged
                        .fixate(scheduled)
                        .map_err(crate::err::PlanError::from)?;
                }
            }
            self.snapshots.extend(snapshots);
            self.backsteps += backsteps;
        }
        Ok(merged)
    }

    #[instrument(skip_all)]
    fn solve_sequential(
        &mut self,
        problem: &Problem<T>,
    ) -> Result<SchedulePlan<T>, SchedulingError<T>> {
        let mut plan = self.build_start_plan(problem)?;
        self.snapshots.push(plan.items_snapshot());

        let mut violations =
            ViolationsManager::new(self.singles.clone(), self.pairs.clone(), self.config.use_prediction);
        violations.initialize(&plan);
        let mut configurations = ConfigurationsManager::new();

        let mut violator = violations.biggest_violator(None);
        let mut hard_satisfied = false;
        if let Some(v) = &violator {
            if v.hard().is_zero() {
                hard_satisfied = true;
                if v.soft().is_zero() {
                    violator = None;
                }
            }
        }

        while let Some(current) = violator.take() {
            trace!(violator = %current, "repairing");
            configurations.reset(&current);
            let mut found_any = false;
            if plan.can_be_moved(current.item()) {
                for candidate in plan.start_candidates() {
                    // Candidates are ascending; once one configuration is
                    // known, later starts cannot beat its makespan.
                    if found_any
                        && plan.makespan() < candidate + current.item().item().max_duration()
                    {
                        break;
                    }
                    found_any |=
                        configurations.add_configuration(&mut violations, &mut plan, candidate)?;
                }
            }

            let applied = configurations.apply_best_configuration(&mut violations, &mut plan)?;
            if !applied {
                configurations.apply_reference_configuration(&mut plan)?;
                self.backsteps += 1;
                violator = violations.biggest_violator(Some(&current));
                if violator.is_none() {
                    if hard_satisfied {
                        break;
                    }
                    self.escape_from_local_optimum(
                        &mut plan,
                        &mut violations,
                        &mut configurations,
                        &current,
                    )?;
                    violator = violations.biggest_violator(None);
                    match &violator {
                        None => hard_satisfied = true,
                        Some(v) if !hard_satisfied && v.hard().is_zero() => hard_satisfied = true,
                        _ => {}
                    }
                }
                continue;
            }

            self.snapshots.push(plan.items_snapshot());
            violator = violations.biggest_violator(None);
            match &violator {
                None => hard_satisfied = true,
                Some(v) if !hard_satisfied && v.hard().is_zero() => hard_satisfied = true,
                _ => {}
            }
        }

        Ok(plan)
    }

    /// Fixed placements first, then cached starts for items the previous
    /// run already placed, then a greedy earliest-fit on each item's lane
    /// horizon respecting already placed required items.
    fn build_start_plan(&self, problem: &Problem<T>) -> Result<SchedulePlan<T>, SchedulingError<T>> {
        let mut plan = SchedulePlan::new();
        for placed in problem.iter_fixed() {
            plan.schedule(placed.clone())
                .map_err(crate::err::PlanError::from)?;
            plan.fixate(placed).map_err(crate::err::PlanError::from)?;
        }

        let mut remaining: Vec<&Arc<Item<T>>> = Vec::new();
        if self.config.caching_result_plan {
            if let Some(cached) = &self.cached_plan {
                for item in problem.iter_items() {
                    match cached.get(item.id()) {
                        Some(previous) if previous.item() == item.as_ref() => {
                            plan.add(Arc::clone(item), previous.start())
                                .map_err(crate::err::PlanError::from)?;
                        }
                        _ => remaining.push(item),
                    }
                }
            } else {
                remaining.extend(problem.iter_items());
            }
        } else {
            remaining.extend(problem.iter_items());
        }

        let mut lane_horizons: HashMap<LaneId, TimePoint<T>> = HashMap::new();
        let mut latest_ends: HashMap<ItemId, TimePoint<T>> = HashMap::new();
        for scheduled in plan.iter() {
            for (lane, _) in scheduled.item().durations().iter() {
                let end = scheduled.end_on(lane).expect("lane is occupied");
                let horizon = lane_horizons.entry(lane).or_insert_with(TimePoint::zero);
                *horizon = (*horizon).max(end);
            }
            latest_ends.insert(scheduled.id(), scheduled.latest_end());
        }

        for item in remaining {
            let mut start = TimePoint::zero();
            for lane in item.durations().lanes() {
                if let Some(&horizon) = lane_horizons.get(&lane) {
                    start = start.max(horizon);
                }
            }
            for required in item.required() {
                if let Some(&end) = latest_ends.get(required) {
                    start = start.max(end);
                }
            }
            let placed = plan
                .add(Arc::clone(item), start)
                .map_err(crate::err::PlanError::from)?;
            for (lane, _) in placed.item().durations().iter() {
                let end = placed.end_on(lane).expect("lane is occupied");
                let horizon = lane_horizons.entry(lane).or_insert_with(TimePoint::zero);
                *horizon = (*horizon).max(end);
            }
            latest_ends.insert(placed.id(), placed.latest_end());
        }

        Ok(plan)
    }

    /// Tries the three escape strategies and adopts the best candidate
    /// plan, or fails the run if none beats the current plan.
    #[instrument(skip_all, fields(stuck = %stuck.id()))]
    fn escape_from_local_optimum(
        &mut self,
        plan: &mut SchedulePlan<T>,
        violations: &mut ViolationsManager<T, C>,
        configurations: &mut ConfigurationsManager<T, C>,
        stuck: &Violator<T, C>,
    ) -> Result<(), SchedulingError<T>> {
        debug!("escaping local optimum");
        configurations.reset_plan_configurations();
        let (current_hard, current_soft) = violations.check_plan(plan);
        let current_key = (current_hard, plan.makespan(), current_soft);
        let mut circular: Option<CircularConstraintError> = None;

        if let Some(candidate) = self.reschedule_dependency_cone(plan, violations, stuck) {
            let (hard, soft) = violations.check_plan(&candidate);
            configurations.add_plan_configuration(candidate, hard, soft);
        }

        let makespan_delta = plan.makespan() - TimePoint::zero();
        match Self::shift_and_lock(plan.clone(), violations, stuck.item(), makespan_delta) {
            Ok(candidate) => {
                let (hard, soft) = violations.check_plan(&candidate);
                configurations.add_plan_configuration(candidate, hard, soft);
            }
            Err(ShiftLockFailure::Circular(id)) => {
                circular = Some(CircularConstraintError::new(id));
            }
            Err(ShiftLockFailure::Fixed(_)) => {}
        }

        if !makespan_delta.is_zero() {
            let mut shifted = plan.clone();
            shifted.shift_all(makespan_delta);
            match Self::shift_and_lock(shifted, violations, stuck.item(), -makespan_delta) {
                Ok(candidate) => {
                    let (hard, soft) = violations.check_plan(&candidate);
                    configurations.add_plan_configuration(candidate, hard, soft);
                }
                Err(ShiftLockFailure::Circular(id)) => {
                    circular.get_or_insert(CircularConstraintError::new(id));
                }
                Err(ShiftLockFailure::Fixed(_)) => {}
            }
        }

        let best = configurations.take_best_plan_configuration();
        if let Some(best) = best {
            let best_key = (best.hard(), best.makespan(), best.soft());
            if best_key < current_key {
                debug!(hard = %best.hard(), soft = %best.soft(), "adopting escape plan");
                *plan = best.into_plan();
                violations.plan_has_been_updated(plan);
                self.snapshots.push(plan.items_snapshot());
                return Ok(());
            }
        }

        match circular {
            Some(circular) => Err(circular.into()),
            None => Err(SchedulingError::UnableToEscape(Box::new(plan.clone()))),
        }
    }

    /// Escape strategy one: unschedule the stuck item's transitive
    /// dependents (depth-first reachable through the dependents index,
    /// movable only) and replay them in (depth, start) order at their
    /// cheapest candidate start.
    fn reschedule_dependency_cone(
        &self,
        plan: &SchedulePlan<T>,
        violations: &ViolationsManager<T, C>,
        stuck: &Violator<T, C>,
    ) -> Option<SchedulePlan<T>> {
        let mut candidate_plan = plan.clone();
        if !candidate_plan.can_be_moved(stuck.item()) {
            return None;
        }

        let mut depths: HashMap<ItemId, usize> = HashMap::new();
        depths.insert(stuck.id(), 0);
        let mut queue: Vec<(ItemId, usize)> = vec![(stuck.id(), 0)];
        while let Some((id, depth)) = queue.pop() {
            for dependent in candidate_plan.get_dependents(id) {
                if !candidate_plan.can_be_moved(&dependent) {
                    continue;
                }
                let next = depth + 1;
                // The deepest path wins when an item is reachable twice.
                match depths.get(&dependent.id()) {
                    Some(&known) if known >= next => {}
                    _ => {
                        depths.insert(dependent.id(), next);
                        queue.push((dependent.id(), next));
                    }
                }
            }
        }

        let mut cone: Vec<ScheduledItem<T>> = depths
            .keys()
            .filter_map(|id| candidate_plan.get(*id).cloned())
            .collect();
        cone.sort_by_key(|s| (depths[&s.id()], s.start(), s.id()));

        for scheduled in &cone {
            candidate_plan.unschedule(scheduled).ok()?;
        }

        for scheduled in &cone {
            let mut best: Option<(ScheduledItem<T>, _)> = None;
            for candidate in candidate_plan.start_candidates() {
                let placed = scheduled.with_start(candidate);
                let load = violations.check_item_at(&placed, &candidate_plan);
                let better = match &best {
                    None => true,
                    Some((_, best_load)) => load < *best_load,
                };
                if better {
                    best = Some((placed, load));
                }
            }
            let (placed, _) = best.expect("at least the zero candidate exists");
            candidate_plan.schedule(placed).ok()?;
        }

        Some(candidate_plan)
    }

    /// Escape strategies two and three: shift the stuck item (and,
    /// transitively, every item its shift freshly hard-violates) by
    /// `delta`, locking each shifted item. A locked item re-entering the
    /// violated set means the constraints chase each other in a circle.
    fn shift_and_lock(
        mut plan: SchedulePlan<T>,
        violations: &ViolationsManager<T, C>,
        seed: &ScheduledItem<T>,
        delta: TimeDelta<T>,
    ) -> Result<SchedulePlan<T>, ShiftLockFailure> {
        let mut locked: HashSet<ItemId> = HashSet::new();
        let mut working: Vec<ScheduledItem<T>> = match plan.get(seed.id()) {
            Some(current) => vec![current.clone()],
            None => return Ok(plan),
        };

        while !working.is_empty() {
            let mut known: HashSet<ItemId> = HashSet::new();
            for member in &working {
                for partner in violations.hard_violated_partners(member, &plan) {
                    known.insert(partner.id());
                }
            }

            for member in &working {
                if plan.is_fixed(member.id()) {
                    return Err(ShiftLockFailure::Fixed(member.id()));
                }
                let target = member.start() + delta;
                plan.move_item(member.id(), target)
                    .map_err(|_| ShiftLockFailure::Fixed(member.id()))?;
                locked.insert(member.id());
            }

            let mut seen: HashSet<ItemId> = HashSet::new();
            let mut newly: Vec<ScheduledItem<T>> = Vec::new();
            for member in &working {
                let moved = plan
                    .get(member.id())
                    .cloned()
                    .expect("member was just moved");
                for partner in violations.hard_violated_partners(&moved, &plan) {
                    if known.contains(&partner.id()) || !seen.insert(partner.id()) {
                        continue;
                    }
                    if locked.contains(&partner.id()) {
                        return Err(ShiftLockFailure::Circular(partner.id()));
                    }
                    newly.push(partner);
                }
            }
            working = newly;
        }

        Ok(plan)
    }
}
