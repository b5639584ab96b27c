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

//! # Violations Manager
//!
//! Incremental bookkeeping of constraint violations.
//!
//! On initialization the manager builds the pair-interaction graph: one
//! arena-allocated edge per unordered item pair that at least one pair
//! constraint declares interesting. The edge holds the shared violation
//! container both endpoints see. Per non-fixed item a [`Violator`] with
//! the aggregate (hard, soft) load sits in an ordered tree with a
//! side index for O(log n) replacement.
//!
//! Relocation attempts run as trial updates: the candidate placement is
//! evaluated against the partners' current positions and rejected the
//! moment the accumulated load stops being strictly better than the
//! item's current load. Rejection is the expected outcome and is a plain
//! `None`, not an error.

use crate::{
    constraint::{ItemPairConstraint, SingleItemConstraint},
    plan::SchedulePlan,
    predictor::Predictor,
};
use lane_sched_core::{SolverVariable, severity::Severity};
use lane_sched_model::{id::ItemId, item::ScheduledItem};
use std::{
    cmp::Ordering,
    collections::{BTreeSet, HashMap},
    fmt::Display,
    ops::Bound,
    sync::Arc,
};

/// A non-fixed placement annotated with its current aggregate violation
/// load.
///
/// Ordered by hard load, then soft load, then duration summary
/// descending, then id; the tree maximum is the worst violator.
#[derive(Debug, Clone)]
pub struct Violator<T: SolverVariable, C: SolverVariable> {
    item: ScheduledItem<T>,
    hard: Severity<C>,
    soft: Severity<C>,
}

impl<T: SolverVariable, C: SolverVariable> Violator<T, C> {
    #[inline]
    pub fn new(item: ScheduledItem<T>, hard: Severity<C>, soft: Severity<C>) -> Self {
        Self { item, hard, soft }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.item.id()
    }

    #[inline]
    pub fn item(&self) -> &ScheduledItem<T> {
        &self.item
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
    pub fn is_violated(&self) -> bool {
        !self.hard.is_zero() || !self.soft.is_zero()
    }
}

impl<T: SolverVariable, C: SolverVariable> Ord for Violator<T, C> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hard
            .cmp(&other.hard)
            .then_with(|| self.soft.cmp(&other.soft))
            .then_with(|| {
                other
                    .item
                    .item()
                    .duration_summary()
                    .cmp(&self.item.item().duration_summary())
            })
            .then_with(|| self.id().cmp(&other.id()))
    }
}

impl<T: SolverVariable, C: SolverVariable> PartialOrd for Violator<T, C> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: SolverVariable, C: SolverVariable> PartialEq for Violator<T, C> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T: SolverVariable, C: SolverVariable> Eq for Violator<T, C> {}

impl<T: SolverVariable, C: SolverVariable> Display for Violator<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Violator(id: {}, hard: {}, soft: {})",
            self.id(),
            self.hard,
            self.soft
        )
    }
}

/// One edge of the pair-interaction graph. The (hard, soft) pair is the
/// shared violation container of both endpoints.
#[derive(Debug, Clone)]
struct PairEdge<C: SolverVariable> {
    a: ItemId,
    b: ItemId,
    /// Indices into the manager's pair-constraint list.
    constraints: Vec<usize>,
    hard: Severity<C>,
    soft: Severity<C>,
}

impl<C: SolverVariable> PairEdge<C> {
    #[inline]
    fn other(&self, id: ItemId) -> ItemId {
        if self.a == id { self.b } else { self.a }
    }
}

/// The per-partner part of a successful trial update: the edge, its old
/// container values, and the values the candidate placement would give it.
#[derive(Debug, Clone)]
pub struct PartnerUpdate<C: SolverVariable> {
    edge: usize,
    partner: ItemId,
    old_hard: Severity<C>,
    old_soft: Severity<C>,
    new_hard: Severity<C>,
    new_soft: Severity<C>,
}

/// A successful trial update, ready to be committed.
#[derive(Debug, Clone)]
pub struct ViolatorUpdate<T: SolverVariable, C: SolverVariable> {
    violator: Violator<T, C>,
    partner_updates: Vec<PartnerUpdate<C>>,
}

impl<T: SolverVariable, C: SolverVariable> ViolatorUpdate<T, C> {
    #[inline]
    pub fn violator(&self) -> &Violator<T, C> {
        &self.violator
    }
}

pub struct ViolationsManager<T: SolverVariable, C: SolverVariable> {
    singles: Vec<Arc<dyn SingleItemConstraint<T, C>>>,
    pairs: Vec<Arc<dyn ItemPairConstraint<T, C>>>,
    edges: Vec<PairEdge<C>>,
    partner_index: HashMap<ItemId, Vec<usize>>,
    violators: BTreeSet<Violator<T, C>>,
    by_item: HashMap<ItemId, Violator<T, C>>,
    predictor: Predictor<T, C>,
    use_prediction: bool,
}

impl<T: SolverVariable, C: SolverVariable> ViolationsManager<T, C> {
    pub fn new(
        singles: Vec<Arc<dyn SingleItemConstraint<T, C>>>,
        pairs: Vec<Arc<dyn ItemPairConstraint<T, C>>>,
        use_prediction: bool,
    ) -> Self {
        Self {
            singles,
            pairs,
            edges: Vec::new(),
            partner_index: HashMap::new(),
            violators: BTreeSet::new(),
            by_item: HashMap::new(),
            predictor: Predictor::new(),
            use_prediction,
        }
    }

    /// Builds the pair graph, the containers, the violator tree, and the
    /// predictor from the given plan.
    pub fn initialize(&mut self, plan: &SchedulePlan<T>) {
        self.edges.clear();
        self.partner_index.clear();
        self.violators.clear();
        self.by_item.clear();

        let mut items: Vec<&ScheduledItem<T>> = plan.iter().collect();
        items.sort_by_key(|s| s.id());

        for scheduled in &items {
            self.partner_index.insert(scheduled.id(), Vec::new());
        }

        for (i, a) in items.iter().enumerate() {
            for b in items.iter().skip(i + 1) {
                let constraints: Vec<usize> = self
                    .pairs
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| c.needs_checking(a.item(), b.item()))
                    .map(|(idx, _)| idx)
                    .collect();
                if constraints.is_empty() {
                    continue;
                }
                let mut hard = Severity::zero();
                let mut soft = Severity::zero();
                for &ci in &constraints {
                    let decision = self.pairs[ci].check(a, b);
                    if decision.is_hard() {
                        hard += decision.violation();
                    } else {
                        soft += decision.violation();
                    }
                }
                let edge = self.edges.len();
                self.edges.push(PairEdge {
                    a: a.id(),
                    b: b.id(),
                    constraints,
                    hard,
                    soft,
                });
                self.partner_index.get_mut(&a.id()).expect("indexed").push(edge);
                self.partner_index.get_mut(&b.id()).expect("indexed").push(edge);
            }
        }

        for scheduled in &items {
            if !plan.can_be_moved(scheduled) {
                continue;
            }
            let (hard, soft) = self.aggregate_of(scheduled);
            let violator = Violator::new((*scheduled).clone(), hard, soft);
            self.violators.insert(violator.clone());
            self.by_item.insert(scheduled.id(), violator);
        }

        let edge_descriptions: Vec<(ItemId, ItemId, Vec<Arc<dyn ItemPairConstraint<T, C>>>)> = self
            .edges
            .iter()
            .map(|e| {
                (
                    e.a,
                    e.b,
                    e.constraints.iter().map(|&ci| Arc::clone(&self.pairs[ci])).collect(),
                )
            })
            .collect();
        self.predictor.initialize(
            items.iter().map(|s| (s.item_arc(), s.start())),
            &edge_descriptions,
        );
    }

    /// The current aggregate of an item: its single-constraint load plus
    /// the containers of all its partner edges.
    fn aggregate_of(&self, scheduled: &ScheduledItem<T>) -> (Severity<C>, Severity<C>) {
        let mut hard = Severity::zero();
        let mut soft = Severity::zero();
        for single in &self.singles {
            let decision = single.check(scheduled);
            if decision.is_hard() {
                hard += decision.violation();
            } else {
                soft += decision.violation();
            }
        }
        for &edge in self.partner_index.get(&scheduled.id()).into_iter().flatten() {
            let edge = &self.edges[edge];
            hard += edge.hard;
            soft += edge.soft;
        }
        (hard, soft)
    }

    /// Evaluates relocating an item to `candidate` against the partners'
    /// current placements. Fails silently as soon as the accumulated load
    /// is no longer strictly better than the item's current load.
    pub fn try_violator_update(
        &mut self,
        candidate: &ScheduledItem<T>,
        plan: &SchedulePlan<T>,
    ) -> Option<ViolatorUpdate<T, C>> {
        let reference = self.by_item.get(&candidate.id())?.clone();
        let ref_hard = reference.hard();
        let ref_soft = reference.soft();
        let improving = |hard: Severity<C>, soft: Severity<C>| {
            hard < ref_hard || (hard == ref_hard && soft < ref_soft)
        };

        // The predictor's certain-conflict bound prunes placements whose
        // partners must conflict without touching them. Lane-switching
        // renditions change durations, so their bound would be stale.
        if self.use_prediction && !candidate.item().is_lane_switching() {
            let predicted = self
                .predictor
                .defined_hard_conflict_value(candidate.id(), candidate.start());
            if !improving(predicted, Severity::zero()) {
                return None;
            }
        }

        let mut hard = Severity::zero();
        let mut soft = Severity::zero();

        for single in &self.singles {
            let decision = single.check(candidate);
            if decision.is_hard() {
                hard += decision.violation();
            } else {
                soft += decision.violation();
            }
            if !improving(hard, soft) {
                return None;
            }
        }

        let mut partner_updates = Vec::new();
        let edge_indices: Vec<usize> = self
            .partner_index
            .get(&candidate.id())
            .cloned()
            .unwrap_or_default();
        for edge_idx in edge_indices {
            let edge = &self.edges[edge_idx];
            let partner_id = edge.other(candidate.id());
            let Some(partner) = plan.get(partner_id) else {
                continue;
            };
            let mut edge_hard = Severity::zero();
            let mut edge_soft = Severity::zero();
            for &ci in &edge.constraints {
                let decision = self.pairs[ci].check(candidate, partner);
                if decision.is_hard() {
                    edge_hard += decision.violation();
                } else {
                    edge_soft += decision.violation();
                }
            }
            hard += edge_hard;
            soft += edge_soft;
            partner_updates.push(PartnerUpdate {
                edge: edge_idx,
                partner: partner_id,
                old_hard: edge.hard,
                old_soft: edge.soft,
                new_hard: edge_hard,
                new_soft: edge_soft,
            });
            if !improving(hard, soft) {
                return None;
            }
        }

        Some(ViolatorUpdate {
            violator: Violator::new(candidate.clone(), hard, soft),
            partner_updates,
        })
    }

    /// Commits a successful trial update: containers, partner violators,
    /// the item's own violator, and the predictor.
    pub fn update_violator(&mut self, update: ViolatorUpdate<T, C>) {
        let moved_id = update.violator.id();
        let previous = self.by_item.get(&moved_id).cloned();

        for pu in &update.partner_updates {
            let edge = &mut self.edges[pu.edge];
            edge.hard = pu.new_hard;
            edge.soft = pu.new_soft;

            if let Some(partner_violator) = self.by_item.get(&pu.partner).cloned() {
                self.violators.remove(&partner_violator);
                let adjusted = Violator::new(
                    partner_violator.item().clone(),
                    partner_violator.hard() - pu.old_hard + pu.new_hard,
                    partner_violator.soft() - pu.old_soft + pu.new_soft,
                );
                self.violators.insert(adjusted.clone());
                self.by_item.insert(pu.partner, adjusted);
            }
        }

        if let Some(previous) = &previous {
            self.violators.remove(previous);
        }
        self.violators.insert(update.violator.clone());
        self.by_item.insert(moved_id, update.violator.clone());

        let moved = update.violator.item();
        let switched = previous
            .map(|p| !Arc::ptr_eq(p.item().item_arc(), moved.item_arc()))
            .unwrap_or(false);
        if switched {
            let partner_constraints: Vec<(ItemId, Vec<Arc<dyn ItemPairConstraint<T, C>>>)> = self
                .partner_index
                .get(&moved_id)
                .into_iter()
                .flatten()
                .map(|&edge_idx| {
                    let edge = &self.edges[edge_idx];
                    (
                        edge.other(moved_id),
                        edge.constraints
                            .iter()
                            .map(|&ci| Arc::clone(&self.pairs[ci]))
                            .collect(),
                    )
                })
                .collect();
            self.predictor
                .item_switched(moved.item_arc(), moved.start(), &partner_constraints);
        } else {
            self.predictor.item_moved(moved_id, moved.start());
        }
    }

    /// The worst violator strictly below `bound`, or the absolute worst
    /// when no bound is given.
    pub fn biggest_violator(&self, bound: Option<&Violator<T, C>>) -> Option<Violator<T, C>> {
        match bound {
            None => self.violators.last().cloned(),
            Some(bound) => self
                .violators
                .range((Bound::Unbounded, Bound::Excluded(bound)))
                .next_back()
                .cloned(),
        }
    }

    /// The total (hard, soft) load of a whole plan. Pair violations are
    /// counted once per direction; the metric is only used to compare
    /// candidate plans measured the same way.
    pub fn check_plan(&self, plan: &SchedulePlan<T>) -> (Severity<C>, Severity<C>) {
        let mut hard = Severity::zero();
        let mut soft = Severity::zero();
        for scheduled in plan.iter() {
            for single in &self.singles {
                let decision = single.check(scheduled);
                if decision.is_hard() {
                    hard += decision.violation();
                } else {
                    soft += decision.violation();
                }
            }
            for &edge_idx in self.partner_index.get(&scheduled.id()).into_iter().flatten() {
                let edge = &self.edges[edge_idx];
                let Some(partner) = plan.get(edge.other(scheduled.id())) else {
                    continue;
                };
                for &ci in &edge.constraints {
                    let decision = self.pairs[ci].check(scheduled, partner);
                    if decision.is_hard() {
                        hard += decision.violation();
                    } else {
                        soft += decision.violation();
                    }
                }
            }
        }
        (hard, soft)
    }

    /// The (hard, soft) load a single placement would have in `plan`,
    /// skipping partners the plan does not currently hold.
    pub fn check_item_at(
        &self,
        candidate: &ScheduledItem<T>,
        plan: &SchedulePlan<T>,
    ) -> (Severity<C>, Severity<C>) {
        let mut hard = Severity::zero();
        let mut soft = Severity::zero();
        for single in &self.singles {
            let decision = single.check(candidate);
            if decision.is_hard() {
                hard += decision.violation();
            } else {
                soft += decision.violation();
            }
        }
        for &edge_idx in self.partner_index.get(&candidate.id()).into_iter().flatten() {
            let edge = &self.edges[edge_idx];
            let Some(partner) = plan.get(edge.other(candidate.id())) else {
                continue;
            };
            for &ci in &edge.constraints {
                let decision = self.pairs[ci].check(candidate, partner);
                if decision.is_hard() {
                    hard += decision.violation();
                } else {
                    soft += decision.violation();
                }
            }
        }
        (hard, soft)
    }

    /// The partners whose pair decision with `item` is an unfulfilled
    /// hard violation right now.
    pub fn hard_violated_partners(
        &self,
        item: &ScheduledItem<T>,
        plan: &SchedulePlan<T>,
    ) -> Vec<ScheduledItem<T>> {
        let mut out = Vec::new();
        for &edge_idx in self.partner_index.get(&item.id()).into_iter().flatten() {
            let edge = &self.edges[edge_idx];
            let Some(partner) = plan.get(edge.other(item.id())) else {
                continue;
            };
            let violated = edge.constraints.iter().any(|&ci| {
                let decision = self.pairs[ci].check(item, partner);
                decision.is_hard() && !decision.is_fulfilled()
            });
            if violated {
                out.push(partner.clone());
            }
        }
        out
    }

    /// Replaces the reference plan wholesale: the pair graph, the
    /// violator tree, and the predictor are rebuilt.
    pub fn plan_has_been_updated(&mut self, plan: &SchedulePlan<T>) {
        self.initialize(plan);
    }

    #[inline]
    pub fn violator_of(&self, id: ItemId) -> Option<&Violator<T, C>> {
        self.by_item.get(&id)
    }

    #[inline]
    pub fn violator_count(&self) -> usize {
        self.violators.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::prelude::{
        DependencyConstraint, NoOverlapConstraint, StartNowConstraint,
    };
    use lane_sched_core::time::{TimeDelta, TimePoint};
    use lane_sched_model::{id::LaneId, item::Item};
    use std::collections::BTreeMap;

    fn item(id: u64, lane: u32, duration: i64, required: &[u64]) -> Arc<Item<i64>> {
        let mut durations = BTreeMap::new();
        durations.insert(LaneId::new(lane), TimeDelta::new(duration));
        let required = required.iter().map(|&r| ItemId::new(r)).collect();
        Arc::new(Item::new(ItemId::new(id), durations, required).unwrap())
    }

    fn manager(use_prediction: bool) -> ViolationsManager<i64, i64> {
        ViolationsManager::new(
            vec![Arc::new(StartNowConstraint::new())],
            vec![
                Arc::new(NoOverlapConstraint::new()),
                Arc::new(DependencyConstraint::new()),
            ],
            use_prediction,
        )
    }

    #[test]
    fn test_initialize_builds_pair_graph_and_violators() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.add(item(2, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.add(item(3, 1, 10, &[]), TimePoint::new(0)).unwrap();

        let mut manager = manager(false);
        manager.initialize(&plan);

        // Items 1 and 2 share a lane and overlap fully.
        let worst = manager.biggest_violator(None).unwrap();
        assert_eq!(worst.hard(), Severity::new(10));
        // Item 3 has no partners and no violations.
        let v3 = manager.violator_of(ItemId::new(3)).unwrap();
        assert!(v3.hard().is_zero());
        assert!(v3.soft().is_zero());
        assert_eq!(manager.violator_count(), 3);
    }

    #[test]
    fn test_shared_container_reflects_on_both_endpoints() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.add(item(2, 0, 10, &[]), TimePoint::new(0)).unwrap();

        let mut manager = manager(false);
        manager.initialize(&plan);
        let v1 = manager.violator_of(ItemId::new(1)).unwrap().clone();
        let v2 = manager.violator_of(ItemId::new(2)).unwrap().clone();
        assert_eq!(v1.hard(), v2.hard());

        // Move item 2 away; committing the update clears both loads.
        let moved = plan.move_item(ItemId::new(2), TimePoint::new(10)).unwrap();
        let update = manager.try_violator_update(&moved, &plan).unwrap();
        manager.update_violator(update);
        assert!(manager.violator_of(ItemId::new(1)).unwrap().hard().is_zero());
        assert!(manager.violator_of(ItemId::new(2)).unwrap().hard().is_zero());
    }

    #[test]
    fn test_trial_update_rejects_non_improving() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.add(item(2, 0, 10, &[]), TimePoint::new(0)).unwrap();

        let mut manager = manager(false);
        manager.initialize(&plan);

        // Staying in place is not strictly better.
        let unchanged = plan.get(ItemId::new(2)).unwrap().clone();
        assert!(manager.try_violator_update(&unchanged, &plan).is_none());

        // Sliding by one keeps a hard overlap of 9 plus soft 1: better.
        let slid = unchanged.with_start(TimePoint::new(1));
        assert!(manager.try_violator_update(&slid, &plan).is_some());
    }

    #[test]
    fn test_prediction_prunes_certain_conflicts() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.add(item(2, 0, 10, &[]), TimePoint::new(20)).unwrap();

        let mut manager = manager(true);
        manager.initialize(&plan);

        // Item 2 carries only soft load; starting together with item 1
        // is a predicted certain conflict and is pruned.
        let together = plan.get(ItemId::new(2)).unwrap().with_start(TimePoint::new(0));
        assert!(manager.try_violator_update(&together, &plan).is_none());
    }

    #[test]
    fn test_biggest_violator_with_bound() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.add(item(2, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.add(item(3, 1, 5, &[]), TimePoint::new(7)).unwrap();

        let mut manager = manager(false);
        manager.initialize(&plan);

        let worst = manager.biggest_violator(None).unwrap();
        assert_eq!(worst.hard(), Severity::new(10));
        let next = manager.biggest_violator(Some(&worst)).unwrap();
        assert!(next < worst);
        // Walking down the tree terminates.
        let mut bound = Some(next);
        let mut steps = 0;
        while let Some(v) = manager.biggest_violator(bound.as_ref()) {
            bound = Some(v);
            steps += 1;
            assert!(steps <= 3);
        }
    }

    #[test]
    fn test_check_plan_double_counts_pairs() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.add(item(2, 0, 10, &[]), TimePoint::new(0)).unwrap();

        let mut manager = manager(false);
        manager.initialize(&plan);
        let (hard, _) = manager.check_plan(&plan);
        // The overlap of 10 is seen from both endpoints.
        assert_eq!(hard, Severity::new(20));
    }

    #[test]
    fn test_hard_violated_partners() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.add(item(2, 0, 10, &[]), TimePoint::new(5)).unwrap();
        plan.add(item(3, 0, 10, &[]), TimePoint::new(40)).unwrap();

        let mut manager = manager(false);
        manager.initialize(&plan);
        let s1 = plan.get(ItemId::new(1)).unwrap().clone();
        let partners = manager.hard_violated_partners(&s1, &plan);
        assert_eq!(partners.len(), 1);
        assert_eq!(partners[0].id(), ItemId::new(2));
    }

    #[test]
    fn test_fixed_items_have_no_violator() {
        let mut plan = SchedulePlan::new();
        let fixed = plan.add(item(1, 0, 10, &[]), TimePoint::new(0)).unwrap();
        plan.fixate(&fixed).unwrap();
        plan.add(item(2, 0, 10, &[]), TimePoint::new(0)).unwrap();

        let mut manager = manager(false);
        manager.initialize(&plan);
        assert_eq!(manager.violator_count(), 1);
        assert!(manager.violator_of(ItemId::new(1)).is_none());
        // The fixed partner still weighs on item 2.
        assert_eq!(
            manager.violator_of(ItemId::new(2)).unwrap().hard(),
            Severity::new(10)
        );
    }
}
