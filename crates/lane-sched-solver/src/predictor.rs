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

//! # Conflict Predictor
//!
//! A cheap lower bound on the hard conflict value an item would collect
//! from its partners at any candidate start.
//!
//! Every pair constraint's [`Prediction`] is translated into a piecewise
//! constant function of `t = moved.start - fixed.start`, expressed as
//! three block shapes: a [`BeforeBlock`] active up to an endpoint, a run
//! of [`MiddleBlock`]s over the overlap window, and an [`AfterBlock`]
//! active from a start point on. Per partner the constraint functions are
//! merged pointwise with maximum; per item the partner functions are
//! shifted to the partner's current absolute start and summed. Querying
//! the aggregate at an absolute start yields the certain-conflict lower
//! bound (and the retained unknown share).
//!
//! Blocks are interned in a content-addressed store keyed by their field
//! tuple. Moves only dirty the affected partners; a query re-establishes
//! the aggregate either incrementally or by rebuild, whichever touches
//! fewer partner functions.

use crate::constraint::{ConflictKind, ItemPairConstraint, Prediction};
use lane_sched_core::{
    SolverVariable,
    severity::Severity,
    time::{TimeDelta, TimePoint},
};
use lane_sched_model::{id::ItemId, item::Item};
use rayon::prelude::*;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    sync::Arc,
};

/// Minimum number of sweep segments before a merge evaluates them on the
/// rayon pool.
const PARALLEL_SEGMENT_THRESHOLD: usize = 64;

/// The pair of bounds a block carries: the certain-conflict value and the
/// undecidable share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockValue<C: SolverVariable> {
    conflict: Severity<C>,
    unknown: Severity<C>,
}

impl<C: SolverVariable> BlockValue<C> {
    #[inline]
    pub fn new(conflict: Severity<C>, unknown: Severity<C>) -> Self {
        Self { conflict, unknown }
    }

    #[inline]
    pub fn zero() -> Self {
        Self {
            conflict: Severity::zero(),
            unknown: Severity::zero(),
        }
    }

    #[inline]
    pub fn conflict(&self) -> Severity<C> {
        self.conflict
    }

    #[inline]
    pub fn unknown(&self) -> Severity<C> {
        self.unknown
    }

    #[inline]
    fn max(self, other: Self) -> Self {
        Self {
            conflict: self.conflict.max(other.conflict),
            unknown: self.unknown.max(other.unknown),
        }
    }

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            conflict: self.conflict + other.conflict,
            unknown: self.unknown + other.unknown,
        }
    }

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            conflict: self.conflict - other.conflict,
            unknown: self.unknown - other.unknown,
        }
    }
}

/// Active for every `t <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BeforeBlock<T: SolverVariable, C: SolverVariable> {
    value: BlockValue<C>,
    end: TimePoint<T>,
}

/// Active for `start <= t <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MiddleBlock<T: SolverVariable, C: SolverVariable> {
    value: BlockValue<C>,
    start: TimePoint<T>,
    end: TimePoint<T>,
}

/// Active for every `t >= start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AfterBlock<T: SolverVariable, C: SolverVariable> {
    value: BlockValue<C>,
    start: TimePoint<T>,
}

/// Content-addressed store deduplicating block instances across the
/// predictor's functions.
#[derive(Debug, Default)]
struct BlockStore<T: SolverVariable, C: SolverVariable> {
    before: BTreeMap<BeforeBlock<T, C>, Arc<BeforeBlock<T, C>>>,
    middle: BTreeMap<MiddleBlock<T, C>, Arc<MiddleBlock<T, C>>>,
    after: BTreeMap<AfterBlock<T, C>, Arc<AfterBlock<T, C>>>,
}

impl<T: SolverVariable, C: SolverVariable> BlockStore<T, C> {
    fn new() -> Self {
        Self {
            before: BTreeMap::new(),
            middle: BTreeMap::new(),
            after: BTreeMap::new(),
        }
    }

    fn before(&mut self, value: BlockValue<C>, end: TimePoint<T>) -> Arc<BeforeBlock<T, C>> {
        let key = BeforeBlock { value, end };
        Arc::clone(self.before.entry(key).or_insert_with(|| Arc::new(key)))
    }

    fn middle(
        &mut self,
        value: BlockValue<C>,
        start: TimePoint<T>,
        end: TimePoint<T>,
    ) -> Arc<MiddleBlock<T, C>> {
        let key = MiddleBlock { value, start, end };
        Arc::clone(self.middle.entry(key).or_insert_with(|| Arc::new(key)))
    }

    fn after(&mut self, value: BlockValue<C>, start: TimePoint<T>) -> Arc<AfterBlock<T, C>> {
        let key = AfterBlock { value, start };
        Arc::clone(self.after.entry(key).or_insert_with(|| Arc::new(key)))
    }
}

/// A piecewise constant function over the whole axis: one before block,
/// contiguous middle blocks, one after block.
#[derive(Debug, Clone)]
pub struct PredictionBlocks<T: SolverVariable, C: SolverVariable> {
    before: Arc<BeforeBlock<T, C>>,
    middles: Vec<Arc<MiddleBlock<T, C>>>,
    after: Arc<AfterBlock<T, C>>,
}

/// How two piecewise functions are combined pointwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeOp {
    /// Strongest prediction among a pair's constraints.
    Max,
    /// Sum of partner contributions.
    Add,
    /// Removal of a stale partner contribution.
    Sub,
}

impl MergeOp {
    #[inline]
    fn apply<C: SolverVariable>(self, a: BlockValue<C>, b: BlockValue<C>) -> BlockValue<C> {
        match self {
            MergeOp::Max => a.max(b),
            MergeOp::Add => a.add(b),
            MergeOp::Sub => a.sub(b),
        }
    }
}

impl<T: SolverVariable, C: SolverVariable> PredictionBlocks<T, C> {
    /// The all-zero function.
    fn zero(store: &mut BlockStore<T, C>) -> Self {
        let minus_one = TimePoint::zero() - TimeDelta::new(T::one());
        Self {
            before: store.before(BlockValue::zero(), minus_one),
            middles: Vec::new(),
            after: store.after(BlockValue::zero(), TimePoint::zero()),
        }
    }

    /// Translates one constraint prediction into blocks over
    /// `t = moved.start - fixed.start`.
    ///
    /// The overlap window `(-moved_max, fixed_max)` is split into the two
    /// open edges and the central start-together point. The edges are only
    /// certain when both adjacent cases agree; otherwise they carry the
    /// prediction as an unknown share, which keeps the conflict bound
    /// admissible.
    fn from_prediction(
        prediction: &Prediction<C>,
        moved_max: TimeDelta<T>,
        fixed_max: TimeDelta<T>,
        store: &mut BlockStore<T, C>,
    ) -> Self {
        let value = prediction.conflict_value();
        let of_kind = |kind: ConflictKind| match kind {
            ConflictKind::Conflict => BlockValue::new(value, Severity::zero()),
            ConflictKind::NoConflict => BlockValue::zero(),
            ConflictKind::Unknown => BlockValue::new(Severity::zero(), value),
        };
        let of_edge = |a: ConflictKind, b: ConflictKind| match (a, b) {
            (ConflictKind::Conflict, ConflictKind::Conflict) => {
                BlockValue::new(value, Severity::zero())
            }
            (ConflictKind::NoConflict, ConflictKind::NoConflict) => BlockValue::zero(),
            _ => BlockValue::new(Severity::zero(), value),
        };

        let one = TimeDelta::new(T::one());
        let zero = TimePoint::zero();
        let before_end = zero - moved_max;
        let after_start = zero + fixed_max;

        let mut middles: Vec<Arc<MiddleBlock<T, C>>> = Vec::with_capacity(3);
        let mut push = |value: BlockValue<C>,
                        start: TimePoint<T>,
                        end: TimePoint<T>,
                        store: &mut BlockStore<T, C>| {
            if start > end {
                return;
            }
            if let Some(last) = middles.last().map(Arc::as_ref).copied() {
                if last.value == value && last.end + one == start {
                    let merged = store.middle(value, last.start, end);
                    *middles.last_mut().expect("non-empty") = merged;
                    return;
                }
            }
            middles.push(store.middle(value, start, end));
        };

        let left = of_edge(prediction.when_before(), prediction.when_together());
        let center = of_kind(prediction.when_together());
        let right = of_edge(prediction.when_together(), prediction.when_after());

        push(left, before_end + one, zero - one, store);
        push(center, zero, zero, store);
        push(right, zero + one, after_start - one, store);

        Self {
            before: store.before(of_kind(prediction.when_before()), before_end),
            middles,
            after: store.after(of_kind(prediction.when_after()), after_start),
        }
    }

    /// The value at `t`.
    fn eval(&self, t: TimePoint<T>) -> BlockValue<C> {
        if t <= self.before.end {
            return self.before.value;
        }
        if t >= self.after.start {
            return self.after.value;
        }
        let idx = self.middles.partition_point(|m| m.end < t);
        debug_assert!(idx < self.middles.len(), "middle blocks must tile the window");
        self.middles[idx].value
    }

    /// Every `t` at which the function may change value, ascending.
    fn changepoints(&self, out: &mut BTreeSet<TimePoint<T>>) {
        let one = TimeDelta::new(T::one());
        out.insert(self.before.end + one);
        for middle in &self.middles {
            out.insert(middle.start);
            out.insert(middle.end + one);
        }
        out.insert(self.after.start);
    }

    /// Pointwise combination by a sweep over the union of both functions'
    /// segment endpoints. Middle segments of large sweeps are evaluated on
    /// the rayon pool; the block emission stays sequential so adjacent
    /// equal-valued segments coalesce.
    fn merge(a: &Self, b: &Self, op: MergeOp, store: &mut BlockStore<T, C>) -> Self {
        let one = TimeDelta::new(T::one());
        let before_end = a.before.end.min(b.before.end);
        let after_start = a.after.start.max(b.after.start);

        let mut points = BTreeSet::new();
        a.changepoints(&mut points);
        b.changepoints(&mut points);
        let mut segments: Vec<(TimePoint<T>, TimePoint<T>)> = Vec::with_capacity(points.len() + 1);
        let mut current = before_end + one;
        for &point in points.range((
            std::ops::Bound::Excluded(current),
            std::ops::Bound::Excluded(after_start),
        )) {
            segments.push((current, point - one));
            current = point;
        }
        if current < after_start {
            segments.push((current, after_start - one));
        }

        let values: Vec<BlockValue<C>> = if segments.len() >= PARALLEL_SEGMENT_THRESHOLD {
            segments
                .par_iter()
                .map(|&(start, _)| op.apply(a.eval(start), b.eval(start)))
                .collect()
        } else {
            segments
                .iter()
                .map(|&(start, _)| op.apply(a.eval(start), b.eval(start)))
                .collect()
        };

        let mut middles: Vec<Arc<MiddleBlock<T, C>>> = Vec::with_capacity(segments.len());
        for (&(start, end), &value) in segments.iter().zip(&values) {
            if let Some(last) = middles.last().map(Arc::as_ref).copied() {
                if last.value == value {
                    let merged = store.middle(value, last.start, end);
                    *middles.last_mut().expect("non-empty") = merged;
                    continue;
                }
            }
            middles.push(store.middle(value, start, end));
        }

        Self {
            before: store.before(op.apply(a.eval(before_end), b.eval(before_end)), before_end),
            middles,
            after: store.after(op.apply(a.eval(after_start), b.eval(after_start)), after_start),
        }
    }

    /// The same function translated by `delta` along the axis.
    fn shift(&self, delta: TimeDelta<T>, store: &mut BlockStore<T, C>) -> Self {
        if delta.is_zero() {
            return self.clone();
        }
        let before = store.before(self.before.value, self.before.end + delta);
        let middles = self
            .middles
            .iter()
            .map(|m| store.middle(m.value, m.start + delta, m.end + delta))
            .collect();
        let after = store.after(self.after.value, self.after.start + delta);
        Self {
            before,
            middles,
            after,
        }
    }
}

/// One partner's contribution to an item's aggregate.
#[derive(Debug, Clone)]
struct PartnerFn<T: SolverVariable, C: SolverVariable> {
    /// Merged constraint blocks over the relative offset, origin-centered.
    relative: PredictionBlocks<T, C>,
    /// `relative` shifted to the partner start last folded into the
    /// aggregate.
    shifted: PredictionBlocks<T, C>,
}

#[derive(Debug, Clone)]
struct ItemAggregate<T: SolverVariable, C: SolverVariable> {
    partners: HashMap<ItemId, PartnerFn<T, C>>,
    aggregate: PredictionBlocks<T, C>,
    dirty: HashSet<ItemId>,
}

/// The per-item conflict lower bound over candidate starts.
#[derive(Debug)]
pub struct Predictor<T: SolverVariable, C: SolverVariable> {
    store: BlockStore<T, C>,
    aggregates: HashMap<ItemId, ItemAggregate<T, C>>,
    items: HashMap<ItemId, Arc<Item<T>>>,
    starts: HashMap<ItemId, TimePoint<T>>,
}

impl<T: SolverVariable, C: SolverVariable> Default for Predictor<T, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: SolverVariable, C: SolverVariable> Predictor<T, C> {
    pub fn new() -> Self {
        Self {
            store: BlockStore::new(),
            aggregates: HashMap::new(),
            items: HashMap::new(),
            starts: HashMap::new(),
        }
    }

    /// Rebuilds the whole substructure from the pair-interaction edges of
    /// the current plan. `edges` lists every unordered partner pair once,
    /// together with the constraints that made the pair interesting.
    pub fn initialize<'a, I>(
        &mut self,
        items: I,
        edges: &[(ItemId, ItemId, Vec<Arc<dyn ItemPairConstraint<T, C>>>)],
    ) where
        I: Iterator<Item = (&'a Arc<Item<T>>, TimePoint<T>)>,
        T: 'a,
    {
        self.store = BlockStore::new();
        self.aggregates = HashMap::new();
        self.items = HashMap::new();
        self.starts = HashMap::new();

        for (item, start) in items {
            self.items.insert(item.id(), Arc::clone(item));
            self.starts.insert(item.id(), start);
            self.aggregates.insert(
                item.id(),
                ItemAggregate {
                    partners: HashMap::new(),
                    aggregate: PredictionBlocks::zero(&mut self.store),
                    dirty: HashSet::new(),
                },
            );
        }

        for (a, b, constraints) in edges {
            self.install_pair(*a, *b, constraints);
            self.install_pair(*b, *a, constraints);
        }

        let ids: Vec<ItemId> = self.aggregates.keys().copied().collect();
        for id in ids {
            self.rebuild_aggregate(id);
        }
    }

    /// Computes the merged relative function for `moved` against `fixed`
    /// and registers it under `moved`'s aggregate. The `shifted` slot is
    /// seeded with a placeholder; callers must rebuild the aggregate
    /// before it is queried.
    fn install_pair(
        &mut self,
        moved: ItemId,
        fixed: ItemId,
        constraints: &[Arc<dyn ItemPairConstraint<T, C>>],
    ) {
        let moved_item = Arc::clone(self.items.get(&moved).expect("endpoint is known"));
        let fixed_item = Arc::clone(self.items.get(&fixed).expect("endpoint is known"));
        let relative = self.relative_function(&moved_item, &fixed_item, constraints);
        let shifted = relative.clone();
        let aggregate = self.aggregates.get_mut(&moved).expect("endpoint is known");
        aggregate.partners.insert(
            fixed,
            PartnerFn {
                relative,
                shifted,
            },
        );
        aggregate.dirty.insert(fixed);
    }

    fn relative_function(
        &mut self,
        moved: &Item<T>,
        fixed: &Item<T>,
        constraints: &[Arc<dyn ItemPairConstraint<T, C>>],
    ) -> PredictionBlocks<T, C> {
        let mut merged = PredictionBlocks::zero(&mut self.store);
        for constraint in constraints {
            let prediction = constraint.predict_decision(moved, fixed);
            let blocks = PredictionBlocks::from_prediction(
                &prediction,
                moved.max_duration(),
                fixed.max_duration(),
                &mut self.store,
            );
            merged = PredictionBlocks::merge(&merged, &blocks, MergeOp::Max, &mut self.store);
        }
        merged
    }

    /// Records a committed move. Every partner of the moved item sees it
    /// as dirty until its next query.
    pub fn item_moved(&mut self, id: ItemId, new_start: TimePoint<T>) {
        self.starts.insert(id, new_start);
        let partner_ids: Vec<ItemId> = self
            .aggregates
            .get(&id)
            .map(|agg| agg.partners.keys().copied().collect())
            .unwrap_or_default();
        for partner in partner_ids {
            if let Some(agg) = self.aggregates.get_mut(&partner) {
                agg.dirty.insert(id);
            }
        }
    }

    /// Records a committed lane switch: the item's durations changed, so
    /// every relative function it participates in is recomputed.
    /// `partner_constraints` lists, per current partner, the constraints
    /// attached to that pair.
    pub fn item_switched(
        &mut self,
        item: &Arc<Item<T>>,
        start: TimePoint<T>,
        partner_constraints: &[(ItemId, Vec<Arc<dyn ItemPairConstraint<T, C>>>)],
    ) {
        let id = item.id();
        self.items.insert(id, Arc::clone(item));
        self.starts.insert(id, start);

        for (partner, constraints) in partner_constraints {
            let partner = *partner;
            self.install_pair(id, partner, constraints);
            self.install_pair(partner, id, constraints);
            // The relative function changed, not just a position, so the
            // incremental subtract has no valid baseline any more.
            self.rebuild_aggregate(partner);
        }
        self.rebuild_aggregate(id);
    }

    /// The certain hard-conflict lower bound for placing `id` at `start`.
    pub fn defined_hard_conflict_value(&mut self, id: ItemId, start: TimePoint<T>) -> Severity<C> {
        self.query(id, start).0
    }

    /// Both bounds at `start`: (certain conflict, unknown share). The
    /// unknown share is maintained for completeness; trial updates only
    /// consume the certain part.
    pub fn query(&mut self, id: ItemId, start: TimePoint<T>) -> (Severity<C>, Severity<C>) {
        self.refresh_aggregate(id);
        match self.aggregates.get(&id) {
            Some(agg) => {
                let value = agg.aggregate.eval(start);
                (value.conflict(), value.unknown())
            }
            None => (Severity::zero(), Severity::zero()),
        }
    }

    fn refresh_aggregate(&mut self, id: ItemId) {
        let Some(agg) = self.aggregates.get(&id) else {
            return;
        };
        if agg.dirty.is_empty() {
            return;
        }
        // Incremental when few partners moved, full rebuild otherwise.
        if agg.dirty.len() * 2 < agg.partners.len() {
            let dirty: Vec<ItemId> = agg.dirty.iter().copied().collect();
            let mut aggregate = agg.aggregate.clone();
            for partner in dirty {
                let entry = self.aggregates[&id].partners[&partner].clone();
                aggregate =
                    PredictionBlocks::merge(&aggregate, &entry.shifted, MergeOp::Sub, &mut self.store);
                let offset = self.starts[&partner] - TimePoint::zero();
                let shifted = entry.relative.shift(offset, &mut self.store);
                aggregate =
                    PredictionBlocks::merge(&aggregate, &shifted, MergeOp::Add, &mut self.store);
                let agg = self.aggregates.get_mut(&id).expect("aggregate exists");
                agg.partners.get_mut(&partner).expect("partner exists").shifted = shifted;
            }
            let agg = self.aggregates.get_mut(&id).expect("aggregate exists");
            agg.aggregate = aggregate;
            agg.dirty.clear();
        } else {
            self.rebuild_aggregate(id);
        }
    }

    fn rebuild_aggregate(&mut self, id: ItemId) {
        let partner_ids: Vec<ItemId> = match self.aggregates.get(&id) {
            Some(agg) => agg.partners.keys().copied().collect(),
            None => return,
        };
        let mut aggregate = PredictionBlocks::zero(&mut self.store);
        for partner in partner_ids {
            let relative = self.aggregates[&id].partners[&partner].relative.clone();
            let offset = self.starts[&partner] - TimePoint::zero();
            let shifted = relative.shift(offset, &mut self.store);
            aggregate = PredictionBlocks::merge(&aggregate, &shifted, MergeOp::Add, &mut self.store);
            self.aggregates
                .get_mut(&id)
                .expect("aggregate exists")
                .partners
                .get_mut(&partner)
                .expect("partner exists")
                .shifted = shifted;
        }
        let agg = self.aggregates.get_mut(&id).expect("aggregate exists");
        agg.aggregate = aggregate;
        agg.dirty.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::prelude::{DependencyConstraint, NoOverlapConstraint};
    use lane_sched_model::id::LaneId;
    use std::collections::BTreeMap as Map;

    fn item(id: u64, lane: u32, duration: i64, required: &[u64]) -> Arc<Item<i64>> {
        let mut durations = Map::new();
        durations.insert(LaneId::new(lane), TimeDelta::new(duration));
        let required = required.iter().map(|&r| ItemId::new(r)).collect();
        Arc::new(Item::new(ItemId::new(id), durations, required).unwrap())
    }

    fn pair_constraints() -> Vec<Arc<dyn ItemPairConstraint<i64, i64>>> {
        vec![
            Arc::new(NoOverlapConstraint::new()),
            Arc::new(DependencyConstraint::new()),
        ]
    }

    #[test]
    fn test_blocks_from_prediction_tile_the_axis() {
        let mut store = BlockStore::new();
        let prediction: Prediction<i64> = Prediction::new(
            ConflictKind::NoConflict,
            ConflictKind::Conflict,
            ConflictKind::NoConflict,
            Severity::new(4),
        );
        let blocks = PredictionBlocks::from_prediction(
            &prediction,
            TimeDelta::new(10),
            TimeDelta::new(4),
            &mut store,
        );
        // Strictly before or after: no conflict.
        assert_eq!(blocks.eval(TimePoint::new(-10)).conflict(), Severity::zero());
        assert_eq!(blocks.eval(TimePoint::new(4)).conflict(), Severity::zero());
        // Starting together: certain conflict.
        assert_eq!(blocks.eval(TimePoint::new(0)).conflict(), Severity::new(4));
        // Partial overlap: undecided, tracked as unknown.
        assert_eq!(blocks.eval(TimePoint::new(-3)).conflict(), Severity::zero());
        assert_eq!(blocks.eval(TimePoint::new(-3)).unknown(), Severity::new(4));
        assert_eq!(blocks.eval(TimePoint::new(2)).unknown(), Severity::new(4));
    }

    #[test]
    fn test_conflict_edges_inherit_certainty() {
        let mut store = BlockStore::new();
        // Dependent mover: conflict before and while overlapping.
        let prediction: Prediction<i64> = Prediction::new(
            ConflictKind::Conflict,
            ConflictKind::Conflict,
            ConflictKind::NoConflict,
            Severity::new(10),
        );
        let blocks = PredictionBlocks::from_prediction(
            &prediction,
            TimeDelta::new(7),
            TimeDelta::new(10),
            &mut store,
        );
        assert_eq!(blocks.eval(TimePoint::new(-20)).conflict(), Severity::new(10));
        assert_eq!(blocks.eval(TimePoint::new(-3)).conflict(), Severity::new(10));
        assert_eq!(blocks.eval(TimePoint::new(0)).conflict(), Severity::new(10));
        // Right edge is between Conflict and NoConflict: unknown.
        assert_eq!(blocks.eval(TimePoint::new(5)).conflict(), Severity::zero());
        assert_eq!(blocks.eval(TimePoint::new(5)).unknown(), Severity::new(10));
        assert_eq!(blocks.eval(TimePoint::new(10)).conflict(), Severity::zero());
    }

    #[test]
    fn test_merge_max_takes_strongest() {
        let mut store = BlockStore::new();
        let a: Prediction<i64> = Prediction::new(
            ConflictKind::Conflict,
            ConflictKind::Conflict,
            ConflictKind::NoConflict,
            Severity::new(3),
        );
        let b: Prediction<i64> = Prediction::new(
            ConflictKind::NoConflict,
            ConflictKind::Conflict,
            ConflictKind::NoConflict,
            Severity::new(8),
        );
        let fa = PredictionBlocks::from_prediction(&a, TimeDelta::new(5), TimeDelta::new(5), &mut store);
        let fb = PredictionBlocks::from_prediction(&b, TimeDelta::new(5), TimeDelta::new(5), &mut store);
        let merged = PredictionBlocks::merge(&fa, &fb, MergeOp::Max, &mut store);
        assert_eq!(merged.eval(TimePoint::new(-9)).conflict(), Severity::new(3));
        assert_eq!(merged.eval(TimePoint::new(0)).conflict(), Severity::new(8));
        assert_eq!(merged.eval(TimePoint::new(9)).conflict(), Severity::zero());
    }

    #[test]
    fn test_shift_translates_blocks() {
        let mut store = BlockStore::new();
        let prediction: Prediction<i64> = Prediction::new(
            ConflictKind::NoConflict,
            ConflictKind::Conflict,
            ConflictKind::NoConflict,
            Severity::new(2),
        );
        let blocks = PredictionBlocks::from_prediction(
            &prediction,
            TimeDelta::new(5),
            TimeDelta::new(5),
            &mut store,
        );
        let shifted = blocks.shift(TimeDelta::new(100), &mut store);
        assert_eq!(shifted.eval(TimePoint::new(100)).conflict(), Severity::new(2));
        assert_eq!(shifted.eval(TimePoint::new(0)).conflict(), Severity::zero());
    }

    #[test]
    fn test_aggregate_sums_partner_bounds() {
        let mut predictor: Predictor<i64, i64> = Predictor::new();
        // Item 1 shares lane 0 with items 2 and 3, both of duration 10.
        let i1 = item(1, 0, 10, &[]);
        let i2 = item(2, 0, 10, &[]);
        let i3 = item(3, 0, 10, &[]);
        let edges = vec![
            (ItemId::new(1), ItemId::new(2), pair_constraints()),
            (ItemId::new(1), ItemId::new(3), pair_constraints()),
        ];
        predictor.initialize(
            [
                (&i1, TimePoint::new(0)),
                (&i2, TimePoint::new(0)),
                (&i3, TimePoint::new(0)),
            ]
            .into_iter(),
            &edges,
        );
        // Starting together with both partners: both certain conflicts sum.
        assert_eq!(
            predictor.defined_hard_conflict_value(ItemId::new(1), TimePoint::new(0)),
            Severity::new(20)
        );
        // Far away from both: no certain conflict.
        assert_eq!(
            predictor.defined_hard_conflict_value(ItemId::new(1), TimePoint::new(50)),
            Severity::zero()
        );
    }

    #[test]
    fn test_move_dirties_partners_and_requeries() {
        let mut predictor: Predictor<i64, i64> = Predictor::new();
        let i1 = item(1, 0, 10, &[]);
        let i2 = item(2, 0, 10, &[]);
        let edges = vec![(ItemId::new(1), ItemId::new(2), pair_constraints())];
        predictor.initialize(
            [(&i1, TimePoint::new(0)), (&i2, TimePoint::new(0))].into_iter(),
            &edges,
        );
        assert_eq!(
            predictor.defined_hard_conflict_value(ItemId::new(1), TimePoint::new(0)),
            Severity::new(10)
        );

        predictor.item_moved(ItemId::new(2), TimePoint::new(100));
        assert_eq!(
            predictor.defined_hard_conflict_value(ItemId::new(1), TimePoint::new(0)),
            Severity::zero()
        );
        assert_eq!(
            predictor.defined_hard_conflict_value(ItemId::new(1), TimePoint::new(100)),
            Severity::new(10)
        );
    }

    #[test]
    fn test_switch_rebuilds_partner_aggregates() {
        let mut predictor: Predictor<i64, i64> = Predictor::new();
        // Item 1 shares lane 0 with three partners, so a single dirty
        // partner would qualify for the incremental refresh path.
        let i1 = item(1, 0, 10, &[]);
        let i2 = item(2, 0, 10, &[]);
        let i3 = item(3, 0, 10, &[]);
        let i4 = item(4, 0, 10, &[]);
        let edges = vec![
            (ItemId::new(1), ItemId::new(2), pair_constraints()),
            (ItemId::new(1), ItemId::new(3), pair_constraints()),
            (ItemId::new(1), ItemId::new(4), pair_constraints()),
        ];
        predictor.initialize(
            [
                (&i1, TimePoint::new(0)),
                (&i2, TimePoint::new(0)),
                (&i3, TimePoint::new(0)),
                (&i4, TimePoint::new(0)),
            ]
            .into_iter(),
            &edges,
        );
        assert_eq!(
            predictor.defined_hard_conflict_value(ItemId::new(1), TimePoint::new(0)),
            Severity::new(30)
        );

        // Item 2 switches to a rendition on lane 1: the pair with item 1
        // can no longer conflict, and item 1's aggregate must not keep
        // the stale lane-0 contribution.
        let switched = item(2, 1, 20, &[]);
        predictor.item_switched(
            &switched,
            TimePoint::new(0),
            &[(ItemId::new(1), pair_constraints())],
        );
        assert_eq!(
            predictor.defined_hard_conflict_value(ItemId::new(1), TimePoint::new(0)),
            Severity::new(20)
        );
        assert_eq!(
            predictor.defined_hard_conflict_value(ItemId::new(2), TimePoint::new(0)),
            Severity::zero()
        );
    }

    #[test]
    fn test_dependency_bound_follows_required_partner() {
        let mut predictor: Predictor<i64, i64> = Predictor::new();
        let required = item(1, 0, 10, &[]);
        let dependent = item(2, 1, 5, &[1]);
        let edges = vec![(ItemId::new(2), ItemId::new(1), pair_constraints())];
        predictor.initialize(
            [(&required, TimePoint::new(20)), (&dependent, TimePoint::new(0))].into_iter(),
            &edges,
        );
        // Dependent placed before the required item ends: certain conflict.
        assert!(
            predictor.defined_hard_conflict_value(ItemId::new(2), TimePoint::new(0))
                > Severity::zero()
        );
        // Placed right at the required end: no certain conflict.
        assert_eq!(
            predictor.defined_hard_conflict_value(ItemId::new(2), TimePoint::new(30)),
            Severity::zero()
        );
    }
}
