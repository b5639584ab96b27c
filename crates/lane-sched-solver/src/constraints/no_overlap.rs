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

use crate::{
    constraint::{ConflictKind, Decision, ItemPairConstraint, Prediction},
    constraints::severity_from_delta,
};
use lane_sched_core::{SolverVariable, severity::Severity, time::TimeDelta};
use lane_sched_model::item::{Item, ScheduledItem};
use std::marker::PhantomData;

/// A lane executes at most one item at a time.
///
/// Hard. The violation value is the summed overlap length over all lanes
/// the two items share.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoOverlapConstraint<T, C>
where
    T: SolverVariable,
    C: SolverVariable,
{
    _phantom: PhantomData<(T, C)>,
}

impl<T, C> NoOverlapConstraint<T, C>
where
    T: SolverVariable,
    C: SolverVariable,
{
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<T, C> ItemPairConstraint<T, C> for NoOverlapConstraint<T, C>
where
    T: SolverVariable,
    C: SolverVariable + TryFrom<T>,
{
    fn name(&self) -> &'static str {
        "NoOverlapConstraint"
    }

    fn check(&self, a: &ScheduledItem<T>, b: &ScheduledItem<T>) -> Decision<C> {
        let mut overlap = TimeDelta::zero();
        for (lane, _) in a.item().durations().iter() {
            let (Some(iv_a), Some(iv_b)) = (a.interval_on(lane), b.interval_on(lane)) else {
                continue;
            };
            if iv_a.intersects(&iv_b) {
                let start = iv_a.start().max(iv_b.start());
                let end = iv_a.end().min(iv_b.end());
                overlap += end - start;
            }
        }
        if overlap.is_zero() {
            Decision::fulfilled(true)
        } else {
            Decision::violated(true, severity_from_delta(overlap))
        }
    }

    fn needs_checking(&self, a: &Item<T>, b: &Item<T>) -> bool {
        a.durations().shares_lane_with(b.durations())
    }

    fn predict_decision(&self, moved: &Item<T>, fixed: &Item<T>) -> Prediction<C> {
        if !moved.durations().shares_lane_with(fixed.durations()) {
            return Prediction::none();
        }
        // Starting together overlaps on every shared lane by the shorter
        // of the two durations; strictly before or after never overlaps.
        let mut guaranteed = Severity::zero();
        for (lane, moved_duration) in moved.durations().iter() {
            if let Some(fixed_duration) = fixed.durations().get(lane) {
                guaranteed += severity_from_delta(moved_duration.min(fixed_duration));
            }
        }
        Prediction::new(
            ConflictKind::NoConflict,
            ConflictKind::Conflict,
            ConflictKind::NoConflict,
            guaranteed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_sched_core::time::TimePoint;
    use lane_sched_model::id::{ItemId, LaneId};
    use std::{collections::BTreeMap, sync::Arc};

    fn item(id: u64, lanes: &[(u32, i64)]) -> Arc<Item<i64>> {
        let durations: BTreeMap<LaneId, TimeDelta<i64>> = lanes
            .iter()
            .map(|&(l, d)| (LaneId::new(l), TimeDelta::new(d)))
            .collect();
        Arc::new(Item::new(ItemId::new(id), durations, vec![]).unwrap())
    }

    fn at(item: &Arc<Item<i64>>, start: i64) -> ScheduledItem<i64> {
        ScheduledItem::new(Arc::clone(item), TimePoint::new(start))
    }

    #[test]
    fn test_disjoint_lanes_never_checked() {
        let c: NoOverlapConstraint<i64, i64> = NoOverlapConstraint::new();
        let a = item(1, &[(0, 10)]);
        let b = item(2, &[(1, 10)]);
        assert!(!c.needs_checking(&a, &b));
        assert!(c.check(&at(&a, 0), &at(&b, 0)).is_fulfilled());
    }

    #[test]
    fn test_overlap_is_summed_over_shared_lanes() {
        let c: NoOverlapConstraint<i64, i64> = NoOverlapConstraint::new();
        let a = item(1, &[(0, 10), (1, 10)]);
        let b = item(2, &[(0, 10), (1, 4)]);
        let d = c.check(&at(&a, 0), &at(&b, 5));
        assert!(d.is_hard());
        assert!(!d.is_fulfilled());
        // Lane 0 overlaps [5, 10), lane 1 overlaps [5, 9).
        assert_eq!(d.violation(), Severity::new(9));
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let c: NoOverlapConstraint<i64, i64> = NoOverlapConstraint::new();
        let a = item(1, &[(0, 10)]);
        let b = item(2, &[(0, 10)]);
        assert!(c.check(&at(&a, 0), &at(&b, 10)).is_fulfilled());
    }

    #[test]
    fn test_prediction_marks_start_together_conflict() {
        let c: NoOverlapConstraint<i64, i64> = NoOverlapConstraint::new();
        let a = item(1, &[(0, 10)]);
        let b = item(2, &[(0, 4)]);
        let p = c.predict_decision(&a, &b);
        assert_eq!(p.when_before(), ConflictKind::NoConflict);
        assert_eq!(p.when_together(), ConflictKind::Conflict);
        assert_eq!(p.when_after(), ConflictKind::NoConflict);
        assert_eq!(p.conflict_value(), Severity::new(4));
    }
}
