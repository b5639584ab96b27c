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
use lane_sched_core::{SolverVariable, severity::Severity};
use lane_sched_model::item::{Item, ScheduledItem};
use std::marker::PhantomData;

/// Required items must have ended on every lane before their dependent
/// starts.
///
/// Hard. The violation value is how far the dependent start reaches into
/// the required item's occupation, summed over both directions of the
/// pair. Required ids absent from the current run constrain nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DependencyConstraint<T, C>
where
    T: SolverVariable,
    C: SolverVariable,
{
    _phantom: PhantomData<(T, C)>,
}

impl<T, C> DependencyConstraint<T, C>
where
    T: SolverVariable,
    C: SolverVariable,
{
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }

    fn requires(dependent: &Item<T>, required: &Item<T>) -> bool {
        dependent.required().contains(&required.id())
    }
}

impl<T, C> ItemPairConstraint<T, C> for DependencyConstraint<T, C>
where
    T: SolverVariable,
    C: SolverVariable + TryFrom<T>,
{
    fn name(&self) -> &'static str {
        "DependencyConstraint"
    }

    fn check(&self, a: &ScheduledItem<T>, b: &ScheduledItem<T>) -> Decision<C> {
        let mut violation = Severity::zero();
        if Self::requires(a.item(), b.item()) && a.start() < b.latest_end() {
            violation += severity_from_delta(b.latest_end() - a.start());
        }
        if Self::requires(b.item(), a.item()) && b.start() < a.latest_end() {
            violation += severity_from_delta(a.latest_end() - b.start());
        }
        if violation.is_zero() {
            Decision::fulfilled(true)
        } else {
            Decision::violated(true, violation)
        }
    }

    fn needs_checking(&self, a: &Item<T>, b: &Item<T>) -> bool {
        Self::requires(a, b) || Self::requires(b, a)
    }

    fn predict_decision(&self, moved: &Item<T>, fixed: &Item<T>) -> Prediction<C> {
        let moved_requires_fixed = Self::requires(moved, fixed);
        let fixed_requires_moved = Self::requires(fixed, moved);

        // Starting before the required item has ended is a certain
        // conflict; the guaranteed magnitude is smallest when the two
        // items start together.
        let (when_before, when_after, value) = match (moved_requires_fixed, fixed_requires_moved) {
            (true, false) => (
                ConflictKind::Conflict,
                ConflictKind::NoConflict,
                severity_from_delta(fixed.max_duration()),
            ),
            (false, true) => (
                ConflictKind::NoConflict,
                ConflictKind::Conflict,
                severity_from_delta(moved.max_duration()),
            ),
            (true, true) => (
                ConflictKind::Conflict,
                ConflictKind::Conflict,
                severity_from_delta(fixed.max_duration().min(moved.max_duration())),
            ),
            (false, false) => return Prediction::none(),
        };
        Prediction::new(when_before, ConflictKind::Conflict, when_after, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_sched_core::time::{TimeDelta, TimePoint};
    use lane_sched_model::id::{ItemId, LaneId};
    use std::{collections::BTreeMap, sync::Arc};

    fn item(id: u64, duration: i64, required: &[u64]) -> Arc<Item<i64>> {
        let mut durations = BTreeMap::new();
        durations.insert(LaneId::new(0), TimeDelta::new(duration));
        let required = required.iter().map(|&r| ItemId::new(r)).collect();
        Arc::new(Item::new(ItemId::new(id), durations, required).unwrap())
    }

    fn at(item: &Arc<Item<i64>>, start: i64) -> ScheduledItem<i64> {
        ScheduledItem::new(Arc::clone(item), TimePoint::new(start))
    }

    #[test]
    fn test_unrelated_items_not_checked() {
        let c: DependencyConstraint<i64, i64> = DependencyConstraint::new();
        assert!(!c.needs_checking(&item(1, 10, &[]), &item(2, 10, &[])));
    }

    #[test]
    fn test_dependent_after_required_is_fulfilled() {
        let c: DependencyConstraint<i64, i64> = DependencyConstraint::new();
        let required = item(1, 10, &[]);
        let dependent = item(2, 10, &[1]);
        assert!(c.check(&at(&dependent, 10), &at(&required, 0)).is_fulfilled());
    }

    #[test]
    fn test_dependent_too_early_is_violated() {
        let c: DependencyConstraint<i64, i64> = DependencyConstraint::new();
        let required = item(1, 10, &[]);
        let dependent = item(2, 10, &[1]);
        let d = c.check(&at(&dependent, 4), &at(&required, 0));
        assert!(d.is_hard());
        assert!(!d.is_fulfilled());
        assert_eq!(d.violation(), Severity::new(6));
    }

    #[test]
    fn test_check_is_symmetric() {
        let c: DependencyConstraint<i64, i64> = DependencyConstraint::new();
        let required = item(1, 10, &[]);
        let dependent = item(2, 10, &[1]);
        let ab = c.check(&at(&dependent, 4), &at(&required, 0));
        let ba = c.check(&at(&required, 0), &at(&dependent, 4));
        assert_eq!(ab.violation(), ba.violation());
    }

    #[test]
    fn test_prediction_for_dependent_mover() {
        let c: DependencyConstraint<i64, i64> = DependencyConstraint::new();
        let required = item(1, 10, &[]);
        let dependent = item(2, 7, &[1]);
        let p = c.predict_decision(&dependent, &required);
        assert_eq!(p.when_before(), ConflictKind::Conflict);
        assert_eq!(p.when_together(), ConflictKind::Conflict);
        assert_eq!(p.when_after(), ConflictKind::NoConflict);
        assert_eq!(p.conflict_value(), Severity::new(10));
    }

    #[test]
    fn test_prediction_for_required_mover() {
        let c: DependencyConstraint<i64, i64> = DependencyConstraint::new();
        let required = item(1, 10, &[]);
        let dependent = item(2, 7, &[1]);
        let p = c.predict_decision(&required, &dependent);
        assert_eq!(p.when_before(), ConflictKind::NoConflict);
        assert_eq!(p.when_after(), ConflictKind::Conflict);
        assert_eq!(p.conflict_value(), Severity::new(10));
    }
}
