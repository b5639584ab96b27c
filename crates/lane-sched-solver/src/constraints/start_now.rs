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

use crate::{constraint::Decision, constraint::SingleItemConstraint, constraints::severity_from_delta};
use lane_sched_core::{SolverVariable, time::TimePoint};
use lane_sched_model::item::ScheduledItem;
use std::marker::PhantomData;

/// Soft preference for starting at time zero.
///
/// The violation value grows linearly with the distance of the start from
/// zero, which drives the repair loop towards compact plans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartNowConstraint<T, C>
where
    T: SolverVariable,
    C: SolverVariable,
{
    _phantom: PhantomData<(T, C)>,
}

impl<T, C> StartNowConstraint<T, C>
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

impl<T, C> SingleItemConstraint<T, C> for StartNowConstraint<T, C>
where
    T: SolverVariable,
    C: SolverVariable + TryFrom<T>,
{
    fn name(&self) -> &'static str {
        "StartNowConstraint"
    }

    fn check(&self, item: &ScheduledItem<T>) -> Decision<C> {
        let start = item.start();
        if start == TimePoint::zero() {
            Decision::fulfilled(false)
        } else {
            let distance = if start > TimePoint::zero() {
                start - TimePoint::zero()
            } else {
                TimePoint::zero() - start
            };
            Decision::violated(false, severity_from_delta(distance))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_sched_core::{severity::Severity, time::TimeDelta};
    use lane_sched_model::id::{ItemId, LaneId};
    use std::{collections::BTreeMap, sync::Arc};

    fn at(start: i64) -> ScheduledItem<i64> {
        let mut durations = BTreeMap::new();
        durations.insert(LaneId::new(0), TimeDelta::new(10));
        let item = Arc::new(
            lane_sched_model::item::Item::new(ItemId::new(1), durations, vec![]).unwrap(),
        );
        ScheduledItem::new(item, TimePoint::new(start))
    }

    #[test]
    fn test_zero_start_is_fulfilled() {
        let c: StartNowConstraint<i64, i64> = StartNowConstraint::new();
        let d = c.check(&at(0));
        assert!(!d.is_hard());
        assert!(d.is_fulfilled());
    }

    #[test]
    fn test_late_start_is_soft_violated() {
        let c: StartNowConstraint<i64, i64> = StartNowConstraint::new();
        let d = c.check(&at(25));
        assert!(!d.is_hard());
        assert_eq!(d.violation(), Severity::new(25));
    }
}
