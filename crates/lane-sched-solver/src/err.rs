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

use crate::plan::SchedulePlan;
use lane_sched_core::SolverVariable;
use lane_sched_model::id::ItemId;
use std::fmt::Display;

/// An item id was scheduled into a plan that already holds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AlreadyScheduledError {
    id: ItemId,
}

impl AlreadyScheduledError {
    #[inline]
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }
}

impl Display for AlreadyScheduledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item {} is already scheduled", self.id)
    }
}

impl std::error::Error for AlreadyScheduledError {}

/// A plan operation referenced an item the plan does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotScheduledError {
    id: ItemId,
}

impl NotScheduledError {
    #[inline]
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }
}

impl Display for NotScheduledError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item {} is not scheduled", self.id)
    }
}

impl std::error::Error for NotScheduledError {}

/// A fixed item was asked to move or leave the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedItemError {
    id: ItemId,
}

impl FixedItemError {
    #[inline]
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }
}

impl Display for FixedItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item {} is fixed and cannot be moved or unscheduled", self.id)
    }
}

impl std::error::Error for FixedItemError {}

/// Failure of a single [`SchedulePlan`] operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanError {
    AlreadyScheduled(AlreadyScheduledError),
    NotScheduled(NotScheduledError),
    Fixed(FixedItemError),
}

impl Display for PlanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanError::AlreadyScheduled(e) => write!(f, "{}", e),
            PlanError::NotScheduled(e) => write!(f, "{}", e),
            PlanError::Fixed(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PlanError {}

impl From<AlreadyScheduledError> for PlanError {
    fn from(e: AlreadyScheduledError) -> Self {
        PlanError::AlreadyScheduled(e)
    }
}

impl From<NotScheduledError> for PlanError {
    fn from(e: NotScheduledError) -> Self {
        PlanError::NotScheduled(e)
    }
}

impl From<FixedItemError> for PlanError {
    fn from(e: FixedItemError) -> Self {
        PlanError::Fixed(e)
    }
}

/// A previously locked item re-entered the violated set during
/// shift-and-lock, which indicates constraints that chase each other in a
/// circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CircularConstraintError {
    id: ItemId,
}

impl CircularConstraintError {
    #[inline]
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }
}

impl Display for CircularConstraintError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Item {} re-entered the violated set while locked, constraints are circular",
            self.id
        )
    }
}

impl std::error::Error for CircularConstraintError {}

/// Terminal failure of a scheduling run.
#[derive(Debug, Clone)]
pub enum SchedulingError<T: SolverVariable> {
    /// No escape strategy produced a better plan. Carries the plan the
    /// solver was stuck with for diagnostics.
    UnableToEscape(Box<SchedulePlan<T>>),
    /// Shift-and-lock detected circular constraints.
    CircularConstraint(CircularConstraintError),
    /// A plan operation failed mid-run.
    Plan(PlanError),
}

impl<T: SolverVariable> Display for SchedulingError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::UnableToEscape(plan) => write!(
                f,
                "Unable to escape a local optimum with {} scheduled items",
                plan.len()
            ),
            SchedulingError::CircularConstraint(e) => write!(f, "{}", e),
            SchedulingError::Plan(e) => write!(f, "{}", e),
        }
    }
}

impl<T: SolverVariable> std::error::Error for SchedulingError<T> {}

impl<T: SolverVariable> From<CircularConstraintError> for SchedulingError<T> {
    fn from(e: CircularConstraintError) -> Self {
        SchedulingError::CircularConstraint(e)
    }
}

impl<T: SolverVariable> From<PlanError> for SchedulingError<T> {
    fn from(e: PlanError) -> Self {
        SchedulingError::Plan(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_error_from() {
        let e: PlanError = FixedItemError::new(ItemId::new(4)).into();
        assert!(matches!(e, PlanError::Fixed(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            format!("{}", NotScheduledError::new(ItemId::new(2))),
            "Item ItemId(2) is not scheduled"
        );
    }
}
