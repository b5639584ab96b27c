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

//! # Constraint Surface
//!
//! The extension points user code plugs into the solver:
//!
//! - [`SingleItemConstraint`] judges one placement on its own.
//! - [`ItemPairConstraint`] judges two placements against each other,
//!   prunes the pair graph via `needs_checking`, and supplies the
//!   [`Prediction`] the conflict predictor turns into piecewise bounds.
//! - [`UpdateableConstraint`] lets a constraint refresh internal state
//!   before every scheduling run.
//!
//! Constraints shared across parallel cluster workers are read
//! concurrently; implementations must be free of shared mutable state.

use lane_sched_core::{SolverVariable, severity::Severity};
use lane_sched_model::{
    item::{Item, ScheduledItem},
    problem::Problem,
};

/// The verdict of a constraint check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decision<C: SolverVariable> {
    hard: bool,
    fulfilled: bool,
    violation: Severity<C>,
}

impl<C: SolverVariable> Decision<C> {
    /// A satisfied check. Carries no violation value.
    #[inline]
    pub fn fulfilled(hard: bool) -> Self {
        Self {
            hard,
            fulfilled: true,
            violation: Severity::zero(),
        }
    }

    /// A violated check with a positive violation magnitude.
    #[inline]
    pub fn violated(hard: bool, violation: Severity<C>) -> Self {
        Self {
            hard,
            fulfilled: false,
            violation,
        }
    }

    #[inline]
    pub fn is_hard(&self) -> bool {
        self.hard
    }

    #[inline]
    pub fn is_fulfilled(&self) -> bool {
        self.fulfilled
    }

    #[inline]
    pub fn violation(&self) -> Severity<C> {
        self.violation
    }
}

/// Whether a hard conflict is certain, impossible, or undecidable for one
/// of the three relative placements of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConflictKind {
    Conflict,
    NoConflict,
    Unknown,
}

/// A per-pair lookahead: does a hard conflict occur when the moved item is
/// strictly before the fixed one, starts together with it, or is strictly
/// after it. `conflict_value` lower-bounds the hard violation wherever a
/// conflict is certain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prediction<C: SolverVariable> {
    when_before: ConflictKind,
    when_together: ConflictKind,
    when_after: ConflictKind,
    conflict_value: Severity<C>,
}

impl<C: SolverVariable> Prediction<C> {
    #[inline]
    pub fn new(
        when_before: ConflictKind,
        when_together: ConflictKind,
        when_after: ConflictKind,
        conflict_value: Severity<C>,
    ) -> Self {
        Self {
            when_before,
            when_together,
            when_after,
            conflict_value,
        }
    }

    /// No conflict anywhere; contributes nothing to the bound.
    #[inline]
    pub fn none() -> Self {
        Self::new(
            ConflictKind::NoConflict,
            ConflictKind::NoConflict,
            ConflictKind::NoConflict,
            Severity::zero(),
        )
    }

    #[inline]
    pub fn when_before(&self) -> ConflictKind {
        self.when_before
    }

    #[inline]
    pub fn when_together(&self) -> ConflictKind {
        self.when_together
    }

    #[inline]
    pub fn when_after(&self) -> ConflictKind {
        self.when_after
    }

    #[inline]
    pub fn conflict_value(&self) -> Severity<C> {
        self.conflict_value
    }
}

/// A constraint over a single placement.
pub trait SingleItemConstraint<T, C>: Send + Sync
where
    T: SolverVariable,
    C: SolverVariable,
{
    fn name(&self) -> &'static str;

    fn check(&self, item: &ScheduledItem<T>) -> Decision<C>;
}

/// A constraint over a pair of placements.
pub trait ItemPairConstraint<T, C>: Send + Sync
where
    T: SolverVariable,
    C: SolverVariable,
{
    fn name(&self) -> &'static str;

    fn check(&self, a: &ScheduledItem<T>, b: &ScheduledItem<T>) -> Decision<C>;

    /// Whether this constraint can ever be violated by the given pair.
    /// Used to prune the pair-interaction graph; returning `true` for an
    /// uninteresting pair is safe, returning `false` for an interesting
    /// one is not.
    fn needs_checking(&self, a: &Item<T>, b: &Item<T>) -> bool;

    /// A cheap classification of the conflict landscape when `moved` is
    /// relocated relative to a resting `fixed` partner.
    fn predict_decision(&self, moved: &Item<T>, fixed: &Item<T>) -> Prediction<C>;
}

/// Refresh hook invoked once at the start of every scheduling run.
pub trait UpdateableConstraint<T>: Send + Sync
where
    T: SolverVariable,
{
    fn refresh(&self, problem: &Problem<T>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fulfilled_carries_no_violation() {
        let d: Decision<i64> = Decision::fulfilled(true);
        assert!(d.is_hard());
        assert!(d.is_fulfilled());
        assert!(d.violation().is_zero());
    }

    #[test]
    fn test_violated() {
        let d: Decision<i64> = Decision::violated(false, Severity::new(3));
        assert!(!d.is_hard());
        assert!(!d.is_fulfilled());
        assert_eq!(d.violation(), Severity::new(3));
    }

    #[test]
    fn test_prediction_none() {
        let p: Prediction<i64> = Prediction::none();
        assert_eq!(p.when_before(), ConflictKind::NoConflict);
        assert!(p.conflict_value().is_zero());
    }
}
