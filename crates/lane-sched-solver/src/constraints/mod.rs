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

//! # Built-in Constraints
//!
//! The default constraint set: lanes execute one item at a time
//! ([`no_overlap::NoOverlapConstraint`]), required items finish before
//! their dependents start ([`dependency::DependencyConstraint`]), and
//! everything prefers to start as early as possible
//! ([`start_now::StartNowConstraint`]).

pub mod dependency;
pub mod no_overlap;
pub mod start_now;

use lane_sched_core::{SolverVariable, severity::Severity, time::TimeDelta};

/// Converts a non-negative time span into a violation magnitude.
#[inline]
pub(crate) fn severity_from_delta<T, C>(delta: TimeDelta<T>) -> Severity<C>
where
    T: SolverVariable,
    C: SolverVariable + TryFrom<T>,
{
    debug_assert!(!delta.is_negative());
    let value: C = C::try_from(delta.value())
        .ok()
        .expect("time span does not fit in the severity primitive");
    Severity::new(value)
}

pub mod prelude {
    pub use super::dependency::DependencyConstraint;
    pub use super::no_overlap::NoOverlapConstraint;
    pub use super::start_now::StartNowConstraint;
}
