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

//! # Heuristic-Repair Scheduling Engine
//!
//! A constraint-based scheduler: items occupy one or more lanes for known
//! durations, and the engine assigns start times that satisfy all hard
//! constraints while minimizing soft violations and makespan. The search
//! is min-conflicts style repair from a greedy start plan, with
//! dedicated escapes for local optima and optional parallel scheduling of
//! independent item clusters.

pub mod configurations;
pub mod constraint;
pub mod constraints;
pub mod engine;
pub mod err;
pub mod plan;
pub mod predictor;
pub mod violations;

pub mod prelude {
    pub use crate::constraint::{
        ConflictKind, Decision, ItemPairConstraint, Prediction, SingleItemConstraint,
        UpdateableConstraint,
    };
    pub use crate::constraints::prelude::*;
    pub use crate::engine::{HeuristicRepairScheduler, SchedulerConfig};
    pub use crate::err::SchedulingError;
    pub use crate::plan::SchedulePlan;
}
