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

use crate::id::{ItemId, LaneId};
use lane_sched_core::{SolverVariable, time::TimeDelta};
use std::fmt::Display;

/// An item was declared without any lane occupation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmptyDurationsError {
    id: ItemId,
}

impl EmptyDurationsError {
    #[inline]
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }
}

impl Display for EmptyDurationsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item {} occupies no lanes", self.id)
    }
}

impl std::error::Error for EmptyDurationsError {}

/// An item declared a zero or negative duration on one of its lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonPositiveDurationError<T: SolverVariable> {
    id: ItemId,
    lane: LaneId,
    duration: TimeDelta<T>,
}

impl<T: SolverVariable> NonPositiveDurationError<T> {
    #[inline]
    pub fn new(id: ItemId, lane: LaneId, duration: TimeDelta<T>) -> Self {
        Self { id, lane, duration }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[inline]
    pub fn lane(&self) -> LaneId {
        self.lane
    }

    #[inline]
    pub fn duration(&self) -> TimeDelta<T> {
        self.duration
    }
}

impl<T: SolverVariable> Display for NonPositiveDurationError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Item {} has non-positive duration {} on lane {}",
            self.id, self.duration, self.lane
        )
    }
}

impl<T: SolverVariable> std::error::Error for NonPositiveDurationError<T> {}

/// A lane-switching item was declared without any alternative durations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MissingAlternativesError {
    id: ItemId,
}

impl MissingAlternativesError {
    #[inline]
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }
}

impl Display for MissingAlternativesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lane-switching item {} has no alternative durations", self.id)
    }
}

impl std::error::Error for MissingAlternativesError {}

/// Failure to construct an [`crate::item::Item`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemBuildError<T: SolverVariable> {
    EmptyDurations(EmptyDurationsError),
    NonPositiveDuration(NonPositiveDurationError<T>),
    MissingAlternatives(MissingAlternativesError),
}

impl<T: SolverVariable> Display for ItemBuildError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemBuildError::EmptyDurations(e) => write!(f, "{}", e),
            ItemBuildError::NonPositiveDuration(e) => write!(f, "{}", e),
            ItemBuildError::MissingAlternatives(e) => write!(f, "{}", e),
        }
    }
}

impl<T: SolverVariable> std::error::Error for ItemBuildError<T> {}

impl<T: SolverVariable> From<EmptyDurationsError> for ItemBuildError<T> {
    fn from(e: EmptyDurationsError) -> Self {
        ItemBuildError::EmptyDurations(e)
    }
}

impl<T: SolverVariable> From<NonPositiveDurationError<T>> for ItemBuildError<T> {
    fn from(e: NonPositiveDurationError<T>) -> Self {
        ItemBuildError::NonPositiveDuration(e)
    }
}

impl<T: SolverVariable> From<MissingAlternativesError> for ItemBuildError<T> {
    fn from(e: MissingAlternativesError) -> Self {
        ItemBuildError::MissingAlternatives(e)
    }
}

/// A lane switch referenced an alternative index that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnknownAlternativeError {
    id: ItemId,
    index: usize,
    available: usize,
}

impl UnknownAlternativeError {
    #[inline]
    pub fn new(id: ItemId, index: usize, available: usize) -> Self {
        Self {
            id,
            index,
            available,
        }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.available
    }
}

impl Display for UnknownAlternativeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Item {} has {} alternative durations, index {} does not exist",
            self.id, self.available, self.index
        )
    }
}

impl std::error::Error for UnknownAlternativeError {}

/// The same item id was passed into a problem more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DuplicateItemError {
    id: ItemId,
}

impl DuplicateItemError {
    #[inline]
    pub fn new(id: ItemId) -> Self {
        Self { id }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }
}

impl Display for DuplicateItemError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Item {} passed into the problem more than once", self.id)
    }
}

impl std::error::Error for DuplicateItemError {}
