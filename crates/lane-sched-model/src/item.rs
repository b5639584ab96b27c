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

//! # Problem Entities
//!
//! Immutable entities of a scheduling run:
//!
//! - [`LaneDurations`]: how long an item occupies each of its lanes.
//! - [`Item`]: a unit of work, identified by id, with the lanes it
//!   occupies, the items it requires, and (for lane-switching items) the
//!   alternative duration maps it may switch to.
//! - [`ScheduledItem`]: an item placed at a concrete start time.
//!
//! Items and scheduled items compare and hash by id alone: a scheduled
//! item is identified by its item, not by its start.

use crate::{
    err::{
        EmptyDurationsError, ItemBuildError, MissingAlternativesError, NonPositiveDurationError,
        UnknownAlternativeError,
    },
    id::{ItemId, LaneId},
};
use lane_sched_core::{
    SolverVariable,
    time::{TimeDelta, TimeInterval, TimePoint},
};
use std::{
    collections::BTreeMap,
    fmt::Display,
    hash::{Hash, Hasher},
    sync::Arc,
};

/// A validated, ordered map from lane to occupation duration.
///
/// Always non-empty with strictly positive durations. The maximum and the
/// sum over all lanes are precomputed since the solver reads them on every
/// candidate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneDurations<T: SolverVariable> {
    durations: BTreeMap<LaneId, TimeDelta<T>>,
    max_duration: TimeDelta<T>,
    summary: TimeDelta<T>,
}

impl<T: SolverVariable> LaneDurations<T> {
    fn from_validated(durations: BTreeMap<LaneId, TimeDelta<T>>) -> Self {
        debug_assert!(!durations.is_empty());
        let max_duration = durations
            .values()
            .copied()
            .max()
            .unwrap_or_else(TimeDelta::zero);
        let summary = durations.values().copied().sum();
        Self {
            durations,
            max_duration,
            summary,
        }
    }

    fn validate(
        id: ItemId,
        durations: &BTreeMap<LaneId, TimeDelta<T>>,
    ) -> Result<(), ItemBuildError<T>> {
        if durations.is_empty() {
            return Err(EmptyDurationsError::new(id).into());
        }
        for (&lane, &duration) in durations {
            if !duration.is_positive() {
                return Err(NonPositiveDurationError::new(id, lane, duration).into());
            }
        }
        Ok(())
    }

    /// The duration the item occupies `lane`, if it occupies it at all.
    #[inline]
    pub fn get(&self, lane: LaneId) -> Option<TimeDelta<T>> {
        self.durations.get(&lane).copied()
    }

    /// The longest single-lane duration.
    #[inline]
    pub fn max_duration(&self) -> TimeDelta<T> {
        self.max_duration
    }

    /// The sum over all lane durations.
    #[inline]
    pub fn summary(&self) -> TimeDelta<T> {
        self.summary
    }

    #[inline]
    pub fn lane_count(&self) -> usize {
        self.durations.len()
    }

    #[inline]
    pub fn lanes(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.durations.keys().copied()
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (LaneId, TimeDelta<T>)> + '_ {
        self.durations.iter().map(|(&l, &d)| (l, d))
    }

    /// Returns `true` if both maps occupy at least one common lane.
    #[inline]
    pub fn shares_lane_with(&self, other: &Self) -> bool {
        // Walk the smaller map, probe the larger one.
        let (small, large) = if self.durations.len() <= other.durations.len() {
            (&self.durations, &other.durations)
        } else {
            (&other.durations, &self.durations)
        };
        small.keys().any(|lane| large.contains_key(lane))
    }
}

/// A unit of work to be scheduled.
///
/// Carries the lanes it occupies, the ids of the items it requires, and,
/// for lane-switching items, a non-empty list of alternative duration
/// maps. A plain item has an empty alternatives list.
#[derive(Debug, Clone)]
pub struct Item<T: SolverVariable> {
    id: ItemId,
    durations: LaneDurations<T>,
    required: Vec<ItemId>,
    alternatives: Vec<LaneDurations<T>>,
}

impl<T: SolverVariable> Item<T> {
    /// Creates a plain item.
    pub fn new(
        id: ItemId,
        durations: BTreeMap<LaneId, TimeDelta<T>>,
        required: Vec<ItemId>,
    ) -> Result<Self, ItemBuildError<T>> {
        LaneDurations::validate(id, &durations)?;
        Ok(Self {
            id,
            durations: LaneDurations::from_validated(durations),
            required,
            alternatives: Vec::new(),
        })
    }

    /// Creates a lane-switching item with a non-empty alternative list.
    pub fn with_alternatives(
        id: ItemId,
        durations: BTreeMap<LaneId, TimeDelta<T>>,
        required: Vec<ItemId>,
        alternatives: Vec<BTreeMap<LaneId, TimeDelta<T>>>,
    ) -> Result<Self, ItemBuildError<T>> {
        if alternatives.is_empty() {
            return Err(MissingAlternativesError::new(id).into());
        }
        LaneDurations::validate(id, &durations)?;
        for alternative in &alternatives {
            LaneDurations::validate(id, alternative)?;
        }
        Ok(Self {
            id,
            durations: LaneDurations::from_validated(durations),
            required,
            alternatives: alternatives
                .into_iter()
                .map(LaneDurations::from_validated)
                .collect(),
        })
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.id
    }

    #[inline]
    pub fn durations(&self) -> &LaneDurations<T> {
        &self.durations
    }

    #[inline]
    pub fn required(&self) -> &[ItemId] {
        &self.required
    }

    #[inline]
    pub fn alternatives(&self) -> &[LaneDurations<T>] {
        &self.alternatives
    }

    #[inline]
    pub fn is_lane_switching(&self) -> bool {
        !self.alternatives.is_empty()
    }

    #[inline]
    pub fn max_duration(&self) -> TimeDelta<T> {
        self.durations.max_duration()
    }

    #[inline]
    pub fn duration_summary(&self) -> TimeDelta<T> {
        self.durations.summary()
    }

    #[inline]
    pub fn duration_on(&self, lane: LaneId) -> Option<TimeDelta<T>> {
        self.durations.get(lane)
    }

    /// Produces a new item whose active durations are alternative `index`.
    ///
    /// The new alternatives list is the previously active map followed by
    /// the remaining alternatives in their original order, so the list
    /// length is preserved and the active map never appears in it.
    pub fn switched(&self, index: usize) -> Result<Self, UnknownAlternativeError> {
        if index >= self.alternatives.len() {
            return Err(UnknownAlternativeError::new(
                self.id,
                index,
                self.alternatives.len(),
            ));
        }
        let mut alternatives = Vec::with_capacity(self.alternatives.len());
        alternatives.push(self.durations.clone());
        for (i, alternative) in self.alternatives.iter().enumerate() {
            if i != index {
                alternatives.push(alternative.clone());
            }
        }
        Ok(Self {
            id: self.id,
            durations: self.alternatives[index].clone(),
            required: self.required.clone(),
            alternatives,
        })
    }
}

// Identity is the id; two items with the same id are the same item even
// when their active durations differ (lane switching).
impl<T: SolverVariable> PartialEq for Item<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T: SolverVariable> Eq for Item<T> {}

impl<T: SolverVariable> Hash for Item<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T: SolverVariable> Display for Item<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Item(id: {}, lanes: {}, required: {}, alternatives: {})",
            self.id,
            self.durations.lane_count(),
            self.required.len(),
            self.alternatives.len()
        )
    }
}

/// An item placed at a concrete start time.
///
/// Immutable; moving the item produces a new instance via
/// [`ScheduledItem::with_start`].
#[derive(Debug, Clone)]
pub struct ScheduledItem<T: SolverVariable> {
    item: Arc<Item<T>>,
    start: TimePoint<T>,
}

impl<T: SolverVariable> ScheduledItem<T> {
    #[inline]
    pub fn new(item: Arc<Item<T>>, start: TimePoint<T>) -> Self {
        Self { item, start }
    }

    #[inline]
    pub fn id(&self) -> ItemId {
        self.item.id()
    }

    #[inline]
    pub fn item(&self) -> &Item<T> {
        &self.item
    }

    #[inline]
    pub fn item_arc(&self) -> &Arc<Item<T>> {
        &self.item
    }

    #[inline]
    pub fn start(&self) -> TimePoint<T> {
        self.start
    }

    /// The end time on `lane`, if the item occupies it.
    #[inline]
    pub fn end_on(&self, lane: LaneId) -> Option<TimePoint<T>> {
        self.item.duration_on(lane).map(|d| self.start + d)
    }

    /// The latest end time over all occupied lanes.
    #[inline]
    pub fn latest_end(&self) -> TimePoint<T> {
        self.start + self.item.max_duration()
    }

    /// The occupation interval on `lane`, if the item occupies it.
    #[inline]
    pub fn interval_on(&self, lane: LaneId) -> Option<TimeInterval<T>> {
        self.item
            .duration_on(lane)
            .map(|d| TimeInterval::new(self.start, self.start + d))
    }

    /// A copy of this scheduled item at a different start.
    #[inline]
    pub fn with_start(&self, start: TimePoint<T>) -> Self {
        Self {
            item: Arc::clone(&self.item),
            start,
        }
    }

    /// A copy placed at the same start but backed by a different rendition
    /// of the same item (lane switching).
    #[inline]
    pub fn with_item(&self, item: Arc<Item<T>>) -> Self {
        debug_assert_eq!(item.id(), self.item.id());
        Self {
            item,
            start: self.start,
        }
    }
}

impl<T: SolverVariable> PartialEq for ScheduledItem<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<T: SolverVariable> Eq for ScheduledItem<T> {}

impl<T: SolverVariable> Hash for ScheduledItem<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl<T: SolverVariable> Display for ScheduledItem<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ScheduledItem(id: {}, start: {})", self.id(), self.start)
    }
}
