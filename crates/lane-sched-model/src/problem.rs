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
    err::DuplicateItemError,
    id::{ItemId, LaneId},
    item::{Item, ScheduledItem},
};
use lane_sched_core::{SolverVariable, time::TimeDelta};
use std::{
    collections::{HashMap, HashSet},
    fmt::Display,
    sync::Arc,
};

/// Aggregate figures over a problem instance, computed once at build time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemStats<T: SolverVariable> {
    item_count: usize,
    fixed_count: usize,
    lane_count: usize,
    dependency_edge_count: usize,
    /// Sum over every item's duration summary; an upper bound on the
    /// serial makespan.
    total_duration: TimeDelta<T>,
}

impl<T: SolverVariable> ProblemStats<T> {
    #[inline]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    #[inline]
    pub fn fixed_count(&self) -> usize {
        self.fixed_count
    }

    #[inline]
    pub fn lane_count(&self) -> usize {
        self.lane_count
    }

    #[inline]
    pub fn dependency_edge_count(&self) -> usize {
        self.dependency_edge_count
    }

    #[inline]
    pub fn total_duration(&self) -> TimeDelta<T> {
        self.total_duration
    }
}

/// A validated scheduling problem: the items to place plus the already
/// placed items the solver must not touch.
#[derive(Debug, Clone)]
pub struct Problem<T = i64>
where
    T: SolverVariable,
{
    items: Vec<Arc<Item<T>>>,
    item_index: HashMap<ItemId, usize>,
    fixed: Vec<ScheduledItem<T>>,
    fixed_index: HashMap<ItemId, usize>,
    stats: ProblemStats<T>,
}

impl<T: SolverVariable> Problem<T> {
    /// Builds a problem from movable items and fixed placements.
    ///
    /// Rejects any id appearing twice, whether among the items, among the
    /// fixed placements, or across the two sets.
    pub fn new(
        items: Vec<Arc<Item<T>>>,
        fixed: Vec<ScheduledItem<T>>,
    ) -> Result<Self, DuplicateItemError> {
        let mut item_index = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            if item_index.insert(item.id(), idx).is_some() {
                return Err(DuplicateItemError::new(item.id()));
            }
        }
        let mut fixed_index = HashMap::with_capacity(fixed.len());
        for (idx, placed) in fixed.iter().enumerate() {
            if item_index.contains_key(&placed.id()) || fixed_index.insert(placed.id(), idx).is_some()
            {
                return Err(DuplicateItemError::new(placed.id()));
            }
        }

        let mut lanes: HashSet<LaneId> = HashSet::new();
        let mut dependency_edge_count = 0;
        let mut total_duration = TimeDelta::zero();
        for item in items
            .iter()
            .map(Arc::as_ref)
            .chain(fixed.iter().map(|p| p.item()))
        {
            lanes.extend(item.durations().lanes());
            dependency_edge_count += item.required().len();
            total_duration += item.duration_summary();
        }

        let stats = ProblemStats {
            item_count: items.len(),
            fixed_count: fixed.len(),
            lane_count: lanes.len(),
            dependency_edge_count,
            total_duration,
        };

        Ok(Self {
            items,
            item_index,
            fixed,
            fixed_index,
            stats,
        })
    }

    #[inline]
    pub fn items(&self) -> &[Arc<Item<T>>] {
        &self.items
    }

    #[inline]
    pub fn fixed(&self) -> &[ScheduledItem<T>] {
        &self.fixed
    }

    #[inline]
    pub fn total_items(&self) -> usize {
        self.items.len() + self.fixed.len()
    }

    #[inline]
    pub fn get_item(&self, id: ItemId) -> Option<&Arc<Item<T>>> {
        let idx = self.item_index.get(&id)?;
        self.items.get(*idx)
    }

    #[inline]
    pub fn get_fixed(&self, id: ItemId) -> Option<&ScheduledItem<T>> {
        let idx = self.fixed_index.get(&id)?;
        self.fixed.get(*idx)
    }

    #[inline]
    pub fn iter_items(&self) -> impl Iterator<Item = &Arc<Item<T>>> {
        self.items.iter()
    }

    #[inline]
    pub fn iter_fixed(&self) -> impl Iterator<Item = &ScheduledItem<T>> {
        self.fixed.iter()
    }

    /// All items of the run, movable first, fixed afterwards.
    #[inline]
    pub fn iter_all_items(&self) -> impl Iterator<Item = &Item<T>> {
        self.items
            .iter()
            .map(Arc::as_ref)
            .chain(self.fixed.iter().map(|p| p.item()))
    }

    #[inline]
    pub fn stats(&self) -> &ProblemStats<T> {
        &self.stats
    }
}

impl<T: SolverVariable> Display for Problem<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Problem(items: {}, fixed: {}, lanes: {}, dependency edges: {})",
            self.stats.item_count(),
            self.stats.fixed_count(),
            self.stats.lane_count(),
            self.stats.dependency_edge_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_sched_core::time::TimePoint;
    use std::collections::BTreeMap;

    fn item(id: u64, lane: u32, duration: i64) -> Arc<Item<i64>> {
        let mut durations = BTreeMap::new();
        durations.insert(LaneId::new(lane), TimeDelta::new(duration));
        Arc::new(Item::new(ItemId::new(id), durations, vec![]).unwrap())
    }

    #[test]
    fn test_build_and_lookup() {
        let problem = Problem::new(vec![item(1, 0, 10), item(2, 1, 20)], vec![]).unwrap();
        assert_eq!(problem.total_items(), 2);
        assert!(problem.get_item(ItemId::new(2)).is_some());
        assert!(problem.get_item(ItemId::new(3)).is_none());
        assert_eq!(problem.stats().lane_count(), 2);
        assert_eq!(problem.stats().total_duration(), TimeDelta::new(30));
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let err = Problem::new(vec![item(1, 0, 10), item(1, 1, 20)], vec![]).unwrap_err();
        assert_eq!(err.id(), ItemId::new(1));
    }

    #[test]
    fn test_duplicate_across_fixed_rejected() {
        let fixed = ScheduledItem::new(item(1, 0, 10), TimePoint::new(0));
        let err = Problem::new(vec![item(1, 1, 20)], vec![fixed]).unwrap_err();
        assert_eq!(err.id(), ItemId::new(1));
    }
}
