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

//! # Schedule Plan
//!
//! The mutable assignment the solver works on. Besides the placements
//! themselves the plan maintains:
//!
//! - a key-count multiset of every scheduled start and per-lane end time,
//!   which doubles as the candidate start enumeration and as the makespan
//!   source;
//! - the reverse dependency index (who required whom);
//! - the set of fixed items that must not move.
//!
//! The multiset is count-based so that removing one contributor to a time
//! point keeps the point alive while others still reference it.

use crate::err::{AlreadyScheduledError, FixedItemError, NotScheduledError, PlanError};
use lane_sched_core::{
    SolverVariable,
    time::{TimeDelta, TimePoint},
};
use lane_sched_model::{
    id::ItemId,
    item::{Item, ScheduledItem},
};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt::Display,
    sync::Arc,
};

#[derive(Debug, Clone, Default)]
pub struct SchedulePlan<T: SolverVariable> {
    scheduled: HashMap<ItemId, ScheduledItem<T>>,
    start_values: BTreeMap<TimePoint<T>, usize>,
    dependents: HashMap<ItemId, HashSet<ItemId>>,
    fixed: HashSet<ItemId>,
}

impl<T: SolverVariable> SchedulePlan<T> {
    pub fn new() -> Self {
        Self {
            scheduled: HashMap::new(),
            start_values: BTreeMap::new(),
            dependents: HashMap::new(),
            fixed: HashSet::new(),
        }
    }

    /// The latest time point referenced by any start or lane end, or zero
    /// for an empty plan.
    #[inline]
    pub fn makespan(&self) -> TimePoint<T> {
        self.start_values
            .last_key_value()
            .map(|(&t, _)| t)
            .unwrap_or_else(TimePoint::zero)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.scheduled.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.scheduled.is_empty()
    }

    #[inline]
    pub fn get(&self, id: ItemId) -> Option<&ScheduledItem<T>> {
        self.scheduled.get(&id)
    }

    #[inline]
    pub fn contains(&self, id: ItemId) -> bool {
        self.scheduled.contains_key(&id)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledItem<T>> {
        self.scheduled.values()
    }

    #[inline]
    pub fn is_fixed(&self, id: ItemId) -> bool {
        self.fixed.contains(&id)
    }

    /// Whether the solver may relocate this placement.
    #[inline]
    pub fn can_be_moved(&self, scheduled: &ScheduledItem<T>) -> bool {
        !self.fixed.contains(&scheduled.id())
    }

    /// Places `item` at `start` and registers its dependency edges.
    pub fn add(
        &mut self,
        item: Arc<Item<T>>,
        start: TimePoint<T>,
    ) -> Result<ScheduledItem<T>, AlreadyScheduledError> {
        let scheduled = ScheduledItem::new(item, start);
        self.schedule(scheduled.clone())?;
        Ok(scheduled)
    }

    /// Places a pre-built scheduled item; rejects duplicates.
    pub fn schedule(&mut self, scheduled: ScheduledItem<T>) -> Result<(), AlreadyScheduledError> {
        let id = scheduled.id();
        if self.scheduled.contains_key(&id) {
            return Err(AlreadyScheduledError::new(id));
        }
        for &required in scheduled.item().required() {
            self.dependents.entry(required).or_default().insert(id);
        }
        self.insert_time_points(&scheduled);
        self.scheduled.insert(id, scheduled);
        Ok(())
    }

    /// Marks an already present item as immovable.
    pub fn fixate(&mut self, scheduled: &ScheduledItem<T>) -> Result<(), NotScheduledError> {
        let id = scheduled.id();
        if !self.scheduled.contains_key(&id) {
            return Err(NotScheduledError::new(id));
        }
        self.fixed.insert(id);
        Ok(())
    }

    /// Relocates an item to `new_start`, returning the new placement.
    pub fn move_item(
        &mut self,
        id: ItemId,
        new_start: TimePoint<T>,
    ) -> Result<ScheduledItem<T>, PlanError> {
        if self.fixed.contains(&id) {
            return Err(FixedItemError::new(id).into());
        }
        let old = self
            .scheduled
            .get(&id)
            .cloned()
            .ok_or_else(|| NotScheduledError::new(id))?;
        self.remove_time_points(&old);
        let moved = old.with_start(new_start);
        self.insert_time_points(&moved);
        self.scheduled.insert(id, moved.clone());
        Ok(moved)
    }

    /// Atomically replaces a placement with another placement of the same
    /// item, refreshing the time-point multiset.
    ///
    /// The replacement may carry a different rendition of the item (lane
    /// switching), so the per-lane ends of `old` and `new` can differ.
    pub fn exchange(
        &mut self,
        old: &ScheduledItem<T>,
        new: ScheduledItem<T>,
    ) -> Result<(), PlanError> {
        let id = old.id();
        if new.id() != id {
            return Err(NotScheduledError::new(new.id()).into());
        }
        if self.fixed.contains(&id) {
            return Err(FixedItemError::new(id).into());
        }
        let current = self
            .scheduled
            .get(&id)
            .cloned()
            .ok_or_else(|| NotScheduledError::new(id))?;
        self.remove_time_points(&current);
        self.insert_time_points(&new);
        self.scheduled.insert(id, new);
        Ok(())
    }

    /// Moves every non-fixed item by `delta`.
    ///
    /// No check against negative resulting starts is performed; callers
    /// shifting left are expected to have made room first.
    pub fn shift_all(&mut self, delta: TimeDelta<T>) {
        if delta.is_zero() {
            return;
        }
        let ids: Vec<ItemId> = self
            .scheduled
            .keys()
            .filter(|id| !self.fixed.contains(id))
            .copied()
            .collect();
        for id in ids {
            let old = self.scheduled.get(&id).cloned().expect("id was just listed");
            self.remove_time_points(&old);
            let moved = old.with_start(old.start() + delta);
            self.insert_time_points(&moved);
            self.scheduled.insert(id, moved);
        }
    }

    /// Removes an item from the plan. Fixed items stay put.
    pub fn unschedule(&mut self, scheduled: &ScheduledItem<T>) -> Result<(), PlanError> {
        let id = scheduled.id();
        if self.fixed.contains(&id) {
            return Err(FixedItemError::new(id).into());
        }
        let current = self
            .scheduled
            .remove(&id)
            .ok_or_else(|| NotScheduledError::new(id))?;
        self.remove_time_points(&current);
        Ok(())
    }

    /// The currently scheduled items that declared `id` as required,
    /// ordered by start, then id.
    pub fn get_dependents(&self, id: ItemId) -> Vec<ScheduledItem<T>> {
        let mut out: Vec<ScheduledItem<T>> = self
            .dependents
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|dep| self.scheduled.get(dep))
            .cloned()
            .collect();
        out.sort_by_key(|s| (s.start(), s.id()));
        out
    }

    /// The ordered candidate start times: zero plus every time point any
    /// placement starts or ends at.
    pub fn start_candidates(&self) -> Vec<TimePoint<T>> {
        let zero = TimePoint::zero();
        let mut out = Vec::with_capacity(self.start_values.len() + 1);
        let mut zero_seen = false;
        for &t in self.start_values.keys() {
            if !zero_seen {
                if t == zero {
                    zero_seen = true;
                } else if t > zero {
                    out.push(zero);
                    zero_seen = true;
                }
            }
            out.push(t);
        }
        if !zero_seen {
            out.push(zero);
        }
        out
    }

    /// A stable snapshot of the current placements, ordered by id.
    pub fn items_snapshot(&self) -> Vec<ScheduledItem<T>> {
        let mut out: Vec<ScheduledItem<T>> = self.scheduled.values().cloned().collect();
        out.sort_by_key(|s| s.id());
        out
    }

    fn insert_time_points(&mut self, scheduled: &ScheduledItem<T>) {
        *self.start_values.entry(scheduled.start()).or_insert(0) += 1;
        for (lane, _) in scheduled.item().durations().iter() {
            let end = scheduled.end_on(lane).expect("lane is occupied");
            *self.start_values.entry(end).or_insert(0) += 1;
        }
    }

    fn remove_time_points(&mut self, scheduled: &ScheduledItem<T>) {
        self.remove_time_point(scheduled.start());
        for (lane, _) in scheduled.item().durations().iter() {
            let end = scheduled.end_on(lane).expect("lane is occupied");
            self.remove_time_point(end);
        }
    }

    fn remove_time_point(&mut self, t: TimePoint<T>) {
        match self.start_values.get_mut(&t) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.start_values.remove(&t);
            }
            None => debug_assert!(false, "time point missing from multiset"),
        }
    }
}

impl<T: SolverVariable> Display for SchedulePlan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SchedulePlan(items: {}, fixed: {}, makespan: {})",
            self.scheduled.len(),
            self.fixed.len(),
            self.makespan()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_sched_model::id::LaneId;
    use std::collections::BTreeMap as Map;

    fn item(id: u64, lanes: &[(u32, i64)]) -> Arc<Item<i64>> {
        let durations: Map<LaneId, TimeDelta<i64>> = lanes
            .iter()
            .map(|&(l, d)| (LaneId::new(l), TimeDelta::new(d)))
            .collect();
        Arc::new(Item::new(ItemId::new(id), durations, vec![]).unwrap())
    }

    fn item_req(id: u64, lanes: &[(u32, i64)], required: &[u64]) -> Arc<Item<i64>> {
        let durations: Map<LaneId, TimeDelta<i64>> = lanes
            .iter()
            .map(|&(l, d)| (LaneId::new(l), TimeDelta::new(d)))
            .collect();
        let required = required.iter().map(|&r| ItemId::new(r)).collect();
        Arc::new(Item::new(ItemId::new(id), durations, required).unwrap())
    }

    #[test]
    fn test_empty_plan_makespan_zero() {
        let plan: SchedulePlan<i64> = SchedulePlan::new();
        assert_eq!(plan.makespan(), TimePoint::zero());
        assert_eq!(plan.start_candidates(), vec![TimePoint::zero()]);
    }

    #[test]
    fn test_add_tracks_makespan_and_candidates() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, &[(0, 10), (1, 4)]), TimePoint::new(2)).unwrap();
        assert_eq!(plan.makespan(), TimePoint::new(12));
        // zero, start 2, end 6 on lane 1, end 12 on lane 0
        assert_eq!(
            plan.start_candidates(),
            vec![
                TimePoint::zero(),
                TimePoint::new(2),
                TimePoint::new(6),
                TimePoint::new(12)
            ]
        );
    }

    #[test]
    fn test_add_rejects_duplicate() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, &[(0, 10)]), TimePoint::zero()).unwrap();
        let err = plan.add(item(1, &[(0, 5)]), TimePoint::zero()).unwrap_err();
        assert_eq!(err.id(), ItemId::new(1));
    }

    #[test]
    fn test_move_updates_multiset() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, &[(0, 10)]), TimePoint::zero()).unwrap();
        plan.add(item(2, &[(0, 10)]), TimePoint::new(10)).unwrap();
        assert_eq!(plan.makespan(), TimePoint::new(20));

        plan.move_item(ItemId::new(2), TimePoint::new(30)).unwrap();
        assert_eq!(plan.makespan(), TimePoint::new(40));
        assert_eq!(
            plan.get(ItemId::new(2)).unwrap().start(),
            TimePoint::new(30)
        );
    }

    #[test]
    fn test_shared_time_point_survives_single_removal() {
        let mut plan = SchedulePlan::new();
        // Both items end at 10 on their lanes.
        plan.add(item(1, &[(0, 10)]), TimePoint::zero()).unwrap();
        plan.add(item(2, &[(1, 5)]), TimePoint::new(5)).unwrap();
        assert_eq!(plan.makespan(), TimePoint::new(10));

        let second = plan.get(ItemId::new(2)).unwrap().clone();
        plan.unschedule(&second).unwrap();
        // Item 1 still ends at 10.
        assert_eq!(plan.makespan(), TimePoint::new(10));
    }

    #[test]
    fn test_fixed_item_cannot_move() {
        let mut plan = SchedulePlan::new();
        let placed = plan.add(item(1, &[(0, 10)]), TimePoint::zero()).unwrap();
        plan.fixate(&placed).unwrap();
        assert!(!plan.can_be_moved(&placed));
        assert!(matches!(
            plan.move_item(ItemId::new(1), TimePoint::new(5)),
            Err(PlanError::Fixed(_))
        ));
        assert!(matches!(
            plan.unschedule(&placed),
            Err(PlanError::Fixed(_))
        ));
    }

    #[test]
    fn test_shift_all_skips_fixed() {
        let mut plan = SchedulePlan::new();
        let fixed = plan.add(item(1, &[(0, 10)]), TimePoint::zero()).unwrap();
        plan.fixate(&fixed).unwrap();
        plan.add(item(2, &[(1, 5)]), TimePoint::new(3)).unwrap();

        plan.shift_all(TimeDelta::new(100));
        assert_eq!(plan.get(ItemId::new(1)).unwrap().start(), TimePoint::zero());
        assert_eq!(
            plan.get(ItemId::new(2)).unwrap().start(),
            TimePoint::new(103)
        );
        assert_eq!(plan.makespan(), TimePoint::new(108));
    }

    #[test]
    fn test_exchange_with_different_durations() {
        let mut plan = SchedulePlan::new();
        let old = plan.add(item(1, &[(0, 10)]), TimePoint::zero()).unwrap();
        let replacement = ScheduledItem::new(item(1, &[(1, 25)]), TimePoint::new(5));
        plan.exchange(&old, replacement).unwrap();
        assert_eq!(plan.makespan(), TimePoint::new(30));
        assert_eq!(
            plan.get(ItemId::new(1)).unwrap().start(),
            TimePoint::new(5)
        );
    }

    #[test]
    fn test_dependents_ordered_by_start_then_id() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, &[(0, 10)]), TimePoint::zero()).unwrap();
        plan.add(item_req(3, &[(0, 5)], &[1]), TimePoint::new(20)).unwrap();
        plan.add(item_req(2, &[(0, 5)], &[1]), TimePoint::new(20)).unwrap();
        plan.add(item_req(4, &[(0, 5)], &[1]), TimePoint::new(10)).unwrap();

        let deps: Vec<u64> = plan
            .get_dependents(ItemId::new(1))
            .iter()
            .map(|s| s.id().value())
            .collect();
        assert_eq!(deps, vec![4, 2, 3]);
    }

    #[test]
    fn test_clone_is_deep_for_containers() {
        let mut plan = SchedulePlan::new();
        plan.add(item(1, &[(0, 10)]), TimePoint::zero()).unwrap();
        let mut copy = plan.clone();
        copy.move_item(ItemId::new(1), TimePoint::new(50)).unwrap();
        assert_eq!(plan.get(ItemId::new(1)).unwrap().start(), TimePoint::zero());
        assert_eq!(plan.makespan(), TimePoint::new(10));
        assert_eq!(copy.makespan(), TimePoint::new(60));
    }
}
