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

//! # Instance Generator
//!
//! Seeded random problem instances for benchmarks and the demo binary.
//! Dependencies only ever point at earlier item ids, so generated
//! instances are always acyclic.

use crate::{
    id::{ItemId, LaneId},
    item::Item,
    problem::Problem,
};
use lane_sched_core::time::TimeDelta;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::{collections::BTreeMap, sync::Arc};

/// Configuration of the random instance generator.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceGenConfig {
    lane_count: u32,
    item_count: usize,
    max_lanes_per_item: usize,
    min_duration: i64,
    max_duration: i64,
    /// Probability that an item requires one earlier item.
    dependency_probability: f64,
    /// Probability that an item carries one alternative duration map.
    switch_probability: f64,
    seed: u64,
}

impl InstanceGenConfig {
    #[inline]
    pub fn lane_count(&self) -> u32 {
        self.lane_count
    }

    #[inline]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl Default for InstanceGenConfig {
    fn default() -> Self {
        Self {
            lane_count: 4,
            item_count: 32,
            max_lanes_per_item: 2,
            min_duration: 5,
            max_duration: 120,
            dependency_probability: 0.25,
            switch_probability: 0.1,
            seed: 42,
        }
    }
}

/// Builder for [`InstanceGenConfig`]; values are clamped to sane ranges.
#[derive(Debug, Clone, Default)]
pub struct InstanceGenConfigBuilder {
    config: InstanceGenConfig,
}

impl InstanceGenConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lane_count(mut self, value: u32) -> Self {
        self.config.lane_count = value.max(1);
        self
    }

    pub fn item_count(mut self, value: usize) -> Self {
        self.config.item_count = value;
        self
    }

    pub fn max_lanes_per_item(mut self, value: usize) -> Self {
        self.config.max_lanes_per_item = value.max(1);
        self
    }

    pub fn duration_range(mut self, min: i64, max: i64) -> Self {
        self.config.min_duration = min.max(1);
        self.config.max_duration = max.max(self.config.min_duration);
        self
    }

    pub fn dependency_probability(mut self, value: f64) -> Self {
        self.config.dependency_probability = value.clamp(0.0, 1.0);
        self
    }

    pub fn switch_probability(mut self, value: f64) -> Self {
        self.config.switch_probability = value.clamp(0.0, 1.0);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.config.seed = value;
        self
    }

    pub fn build(self) -> InstanceGenConfig {
        self.config
    }
}

/// Generates random problems from a seeded [`ChaCha8Rng`].
#[derive(Debug)]
pub struct InstanceGenerator {
    config: InstanceGenConfig,
}

impl InstanceGenerator {
    pub fn new(config: InstanceGenConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InstanceGenConfig {
        &self.config
    }

    fn random_durations(&self, rng: &mut ChaCha8Rng) -> BTreeMap<LaneId, TimeDelta<i64>> {
        let cfg = &self.config;
        let lane_amount = rng.random_range(1..=cfg.max_lanes_per_item.min(cfg.lane_count as usize));
        let mut durations = BTreeMap::new();
        while durations.len() < lane_amount {
            let lane = LaneId::new(rng.random_range(0..cfg.lane_count));
            let duration = rng.random_range(cfg.min_duration..=cfg.max_duration);
            durations.entry(lane).or_insert(TimeDelta::new(duration));
        }
        durations
    }

    /// Generates one instance. Same config, same output.
    pub fn generate(&self) -> Problem<i64> {
        let cfg = &self.config;
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let mut items: Vec<Arc<Item<i64>>> = Vec::with_capacity(cfg.item_count);

        for n in 0..cfg.item_count {
            let id = ItemId::new(n as u64 + 1);
            let durations = self.random_durations(&mut rng);

            let mut required = Vec::new();
            if n > 0 && rng.random_bool(cfg.dependency_probability) {
                let dep = rng.random_range(0..n) as u64 + 1;
                required.push(ItemId::new(dep));
            }

            let item = if rng.random_bool(cfg.switch_probability) {
                let alternative = self.random_durations(&mut rng);
                Item::with_alternatives(id, durations, required, vec![alternative])
            } else {
                Item::new(id, durations, required)
            };
            // Durations are drawn positive, ids are unique by construction.
            items.push(Arc::new(item.expect("generated item is valid")));
        }

        Problem::new(items, Vec::new()).expect("generated ids are unique")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_for_seed() {
        let config = InstanceGenConfigBuilder::new()
            .item_count(20)
            .seed(7)
            .build();
        let a = InstanceGenerator::new(config.clone()).generate();
        let b = InstanceGenerator::new(config).generate();
        assert_eq!(a.total_items(), b.total_items());
        for (x, y) in a.iter_items().zip(b.iter_items()) {
            assert_eq!(x.id(), y.id());
            assert_eq!(x.durations(), y.durations());
            assert_eq!(x.required(), y.required());
        }
    }

    #[test]
    fn test_dependencies_point_backwards() {
        let config = InstanceGenConfigBuilder::new()
            .item_count(50)
            .dependency_probability(1.0)
            .seed(3)
            .build();
        let problem = InstanceGenerator::new(config).generate();
        for item in problem.iter_items() {
            for dep in item.required() {
                assert!(dep.value() < item.id().value());
            }
        }
    }

    #[test]
    fn test_respects_duration_range() {
        let config = InstanceGenConfigBuilder::new()
            .item_count(30)
            .duration_range(10, 20)
            .seed(11)
            .build();
        let problem = InstanceGenerator::new(config).generate();
        for item in problem.iter_items() {
            for (_, d) in item.durations().iter() {
                assert!((10..=20).contains(&d.value()));
            }
        }
    }
}
