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

use lane_sched_model::prelude::*;
use lane_sched_solver::prelude::*;
use serde::Serialize;
use std::{fs::File, io::BufWriter, time::Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[derive(Debug, Clone, Serialize)]
struct InstanceInfo {
    idx: usize,
    seed: u64,
    lane_count: u32,
    item_count: usize,
    dependency_edges: usize,
}

#[derive(Debug, Clone, Serialize)]
struct RunResult {
    instance: InstanceInfo,
    makespan: i64,
    backsteps: u64,
    elapsed_ms: u128,
    parallel_makespan: i64,
    parallel_elapsed_ms: u128,
}

#[derive(Debug, Clone, Serialize)]
struct BenchmarkReport {
    description: String,
    instances: Vec<RunResult>,
}

fn interpolate(val0: usize, val1: usize, step: usize, steps: usize) -> usize {
    if steps <= 1 {
        return val1;
    }
    let num = (val1 as isize - val0 as isize) * step as isize;
    (val0 as isize + num / (steps as isize - 1)).max(0) as usize
}

fn main() {
    enable_tracing();

    let n_instances = 8usize;
    let min_items = 16usize;
    let max_items = 160usize;

    let mut results: Vec<RunResult> = Vec::with_capacity(n_instances);

    for idx in 0..n_instances {
        let item_count = interpolate(min_items, max_items, idx, n_instances);
        let seed = 42 + idx as u64;
        let lane_count = 6;

        let config = InstanceGenConfigBuilder::new()
            .lane_count(lane_count)
            .item_count(item_count)
            .dependency_probability(0.3)
            .switch_probability(0.1)
            .seed(seed)
            .build();
        let problem = InstanceGenerator::new(config).generate();

        let mut scheduler = HeuristicRepairScheduler::<i64, i64>::new(SchedulerConfig {
            caching_result_plan: false,
            ..SchedulerConfig::default()
        });
        let t0 = Instant::now();
        let plan = scheduler.schedule(&problem).expect("instance is feasible");
        let elapsed = t0.elapsed();

        let mut parallel_scheduler = HeuristicRepairScheduler::<i64, i64>::new(SchedulerConfig {
            caching_result_plan: false,
            parallel_scheduling: true,
            ..SchedulerConfig::default()
        });
        let t1 = Instant::now();
        let parallel_plan = parallel_scheduler
            .schedule(&problem)
            .expect("instance is feasible");
        let parallel_elapsed = t1.elapsed();

        info!(
            idx,
            item_count,
            makespan = plan.makespan().value(),
            backsteps = scheduler.backsteps(),
            elapsed_ms = elapsed.as_millis(),
            parallel_elapsed_ms = parallel_elapsed.as_millis(),
            "instance solved"
        );

        results.push(RunResult {
            instance: InstanceInfo {
                idx,
                seed,
                lane_count,
                item_count,
                dependency_edges: problem.stats().dependency_edge_count(),
            },
            makespan: plan.makespan().value(),
            backsteps: scheduler.backsteps(),
            elapsed_ms: elapsed.as_millis(),
            parallel_makespan: parallel_plan.makespan().value(),
            parallel_elapsed_ms: parallel_elapsed.as_millis(),
        });
    }

    let report = BenchmarkReport {
        description: "lane-sched ramp benchmark".to_string(),
        instances: results,
    };
    let file = File::create("lane-sched-report.json").expect("report file is writable");
    serde_json::to_writer_pretty(BufWriter::new(file), &report).expect("report serializes");
    info!("report written to lane-sched-report.json");
}
