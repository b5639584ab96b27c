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

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use lane_sched_model::prelude::*;
use lane_sched_solver::prelude::*;
use std::hint::black_box;

fn generated_problem(items: usize, seed: u64) -> Problem<i64> {
    let config = InstanceGenConfigBuilder::new()
        .lane_count(6)
        .item_count(items)
        .dependency_probability(0.3)
        .seed(seed)
        .build();
    InstanceGenerator::new(config).generate()
}

fn bench_schedule(c: &mut Criterion) {
    let mut group = c.benchmark_group("schedule");
    for &size in &[16usize, 64, 128] {
        let problem = generated_problem(size, 42);

        group.bench_with_input(BenchmarkId::new("sequential", size), &problem, |b, p| {
            b.iter(|| {
                let mut scheduler = HeuristicRepairScheduler::<i64, i64>::new(SchedulerConfig {
                    caching_result_plan: false,
                    ..SchedulerConfig::default()
                });
                black_box(scheduler.schedule(p).expect("instances are feasible"));
            })
        });

        group.bench_with_input(BenchmarkId::new("parallel", size), &problem, |b, p| {
            b.iter(|| {
                let mut scheduler = HeuristicRepairScheduler::<i64, i64>::new(SchedulerConfig {
                    caching_result_plan: false,
                    parallel_scheduling: true,
                    ..SchedulerConfig::default()
                });
                black_box(scheduler.schedule(p).expect("instances are feasible"));
            })
        });
    }
    group.finish();
}

fn bench_warm_start(c: &mut Criterion) {
    let problem = generated_problem(96, 7);
    c.bench_function("schedule/warm_start", |b| {
        let mut scheduler = HeuristicRepairScheduler::<i64, i64>::new(SchedulerConfig::default());
        scheduler.schedule(&problem).expect("instances are feasible");
        b.iter(|| {
            black_box(scheduler.schedule(&problem).expect("instances are feasible"));
        })
    });
}

criterion_group!(benches, bench_schedule, bench_warm_start);
criterion_main!(benches);
