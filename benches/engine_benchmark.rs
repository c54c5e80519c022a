use criterion::{criterion_group, criterion_main, Criterion};

use wavefront::domain::sokoban::Sokoban;
use wavefront::engine::{DddBfs, DddOptions, DiskBfs, DiskOptions, MemBfs, MemOptions};

const INSTANCE: &str = "\
size 8 7
map
########
#      #
# $ ####
# $ ...#
# $ ####
#@     #
########
";

fn bench_engines(c: &mut Criterion) {
    let domain = Sokoban::load(INSTANCE).unwrap();

    c.bench_function("mem_exhaustive", |b| {
        b.iter(|| {
            MemBfs::solve(&domain, &MemOptions { stop_on_goal: false }).unwrap()
        });
    });

    c.bench_function("ddd_exhaustive", |b| {
        b.iter(|| {
            DddBfs::solve(
                &domain,
                &DddOptions {
                    capacity: 1 << 14,
                    undirected: false,
                    stop_on_goal: false,
                },
            )
            .unwrap()
        });
    });

    c.bench_function("disk_exhaustive", |b| {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = DiskOptions::new(dir.path().to_path_buf());
        opts.stop_on_goal = false;
        b.iter(|| DiskBfs::solve(&domain, &opts).unwrap());
    });
}

criterion_group!(benches, bench_engines);
criterion_main!(benches);
