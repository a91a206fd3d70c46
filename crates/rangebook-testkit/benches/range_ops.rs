//! Range ledger benchmarks.
//!
//! Holdings are fragmented by interleaving mints between two accounts, so
//! every range stays separate and operations scale with the range count.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rangebook::{Ledger, LedgerConfig};
use rangebook_testkit::fixtures::{LedgerFixture, DEFAULT_TAG};

const WIDTH: u64 = 10;

fn fragmented(ranges: u64) -> LedgerFixture {
    let config = LedgerConfig::default().with_authorized_supply(ranges * WIDTH);
    let mut fixture = LedgerFixture::with_config(config, 2);
    for i in 0..ranges {
        let to = fixture.account(i as usize);
        fixture
            .ledger
            .mint(to, WIDTH, 0, DEFAULT_TAG)
            .expect("bench mint");
    }
    fixture
}

fn bench_transfer(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/transfer");

    for ranges in [10u64, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(ranges), &ranges, |b, &ranges| {
            b.iter_batched(
                || fragmented(ranges),
                |mut fixture| {
                    let (from, to) = (fixture.account(0), fixture.account(1));
                    // Half of the sender's holding crosses every one of its ranges.
                    let amount = ranges / 4 * WIDTH + 1;
                    fixture.ledger.transfer(from, to, black_box(amount)).expect("bench transfer");
                    fixture
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_get_range(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/get_range");

    for ranges in [100u64, 10_000] {
        let fixture = fragmented(ranges);
        let top = ranges * WIDTH;
        group.bench_with_input(BenchmarkId::from_parameter(ranges), &fixture.ledger, |b, ledger| {
            b.iter(|| ledger.get_range(black_box(top / 2 + 3)));
        });
    }

    group.finish();
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger/snapshot");

    for ranges in [100u64, 10_000] {
        let fixture = fragmented(ranges);
        group.bench_with_input(
            BenchmarkId::new("encode", ranges),
            &fixture.ledger,
            |b, ledger: &Ledger| b.iter(|| ledger.snapshot().encode()),
        );
        group.bench_with_input(
            BenchmarkId::new("digest", ranges),
            &fixture.ledger,
            |b, ledger: &Ledger| b.iter(|| ledger.digest()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_transfer, bench_get_range, bench_snapshot);
criterion_main!(benches);
