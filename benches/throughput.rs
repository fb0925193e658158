use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use story_ledger::{run, LedgerConfig, MemoryStore, OfflineGenerator, SettlementMode, Storyteller};
use tokio::runtime::Runtime;

struct NoopWriter;

impl io::Write for NoopWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // Just return the length of input without actually writing
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

async fn run_once(settlement: SettlementMode) {
    let teller = Storyteller::new(
        Arc::new(MemoryStore::new()),
        Arc::new(OfflineGenerator),
        LedgerConfig {
            settlement,
            ..LedgerConfig::default()
        },
    );
    run("data/1K_users.csv", Arc::new(teller), NoopWriter)
        .await
        .unwrap();
}

fn process_requests(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");

    group.throughput(Throughput::Elements(5_000)); // 1K users x 5 actions in the input file
    group.measurement_time(Duration::from_secs(30));
    group.sample_size(50);

    group.bench_function("atomic_1K_users_5K_actions", |b| {
        let rt = Runtime::new().unwrap();
        b.to_async(rt)
            .iter(|| run_once(SettlementMode::Atomic));
    });

    group.bench_function("sequential_1K_users_5K_actions", |b| {
        let rt = Runtime::new().unwrap();
        b.to_async(rt)
            .iter(|| run_once(SettlementMode::Sequential));
    });

    group.finish();
}

criterion_group!(benches, process_requests);
criterion_main!(benches);
