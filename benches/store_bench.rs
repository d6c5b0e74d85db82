use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::tempdir;

use voice_reminders::reminders::{now_created_at, ReminderStore};

fn bench_store(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("reminders.db");

    let store = rt.block_on(async {
        ReminderStore::new(db_path.to_string_lossy().to_string())
            .await
            .unwrap()
    });

    rt.block_on(async {
        for i in 0..200 {
            let text = format!("Reminder {i}");
            store
                .insert(&text, &now_created_at(), Some("tomorrow 9am"))
                .await
                .unwrap();
        }
    });

    let mut group = c.benchmark_group("reminders");
    group.bench_function(BenchmarkId::new("list_all", 200), |b| {
        b.iter(|| {
            rt.block_on(async {
                let _ = store.list_all().await.unwrap();
            })
        })
    });

    group.bench_function(BenchmarkId::new("insert_delete", 1), |b| {
        b.iter(|| {
            rt.block_on(async {
                let id = store
                    .insert("Take medicine", &now_created_at(), None)
                    .await
                    .unwrap();
                store.delete(id).await.unwrap();
            })
        })
    });
    group.finish();
}

criterion_group!(benches, bench_store);
criterion_main!(benches);
