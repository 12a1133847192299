//! Hot-path benchmarks for chatter-core.

use chatter_core::{ChatMessage, ChatStream};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

fn bench_send_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("send");
    for listeners in [0usize, 8, 64] {
        let stream = ChatStream::new();
        for _ in 0..listeners {
            let _ = stream.register();
        }
        group.bench_function(format!("fanout_{listeners}_listeners"), |b| {
            b.iter(|| stream.send(black_box(ChatMessage::new("bench", "hello"))));
        });
    }
    group.finish();
}

fn bench_register_replay(c: &mut Criterion) {
    let stream = ChatStream::new();
    for i in 0..1_000u32 {
        stream.send(ChatMessage::new("bench", i.to_string()));
    }

    c.bench_function("register_replay_1k_history", |b| {
        b.iter(|| {
            let (id, history) = stream.register();
            black_box(history);
            stream.unregister(id);
        })
    });
}

fn bench_poll_drain(c: &mut Criterion) {
    let stream = ChatStream::new();
    let (id, _) = stream.register();

    c.bench_function("poll_drain_16_unread", |b| {
        b.iter_batched(
            || {
                for i in 0..16u32 {
                    stream.send(ChatMessage::new("bench", i.to_string()));
                }
            },
            |()| black_box(stream.poll(id).unwrap()),
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_send_fanout, bench_register_replay, bench_poll_drain);
criterion_main!(benches);
