use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion, Throughput};

use kyrotms::{KbConfig, KnowledgeBase, Statement};

const CHAIN_LEN: u32 = 64;

fn st(predicate: &str, tokens: &[&str]) -> Statement {
    Statement::of(predicate, tokens).unwrap()
}

/// Linear `parent` chain n0 -> n1 -> ... with the two `ancestor` rules, so
/// every new link derives ancestors all the way back.
fn ancestor_rules(kb: &mut KnowledgeBase) {
    kb.assert_rule(
        vec![st("parent", &["?x", "?y"])],
        st("ancestor", &["?x", "?y"]),
    )
    .unwrap();
    kb.assert_rule(
        vec![st("parent", &["?x", "?y"]), st("ancestor", &["?y", "?z"])],
        st("ancestor", &["?x", "?z"]),
    )
    .unwrap();
}

fn link(i: u32) -> Statement {
    let from = format!("n{i}");
    let to = format!("n{}", i + 1);
    st("parent", &[&from, &to])
}

fn build_chain(len: u32) -> KnowledgeBase {
    let mut kb = KnowledgeBase::with_config(KbConfig::silent());
    ancestor_rules(&mut kb);
    // Assert from the tail so each link extends existing ancestors.
    for i in (0..len).rev() {
        kb.assert_fact(link(i));
    }
    kb
}

fn bench_forward_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward_chain");
    group.throughput(Throughput::Elements(u64::from(CHAIN_LEN)));

    group.bench_function("ancestor_chain", |b| {
        b.iter(|| black_box(build_chain(CHAIN_LEN)));
    });

    group.bench_function("ask_open_query", |b| {
        let kb = build_chain(CHAIN_LEN);
        let query = st("ancestor", &["n0", "?z"]);
        b.iter(|| black_box(kb.ask_statement(&query)));
    });

    group.finish();
}

fn bench_retract_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("retract");
    group.throughput(Throughput::Elements(1));

    // Removing the last link invalidates every ancestor that reaches its tail.
    group.bench_function("cascade_from_tail", |b| {
        b.iter_batched(
            || build_chain(CHAIN_LEN),
            |mut kb| {
                let outcome = kb.retract_statement(&link(CHAIN_LEN - 1)).unwrap();
                black_box(outcome)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(forward_chain, bench_forward_chain, bench_retract_cascade);
criterion_main!(forward_chain);
