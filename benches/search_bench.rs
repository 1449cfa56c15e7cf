use criterion::{black_box, criterion_group, criterion_main, Criterion};
use piecore::board::Position;
use piecore::config::EngineConfig;
use piecore::eval::PstEval;
use piecore::search::{Engine, SearchParams};

fn bench_search(c: &mut Criterion) {
    let pos = Position::startpos();
    c.bench_function("search_depth_5_startpos", |ben| {
        ben.iter(|| {
            let mut engine = Engine::new(PstEval::new(), EngineConfig::default()).expect("engine");
            let r = engine.search(black_box(&pos), SearchParams::depth(5));
            black_box(r.nodes)
        })
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
