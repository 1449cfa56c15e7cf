use criterion::{black_box, criterion_group, criterion_main, Criterion};
use piecore::board::Position;
use piecore::perft::perft;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn bench_perft(c: &mut Criterion) {
    let start = Position::startpos();
    c.bench_function("perft_4_startpos", |ben| {
        ben.iter(|| {
            let mut pos = start.clone();
            black_box(perft(&mut pos, black_box(4)))
        })
    });

    let kiwi = Position::from_fen(KIWIPETE).expect("valid fen");
    c.bench_function("perft_3_kiwipete", |ben| {
        ben.iter(|| {
            let mut pos = kiwi.clone();
            black_box(perft(&mut pos, black_box(3)))
        })
    });
}

criterion_group!(benches, bench_perft);
criterion_main!(benches);
