use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use bcsplit::bktree::{BkTree, Hamming};
use bcsplit::demux::{DemuxEngine, DemuxParams, NoMatchBin, Window};

const N_BARCODES: usize = 2_000; // dictionary size
const N_QUERIES: usize = 10_000;
const BC_LEN: usize = 8;

fn random_barcodes(rng: &mut StdRng, n: usize) -> Vec<String> {
    (0..n)
        .map(|_| {
            (0..BC_LEN)
                .map(|_| b"ACGT"[rng.gen_range(0..4)] as char)
                .collect()
        })
        .collect()
}

fn build_tree(barcodes: &[String]) -> BkTree<String, Hamming> {
    let mut tree = BkTree::new(Hamming);
    for bc in barcodes {
        let _ = tree.insert(bc.clone());
    }
    tree
}

fn bench_build(c: &mut Criterion) {
    let barcodes = random_barcodes(&mut StdRng::seed_from_u64(0), N_BARCODES);
    c.bench_function("build", |b| b.iter(|| black_box(build_tree(&barcodes)).len()));
}

fn bench_find(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let tree = build_tree(&random_barcodes(&mut rng, N_BARCODES));
    let queries = random_barcodes(&mut rng, N_QUERIES);

    for threshold in [0, 1, 2] {
        c.bench_function(&format!("find_t{}", threshold), |b| {
            b.iter(|| {
                let mut hits = 0usize;
                for q in &queries {
                    hits += tree.find(black_box(q), threshold).map(|h| h.len()).unwrap_or(0);
                }
                black_box(hits)
            })
        });
    }
}

fn bench_classify(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let tree = build_tree(&random_barcodes(&mut rng, N_BARCODES));
    let queries = random_barcodes(&mut rng, N_QUERIES);
    let engine = DemuxEngine::new(
        tree,
        DemuxParams {
            barcode: Window::new(0, BC_LEN),
            umi: None,
            cutoff: 1,
            no_match_bin: NoMatchBin::Cutoff,
        },
    )
    .unwrap();

    c.bench_function("classify", |b| {
        b.iter(|| {
            for q in &queries {
                let _ = black_box(engine.classify(q));
            }
        })
    });
}

criterion_group!(benches, bench_build, bench_find, bench_classify);
criterion_main!(benches);
