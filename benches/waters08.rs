use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use waters_abe::schemes::waters08::*;
use waters_abe::utils::policy::{msp::AccessTree, AccessPolicy};

/// `A0 AND (A1 AND (... AND An))`
fn and_chain(n: usize) -> AccessPolicy {
    let mut policy = AccessPolicy::leaf(&format!("A{}", n - 1));
    for i in (0..n - 1).rev() {
        policy = AccessPolicy::and(AccessPolicy::leaf(&format!("A{}", i)), policy);
    }
    policy
}

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("A{}", i)).collect()
}

fn criterion_waters08_setup(c: &mut Criterion) {
    let mut group = c.benchmark_group("setup");
    group.bench_function("Waters08", |b| {
        let mut rng = rand::thread_rng();
        b.iter(|| setup(254, &mut rng).unwrap());
    });
    group.finish();
}

fn criterion_waters08_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for n in [4u32, 16, 64] {
        let tree = (1..n).fold(AccessTree::leaf(0), |acc, id| {
            if id % 2 == 0 {
                AccessTree::and(acc, AccessTree::leaf(id))
            } else {
                AccessTree::or(acc, AccessTree::leaf(id))
            }
        });
        group.bench_with_input(BenchmarkId::new("Waters08", n), &tree, |b, tree| {
            b.iter(|| tree.compile().unwrap());
        });
    }
    group.finish();
}

fn criterion_waters08_encrypt_decrypt(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let (pp, msk) = setup(254, &mut rng).unwrap();
    let mut encrypt_group = c.benchmark_group("encrypt");
    for n in [2usize, 8, 16] {
        for name in names(n) {
            let _ = pp.register_attribute(&name, &mut rng);
        }
        let matrix = pp.compile_policy(&and_chain(n)).unwrap();
        encrypt_group.bench_with_input(BenchmarkId::new("Waters08", n), &matrix, |b, matrix| {
            let mut rng = rand::thread_rng();
            b.iter(|| encrypt(&pp, matrix, b"our plaintext!", &mut rng).unwrap());
        });
    }
    encrypt_group.finish();

    let mut decrypt_group = c.benchmark_group("decrypt");
    for n in [2usize, 8, 16] {
        let matrix = pp.compile_policy(&and_chain(n)).unwrap();
        let ct = encrypt(&pp, &matrix, b"our plaintext!", &mut rng).unwrap();
        let names = names(n);
        let attributes: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let sk = keygen(&pp, &msk, &attributes, &mut rng).unwrap();
        decrypt_group.bench_with_input(BenchmarkId::new("Waters08", n), &ct, |b, ct| {
            b.iter(|| decrypt(&pp, ct, &sk).unwrap());
        });
    }
    decrypt_group.finish();
}

criterion_group!(benches,
    criterion_waters08_setup,
    criterion_waters08_compile,
    criterion_waters08_encrypt_decrypt,
);

criterion_main!(benches);
