use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kmodal::formula::generator::{generate_cnf, CnfParameters};
use kmodal::{Axiom, Formula};
use rand::{rngs::StdRng, SeedableRng};

fn create_test_data(depth: u32, s5: bool) -> Vec<Formula> {
    let params = CnfParameters {
        depth,
        modalities: 2,
        clauses: 20,
        variables: 6,
        clause_length: 3,
        propositional_rate: 0.3,
        s5,
    };
    let mut rng = StdRng::seed_from_u64(42);
    (0..16).map(|_| generate_cnf(&params, &mut rng)).collect()
}

fn bench_normal_forms(c: &mut Criterion) {
    for depth in [1, 2, 3] {
        let formulas = create_test_data(depth, false);
        let mut group = c.benchmark_group(format!("normal_forms_depth_{}", depth));

        group.bench_function("negated_normal_form", |b| {
            b.iter(|| {
                for f in black_box(&formulas) {
                    black_box(f.negated_normal_form());
                }
            })
        });

        group.bench_function("modal_flatten", |b| {
            b.iter(|| {
                for f in black_box(&formulas) {
                    black_box(f.modal_flatten());
                }
            })
        });

        group.finish();
    }
}

fn bench_simplify(c: &mut Criterion) {
    for depth in [1, 2, 3] {
        let mut group = c.benchmark_group(format!("simplify_depth_{}", depth));
        for (name, s5) in [("k", false), ("s5", true)] {
            let formulas = create_test_data(depth, s5);
            group.bench_function(name, |b| {
                b.iter(|| {
                    for f in black_box(&formulas) {
                        black_box(f.simplify());
                    }
                })
            });
        }
        group.finish();
    }
}

fn bench_axiom_simplify(c: &mut Criterion) {
    let formulas = create_test_data(3, false);
    let mut group = c.benchmark_group("axiom_simplify");
    for axiom in [Axiom::B, Axiom::Four] {
        group.bench_function(format!("{:?}", axiom), |b| {
            b.iter(|| {
                for f in black_box(&formulas) {
                    black_box(f.axiom_simplify(axiom, 0));
                }
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_normal_forms, bench_simplify, bench_axiom_simplify);
criterion_main!(benches);
