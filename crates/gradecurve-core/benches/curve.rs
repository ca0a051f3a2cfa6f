use criterion::{black_box, criterion_group, criterion_main, Criterion};

use gradecurve_core::attendance;
use gradecurve_core::curve::{cascade, finalize, nominal_capacity, BandCapacity};
use gradecurve_core::model::StudentGradeRecord;
use gradecurve_core::policy::{BandQuotas, CoursePolicy};

fn roster(size: usize) -> Vec<StudentGradeRecord> {
    (0..size)
        .map(|i| {
            // Spread over [0, 100) with frequent ties.
            let percentage = ((i * 37) % 400) as f64 / 4.0;
            StudentGradeRecord::scored(format!("s{i:05}"), "BENCH", percentage)
        })
        .collect()
}

fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize");
    let policy = CoursePolicy::default();

    for size in [30usize, 300, 3000] {
        let students = roster(size);
        group.bench_function(format!("{size}_students"), |b| {
            b.iter(|| finalize(black_box(&students), black_box(&policy)))
        });
    }

    group.finish();
}

fn bench_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("capacity");
    let quotas = BandQuotas::default();

    group.bench_function("nominal", |b| {
        b.iter(|| nominal_capacity(black_box(3000), black_box(&quotas)))
    });

    let nominal = BandCapacity {
        a: 900,
        b: 1200,
        c: 600,
        d: 300,
    };
    group.bench_function("cascade", |b| {
        b.iter(|| cascade(black_box(nominal), black_box(1100)))
    });

    group.finish();
}

fn bench_attendance_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("attendance_decode");

    let full: String = (1..=80)
        .map(|s| format!("{s}{}", ['P', 'L', 'A'][s % 3]))
        .collect();
    let noisy: String = (1..=80).map(|s| format!("{s}출 ?{s}x ")).collect();

    group.bench_function("80_sessions", |b| {
        b.iter(|| attendance::decode(black_box(&full)))
    });

    group.bench_function("80_sessions_noisy", |b| {
        b.iter(|| attendance::decode(black_box(&noisy)))
    });

    group.finish();
}

criterion_group!(benches, bench_finalize, bench_capacity, bench_attendance_decode);
criterion_main!(benches);
