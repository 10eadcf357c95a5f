use criterion::{Criterion, black_box, criterion_group, criterion_main};
use insulin_core::{
    CalculationInput, MinuteOfDay, ProfileId, ProfileWindow, RoundingStep, TimeWindow,
    compute_dose, resolve_active,
};

// Overlapping windows spread across the day, a few of them overnight.
fn synth_profiles(n: usize) -> Vec<ProfileWindow> {
    (0..n)
        .map(|i| {
            let start = ((i * 97) % 1440) as u16;
            let len = 60 + ((i * 37) % 600) as u16;
            let end = (start + len) % 1440;
            ProfileWindow {
                id: ProfileId::from(format!("p{i}")),
                window: Some(TimeWindow::new(
                    MinuteOfDay::new(start).unwrap_or(MinuteOfDay::MIDNIGHT),
                    MinuteOfDay::new(end).unwrap_or(MinuteOfDay::MIDNIGHT),
                )),
            }
        })
        .collect()
}

pub fn bench_resolve(c: &mut Criterion) {
    let profiles = synth_profiles(32);
    c.bench_function("resolve_active_32_profiles_full_day", |b| {
        b.iter(|| {
            let mut hits = 0usize;
            for m in 0..1440u16 {
                let now = MinuteOfDay::new(m).unwrap_or(MinuteOfDay::MIDNIGHT);
                if resolve_active(black_box(&profiles), now).is_some() {
                    hits += 1;
                }
            }
            black_box(hits)
        })
    });
}

pub fn bench_compute(c: &mut Criterion) {
    let input = CalculationInput::new()
        .with_carbs(45.0)
        .with_glucose(180.0)
        .with_carb_ratio(10.0)
        .with_correction_factor(50.0)
        .with_target(120.0)
        .with_trend(25.0);
    c.bench_function("compute_dose", |b| {
        b.iter(|| compute_dose(black_box(&input), RoundingStep::DEFAULT))
    });
}

criterion_group!(benches, bench_resolve, bench_compute);
criterion_main!(benches);
