use std::hint::black_box;
use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use unital::external::DefaultNumberFormatter;
use unital::rational::Rational;
use unital::{Universe, parse_query, parse_universe};

const DEFINITION_SOURCE: &str = r#"
length, distance {
    { nano, micro, milli, centi, deci, deca, hecto, kilo } meter, metre (m);
    inch (in) = 25.4 mm;
    foot (ft) = 12 inches;
    yard (yd) = 3 feet;
    mile (mi) = 5280 feet;
}
time {
    { micro, milli } second (s);
    minute (min) = 60 seconds;
    hour (h) = 60 minutes;
}
mass {
    { milli, kilo } gram (g);
    pound (lb) = 0.45359237 kg;
}
speed = distance/time {
    (mps) = meters per second;
    (mph) = miles per hour;
}
momentum = mass*speed {}
"#;

fn build_universe() -> Universe {
    parse_universe(DEFINITION_SOURCE, None, Arc::new(DefaultNumberFormatter), None).expect("benchmark universe parses")
}

fn bench_rational_arithmetic(c: &mut Criterion) {
    let mut group = c.benchmark_group("rational_arithmetic");

    let a = Rational::new(355, 113).unwrap();
    let b = Rational::new(22, 7).unwrap();

    group.bench_function("add", |bch| bch.iter(|| black_box(&a).add(black_box(&b))));
    group.bench_function("mul", |bch| bch.iter(|| black_box(&a).mul(black_box(&b))));
    group.bench_function("div", |bch| bch.iter(|| black_box(&a).div(black_box(&b)).unwrap()));
    group.bench_function("pow_8", |bch| bch.iter(|| black_box(&a).pow(black_box(8)).unwrap()));
    group.bench_function("to_decimal_string", |bch| bch.iter(|| black_box(&a).to_decimal_string()));
    group.bench_function("from_decimal_str", |bch| bch.iter(|| Rational::from_decimal_str(black_box("3.14159265358979"))));

    group.finish();
}

fn bench_universe_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("universe_load");
    group.bench_function("parse_universe", |b| b.iter(|| build_universe()));
    group.finish();
}

fn bench_query_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_evaluation");
    let universe = build_universe();

    let queries = [
        ("simple_conversion", "2 meters in inches"),
        ("defaulted_destination", "24 inches"),
        ("summed_list", "10 meters, 3 yards in feet"),
        ("derived_unit_division", "100 miles per hour in meters per second"),
        ("derived_unit_product", "5 kilograms meter per second in kilogram meter per second"),
    ];

    for (name, query) in &queries {
        group.bench_with_input(BenchmarkId::new("parse_and_evaluate", name), query, |b, &query| {
            b.iter(|| parse_query(black_box(query), black_box(&universe)).unwrap())
        });
    }

    group.finish();
}

fn bench_unit_name_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit_name_resolution");
    let universe = build_universe();

    let names = ["meter", "meters", "kilometers", "mph", "pound"];
    for name in &names {
        group.bench_with_input(BenchmarkId::new("get_unit_id", name), name, |b, &name| b.iter(|| universe.get_unit_id(black_box(name))));
    }

    group.finish();
}

criterion_group!(benches, bench_rational_arithmetic, bench_universe_load, bench_query_evaluation, bench_unit_name_resolution);
criterion_main!(benches);
