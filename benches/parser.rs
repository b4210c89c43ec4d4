use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use etymology_explorer::lookup::extract_definition;
use etymology_explorer::reference::suggest_languages;
use etymology_explorer::{parse_etymology, start_year};

static PAGES: &[(&str, &str)] = &[
    ("water", include_str!("../tests/fixtures/water.html")),
    ("democracy", include_str!("../tests/fixtures/democracy.html")),
];

fn bench_parse_pages(c: &mut Criterion) {
    for &(word, html) in PAGES {
        c.bench_with_input(BenchmarkId::new("parse_etymology", word), &html, |b, html| {
            b.iter(|| {
                let data = parse_etymology(black_box(html));
                black_box(data.node_count());
            });
        });
        c.bench_with_input(BenchmarkId::new("extract_definition", word), &html, |b, html| {
            b.iter(|| black_box(extract_definition(black_box(html))));
        });
    }
}

fn bench_periods(c: &mut Criterion) {
    const PERIODS: &[&str] = &["4500-2500 BC", "450-1150 AD", "1500-present", "Unknown period"];
    c.bench_function("start_year::mixed", |b| {
        b.iter(|| {
            for period in PERIODS {
                black_box(start_year(black_box(period)));
            }
        });
    });
}

fn bench_language_suggestions(c: &mut Criterion) {
    c.bench_function("suggest_languages::old_fr", |b| {
        b.iter(|| black_box(suggest_languages(black_box("old frnch"), 5)));
    });
}

criterion_group!(
    benches,
    bench_parse_pages,
    bench_periods,
    bench_language_suggestions
);
criterion_main!(benches);
