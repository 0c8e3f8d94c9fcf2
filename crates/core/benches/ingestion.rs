use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use shelfmark_core::{
    ContentFetcher, ContentProxy, ContentRecord, Entry, IgnoreList, PageMetadata, canonicalize, cleanup_html,
    reading_time, sanitize_title,
};

struct FixtureFetcher {
    record: ContentRecord,
}

impl ContentFetcher for FixtureFetcher {
    fn fetch_content(&self, _url: &str) -> ContentRecord {
        self.record.clone()
    }
}

fn article_record(html: &str, url: &str) -> ContentRecord {
    let page = PageMetadata::extract(html);
    ContentRecord {
        title: page.title,
        html: cleanup_html(&page.content, url).into(),
        url: url.to_string(),
        content_type: Some("text/html".to_string()),
        language: page.language,
        date: page.date,
        authors: page.authors,
        status: Some("200".to_string()),
        open_graph: Some(page.open_graph),
        ..Default::default()
    }
}

fn bench_reading_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("reading_time");

    for words in [100, 1_000, 10_000] {
        let html = format!("<article>{}</article>", "<p>word word word word word</p>".repeat(words / 5));
        group.bench_with_input(BenchmarkId::new("words", words), &html, |b, html| {
            b.iter(|| reading_time(black_box(html), 200.0))
        });
    }

    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();

    c.bench_function("page_metadata", |b| b.iter(|| PageMetadata::extract(black_box(&html))));
    c.bench_function("cleanup_html", |b| {
        b.iter(|| cleanup_html(black_box(&html), "https://quarterly.example.org/2024/ownership"))
    });
}

fn bench_populate(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();
    let url = "https://quarterly.example.org/2024/ownership";
    let record = article_record(&html, url);
    let proxy = ContentProxy::new(FixtureFetcher { record: record.clone() });

    c.bench_function("populate", |b| {
        b.iter(|| {
            let mut entry = Entry::new(url);
            proxy.populate(&mut entry, black_box(&record));
            entry
        })
    });

    c.bench_function("update_entry", |b| {
        b.iter(|| {
            let mut entry = Entry::new("http://bit.example/x1");
            proxy.update_entry(&mut entry, "http://bit.example/x1", ContentRecord::default(), false);
            entry
        })
    });
}

fn bench_canonicalize(c: &mut Criterion) {
    let ignore = IgnoreList::default();

    c.bench_function("canonicalize_redirect", |b| {
        b.iter(|| {
            let mut entry = Entry::new("http://a.com/some/long/path?with=query#frag");
            canonicalize(&mut entry, black_box("https://b.com/other/path/"), &ignore)
        })
    });
}

fn bench_sanitize(c: &mut Criterion) {
    let utf16: Vec<u8> = [0xFE, 0xFF]
        .into_iter()
        .chain("Quarterly report on memory safety".encode_utf16().flat_map(u16::to_be_bytes))
        .collect();

    c.bench_function("sanitize_pdf_title", |b| {
        b.iter(|| sanitize_title(black_box(&utf16), Some("application/pdf")))
    });
}

criterion_group!(
    benches,
    bench_reading_time,
    bench_extract,
    bench_populate,
    bench_canonicalize,
    bench_sanitize
);
criterion_main!(benches);
