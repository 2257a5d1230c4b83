use std::time::Duration;

use criterion::measurement::WallTime;
use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkGroup, BenchmarkId, Criterion,
    Throughput,
};
use json_overlay::Document;
use serde::Serialize;

#[derive(Clone, Serialize)]
struct Owner {
    id: u64,
    login: String,
    site_admin: bool,
}

#[derive(Clone, Serialize)]
struct Repo {
    id: u64,
    name: String,
    description: Option<String>,
    stargazers_count: u32,
    topics: Vec<String>,
    owner: Owner,
    archived: bool,
}

fn make_repos(count: usize) -> Vec<Repo> {
    (0..count)
        .map(|i| Repo {
            id: i as u64,
            name: format!("repo-{i}"),
            description: (i % 3 != 0).then(|| format!("Repository number {i}")),
            stargazers_count: (i * 37 % 5000) as u32,
            topics: vec![format!("topic-{}", i % 10), format!("topic-{}", (i + 3) % 10)],
            owner: Owner {
                id: (i % 100) as u64,
                login: format!("user-{}", i % 100),
                site_admin: i % 97 == 0,
            },
            archived: i % 11 == 0,
        })
        .collect()
}

fn bench_parse(group: &mut BenchmarkGroup<'_, WallTime>, name: &str, json: &str) {
    group.throughput(Throughput::Bytes(json.len() as u64));
    group.bench_function(BenchmarkId::new("overlay", name), |b| {
        b.iter(|| Document::parse_str(black_box(json)).unwrap())
    });
    group.bench_function(BenchmarkId::new("serde_json", name), |b| {
        b.iter(|| serde_json::from_str::<serde_json::Value>(black_box(json)).unwrap())
    });
}

fn bench_read(group: &mut BenchmarkGroup<'_, WallTime>, name: &str, doc: &Document, count: usize) {
    group.bench_function(BenchmarkId::new("select", name), |b| {
        b.iter(|| {
            let mut total = 0u64;
            for i in (0..count).step_by(7) {
                let stars = doc
                    .select(&format!("[{i}].stargazers_count"))
                    .and_then(|element| element.get_u32())
                    .unwrap();
                total += u64::from(stars);
            }
            black_box(total)
        })
    });
    group.bench_function(BenchmarkId::new("enumerate", name), |b| {
        b.iter(|| {
            let repos = doc.root().enumerate_array().unwrap();
            black_box(repos.filter_map(|repo| repo.get_property("owner").ok()).count())
        })
    });
}

fn bench_write(group: &mut BenchmarkGroup<'_, WallTime>, name: &str, json: &str, count: usize) {
    let pristine = Document::parse_str(json).unwrap();
    group.bench_function(BenchmarkId::new("unchanged", name), |b| {
        b.iter(|| black_box(pristine.to_json_vec().unwrap()))
    });

    let edited = Document::parse_str(json).unwrap();
    for i in (0..count).step_by(50) {
        let repo = edited.root().get_index(i).unwrap();
        repo.get_property("archived").unwrap().set(true).unwrap();
        repo.set_property("audited", "2024-01-01").unwrap();
        if i % 100 == 0 {
            repo.remove_property("description").unwrap();
        }
    }
    group.bench_function(BenchmarkId::new("merged", name), |b| {
        b.iter(|| black_box(edited.to_json_vec().unwrap()))
    });

    group.bench_function(BenchmarkId::new("set", name), |b| {
        b.iter(|| {
            let doc = Document::parse_str(json).unwrap();
            for i in (0..count).step_by(10) {
                doc.select(&format!("[{i}].owner.login"))
                    .and_then(|element| element.set("renamed"))
                    .unwrap();
            }
            black_box(doc.changes().len())
        })
    });
}

fn criterion_config() -> Criterion {
    if std::env::var("OVERLAY_BENCH_MINIMAL").is_ok() {
        Criterion::default()
            .warm_up_time(Duration::from_secs(0))
            .measurement_time(Duration::from_millis(10))
            .sample_size(10)
            .nresamples(1)
    } else {
        Criterion::default()
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let small = make_repos(100);
    let large = make_repos(2000);
    let small_json = serde_json::to_string(&small).unwrap();
    let large_json = serde_json::to_string(&large).unwrap();

    let mut parse = c.benchmark_group("parse");
    bench_parse(&mut parse, "repos_100", &small_json);
    bench_parse(&mut parse, "repos_2000", &large_json);
    parse.finish();

    let small_doc = Document::parse_str(&small_json).unwrap();
    let large_doc = Document::parse_str(&large_json).unwrap();
    let mut read = c.benchmark_group("read");
    bench_read(&mut read, "repos_100", &small_doc, small.len());
    bench_read(&mut read, "repos_2000", &large_doc, large.len());
    read.finish();

    let mut write = c.benchmark_group("write");
    bench_write(&mut write, "repos_100", &small_json, small.len());
    bench_write(&mut write, "repos_2000", &large_json, large.len());
    write.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = criterion_benchmark
}
criterion_main!(benches);
