use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ledeploy_core::{classify, Event};

fn pull_request_payload(action: &str, merged: bool, padding: usize) -> String {
    // Real webhook payloads carry far more than the fields we read
    let labels: Vec<String> = (0..padding)
        .map(|i| format!(r#"{{"id":{},"name":"label-{}","color":"ededed"}}"#, i, i))
        .collect();
    format!(
        r#"{{"action":"{}","number":12,"repository":{{"default_branch":"main","full_name":"acme/app"}},"pull_request":{{"id":99,"number":12,"merged":{},"head":{{"sha":"def456","ref":"feature"}},"labels":[{}]}}}}"#,
        action,
        merged,
        labels.join(",")
    )
}

fn bench_parse_and_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_and_classify");

    for padding in [0, 100, 1000] {
        let payload = pull_request_payload("synchronize", false, padding);

        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(padding), &payload, |b, payload| {
            b.iter(|| {
                let event = Event::from_parts(
                    "pull_request",
                    "refs/pull/12/merge",
                    "abc123",
                    black_box(payload),
                )
                .unwrap();
                classify(&event).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_classify_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");

    let cases = [
        ("push", "refs/heads/main", r#"{"repository":{"default_branch":"main"}}"#.to_string()),
        ("opened", "refs/pull/12/merge", pull_request_payload("opened", false, 0)),
        ("closed_merged", "refs/pull/12/merge", pull_request_payload("closed", true, 0)),
    ];

    for (label, git_ref, payload) in &cases {
        let name = if *label == "push" { "push" } else { "pull_request" };
        let event = Event::from_parts(name, git_ref, "abc123", payload).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(label), &event, |b, event| {
            b.iter(|| classify(black_box(event)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse_and_classify, bench_classify_only);
criterion_main!(benches);
