use std::sync::atomic::AtomicBool;

use antiplag::{AntiPlagiarism, AuthorId, Language, NewSubmission, SweepSelection, TaskId};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use snippets::SnippetConfig;

/// A C# file of `methods` small methods, each with distinct names.
fn generated_source(methods: usize, salt: usize) -> String {
    let mut out = String::from("using System;\n\nclass Solution\n{\n");
    for i in 0..methods {
        out.push_str(&format!(
            "    static int Step{salt}_{i}(int[] data, int limit)\n    {{\n        int acc = {i};\n        for (int j = 0; j < data.Length; j++)\n        {{\n            if (data[j] > limit) acc += data[j] * {salt};\n            else acc -= j;\n        }}\n        return acc;\n    }}\n\n"
        ));
    }
    out.push_str("}\n");
    out
}

fn tokenize_bench(c: &mut Criterion) {
    let source = generated_source(200, 1);
    let mut group = c.benchmark_group("tokenize");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("extract_code_units_csharp", |b| {
        b.iter(|| {
            let units = tokenize::extract_code_units(black_box(&source), Language::CSharp);
            black_box(units);
        });
    });
    group.finish();
}

fn snippets_bench(c: &mut Criterion) {
    let source = generated_source(200, 1);
    let units = tokenize::extract_code_units(&source, Language::CSharp);
    let cfg = SnippetConfig::default();

    c.bench_function("extract_snippets_csharp", |b| {
        b.iter(|| {
            let snippets = snippets::extract_snippets(black_box(&units), &cfg)
                .expect("default snippet config is valid");
            black_box(snippets);
        });
    });
}

fn submit(service: &AntiPlagiarism, task: TaskId, code: String) -> antiplag::SubmissionId {
    let added = service
        .add_submission(NewSubmission {
            task_id: task,
            author_id: AuthorId::new_random(),
            language: "csharp".into(),
            code,
            additional_info: None,
        })
        .expect("bench submission is valid");
    service
        .index_submission(added.submission_id)
        .expect("first indexing succeeds");
    added.submission_id
}

fn check_bench(c: &mut Criterion) {
    let service = AntiPlagiarism::in_memory().expect("in-memory service opens");
    let task = TaskId::new_random();
    for salt in 0..50 {
        submit(&service, task, generated_source(20, salt));
    }
    let probe = submit(&service, task, generated_source(20, 7));
    service
        .recalculate_task_statistics(SweepSelection::Single(task), &AtomicBool::new(false))
        .expect("sweep succeeds");

    c.bench_function("get_submission_plagiarisms_50", |b| {
        b.iter(|| {
            let report = service
                .get_submission_plagiarisms(black_box(probe))
                .expect("probe is stored");
            black_box(report);
        });
    });

    c.bench_function("recalculate_task_statistics_50", |b| {
        b.iter(|| {
            let report = service
                .recalculate_task_statistics(SweepSelection::Single(task), &AtomicBool::new(false))
                .expect("sweep succeeds");
            black_box(report);
        });
    });
}

criterion_group!(pipeline_benches, tokenize_bench, snippets_bench, check_bench);
criterion_main!(pipeline_benches);
