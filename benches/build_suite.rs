//! This bench test simulates fetching and linking a large suite, then marking
//! a slice of it for deletion.

#![allow(missing_docs)]

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use testrail_model::{
    Adapter, Builder, Deletion, DeletionSettings, deletion_handler,
    domain::{CaseId, ProjectId, SectionId, SuiteId},
    remote::{
        RequestStats,
        memory::{MemoryClient, case_record, project_record, section_record, suite_record},
    },
};

const PROJECT: ProjectId = ProjectId::new(1);
const SUITE: SuiteId = SuiteId::new(1);

/// Generates 20 top-level sections, each with 10 children holding 5 cases.
fn preseed_client() -> MemoryClient {
    let client = MemoryClient::new();
    client.insert_project(project_record(PROJECT, "Bench"));
    client.insert_suite(suite_record(SUITE, PROJECT, "Master"));
    let mut next_case = 1;
    for top in 1..=20 {
        let top_id = SectionId::new(top * 100);
        client.insert_section(section_record(top_id, SUITE, None, &format!("Area {top}")));
        for child in 1..=10 {
            let child_id = SectionId::new(top * 100 + child);
            let mut record =
                section_record(child_id, SUITE, Some(top_id), &format!("Feature {child}"));
            record.insert("depth".into(), 1.into());
            client.insert_section(record);
            for _ in 0..5 {
                client.insert_case(case_record(
                    CaseId::new(next_case),
                    SUITE,
                    Some(child_id),
                    &format!("Case {next_case}"),
                ));
                next_case += 1;
            }
        }
    }
    client
}

fn build_suite(c: &mut Criterion) {
    let adapter = Adapter::with_stats(preseed_client(), RequestStats::new());
    c.bench_function("build suite", |b| {
        b.iter(|| {
            Builder::new(&adapter)
                .build_suite(PROJECT, SUITE)
                .unwrap()
        });
    });
}

fn mark_for_deletion(c: &mut Criterion) {
    c.bench_function("mark cases for deletion", |b| {
        b.iter_batched(
            || {
                let adapter = Adapter::with_stats(preseed_client(), RequestStats::new());
                let suite = Builder::new(&adapter).build_suite(PROJECT, SUITE).unwrap();
                (adapter, suite)
            },
            |(adapter, mut suite)| {
                let mut handler =
                    deletion_handler(&mut suite, &adapter, &DeletionSettings::default());
                let ids = (1..=200).map(CaseId::new).collect();
                for outcome in handler.delete_cases(ids) {
                    outcome.unwrap();
                }
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, build_suite, mark_for_deletion);
criterion_main!(benches);
