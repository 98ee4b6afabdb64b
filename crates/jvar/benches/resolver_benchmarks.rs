//! Resolver and record validation performance benchmarks.
//!
//! Measures reference loading, single lookups, and batch validation throughput.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use jvar::bio::{AssemblyResolver, VariantTypeResolver};
use jvar::{
    RecordType, ReferenceDataStore, ReferenceSource, SubmissionRecord, SubmissionRecordValidator,
};

/// Generate realistic variant call records with a few bad values mixed in.
fn generate_calls(count: usize) -> Vec<SubmissionRecord> {
    let call_types = ["deletion", "duplication", "Alu insertion", "inversion", "copy number gain"];
    let assemblies = ["GRCh38", "hg19", "GCF_000001405.40", "GRCh37.p13"];
    let chromosomes = ["1", "chr2", "X", "chrM", "22", "chr99"];

    (0..count)
        .map(|i| {
            let start = 10_000 + (i as u64 * 137) % 1_000_000;
            SubmissionRecord::new(RecordType::VariantCall)
                .with_field("Call Type", call_types[i % call_types.len()])
                .with_field("Assembly", assemblies[i % assemblies.len()])
                .with_field("Chr", chromosomes[i % chromosomes.len()])
                .with_field("Start", start.to_string())
                .with_field("Stop", (start + 5_000).to_string())
                .with_field("Sample ID", if i % 7 == 0 { "UNKNOWN" } else { "NA12878" })
        })
        .collect()
}

fn bench_load(c: &mut Criterion) {
    c.bench_function("load_embedded", |b| {
        b.iter(|| ReferenceDataStore::load(black_box(ReferenceSource::Embedded)).unwrap())
    });
}

fn bench_lookups(c: &mut Criterion) {
    let store = ReferenceDataStore::embedded();
    let assemblies = AssemblyResolver::new(store);
    let variant_types = VariantTypeResolver::new(store);

    let mut group = c.benchmark_group("lookups");
    group.bench_function("resolve_assembly", |b| {
        b.iter(|| assemblies.resolve_assembly(black_box("hg38")))
    });
    group.bench_function("resolve_sequence_alias", |b| {
        b.iter(|| assemblies.resolve_sequence(black_box("GRCh37"), black_box("chrM")))
    });
    group.bench_function("derive_region_type", |b| {
        b.iter(|| variant_types.derive_region_type_for_call(black_box("LINE1 Deletion")))
    });
    group.bench_function("call_supports_region", |b| {
        b.iter(|| {
            variant_types.validate_call_supports_region(
                black_box("intrachromosomal translocation"),
                black_box("complex chromosomal rearrangement"),
            )
        })
    });
    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    let validator = SubmissionRecordValidator::new(ReferenceDataStore::embedded());

    let mut group = c.benchmark_group("validation");
    for size in [100, 1_000, 10_000] {
        let records = generate_calls(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("sequential", size), &records, |b, records| {
            b.iter(|| records.iter().map(|r| validator.validate(r)).collect::<Vec<_>>())
        });
        group.bench_with_input(BenchmarkId::new("batch", size), &records, |b, records| {
            b.iter(|| validator.validate_batch(records))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_load, bench_lookups, bench_validation);
criterion_main!(benches);
