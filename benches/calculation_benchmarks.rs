//! Performance benchmarks for the deduction engine.
//!
//! This benchmark suite measures:
//! - A single synchronous calculation against the local tables
//! - A single calculation through the async pipeline
//! - A single calculation through the HTTP API
//! - Batches of 100 and 1000 varied inputs through the pipeline
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use deduction_engine::api::{AppState, create_router};
use deduction_engine::calculation::calculate_deductions;
use deduction_engine::config::{ConfigLoader, DEFAULT_LOOKUP_TIMEOUT};
use deduction_engine::models::{DeductionInput, EmploymentType};
use deduction_engine::pipeline::DeductionPipeline;
use deduction_engine::provider::TableRateProvider;

use axum::{body::Body, http::Request};
use tower::ServiceExt;

fn load_config() -> Arc<ConfigLoader> {
    Arc::new(ConfigLoader::load("./config/kanagawa_2025").expect("Failed to load config"))
}

fn create_pipeline() -> DeductionPipeline {
    DeductionPipeline::new(
        Arc::new(TableRateProvider::new(load_config())),
        DEFAULT_LOOKUP_TIMEOUT,
    )
}

/// Creates `count` inputs spread over salaries, ages and dependents.
fn create_inputs(count: usize) -> Vec<DeductionInput> {
    (0..count)
        .map(|i| {
            let salary = Decimal::from(80_000 + (i as i64 * 7_919) % 1_400_000);
            let mut input = DeductionInput::new(salary, 20 + (i as u32 % 50));
            input.dependents = i as u32 % 10;
            input.employment_type = match i % 3 {
                0 => EmploymentType::General,
                1 => EmploymentType::Agriculture,
                _ => EmploymentType::Construction,
            };
            input
        })
        .collect()
}

/// Benchmark: Single synchronous calculation.
fn bench_single_calculation(c: &mut Criterion) {
    let config = load_config();
    let input = DeductionInput::new(Decimal::from(300_000), 35);

    c.bench_function("single_calculation", |b| {
        b.iter(|| black_box(calculate_deductions(black_box(&input), &config).unwrap()))
    });
}

/// Benchmark: Single calculation through the staged pipeline.
fn bench_pipeline(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let pipeline = create_pipeline();
    let input = DeductionInput::new(Decimal::from(300_000), 50);

    c.bench_function("pipeline_single", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(pipeline.calculate(&input).await.unwrap()) })
    });
}

/// Benchmark: Single calculation through POST /calculate.
fn bench_api_request(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = create_router(AppState::new(
        ConfigLoader::load("./config/kanagawa_2025").expect("Failed to load config"),
    ));
    let body = serde_json::json!({ "salary": 300000, "age": 35, "dependents": 2 }).to_string();

    c.bench_function("api_calculate", |b| {
        b.to_async(&rt).iter(|| async {
            let router = router.clone();
            let response = router
                .oneshot(
                    Request::builder()
                        .method("POST")
                        .uri("/calculate")
                        .header("Content-Type", "application/json")
                        .body(Body::from(body.clone()))
                        .unwrap(),
                )
                .await
                .unwrap();
            black_box(response)
        })
    });
}

/// Benchmark: Batches of varied inputs through the pipeline.
fn bench_batches(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let pipeline = create_pipeline();

    let mut group = c.benchmark_group("batch_processing");
    group.sample_size(10);

    for size in [100usize, 1000] {
        let inputs = create_inputs(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("inputs", size), &inputs, |b, inputs| {
            b.to_async(&rt).iter(|| async {
                let mut results = Vec::with_capacity(inputs.len());
                for input in inputs {
                    results.push(pipeline.calculate(input).await.unwrap());
                }
                black_box(results)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_calculation,
    bench_pipeline,
    bench_api_request,
    bench_batches,
);
criterion_main!(benches);
