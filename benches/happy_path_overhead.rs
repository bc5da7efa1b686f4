use criterion::{Criterion, criterion_group, criterion_main};
use futures::future::BoxFuture;
use std::hint::black_box;
use std::time::Duration;
use tower::{Layer, Service, ServiceBuilder, ServiceExt};

use substrate_bulkhead::BulkheadLayer;
use substrate_circuitbreaker::CircuitBreakerLayer;
use substrate_retry::RetryLayer;
use substrate_timelimiter::TimeLimiterLayer;

#[derive(Clone, Debug)]
struct TestRequest(u64);

#[derive(Clone, Debug)]
struct TestResponse(#[allow(dead_code)] u64);

#[derive(Clone, Debug)]
struct TestError;

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "test error")
    }
}

impl std::error::Error for TestError {}

#[derive(Clone)]
struct BaselineService;

impl Service<TestRequest> for BaselineService {
    type Response = TestResponse;
    type Error = TestError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: TestRequest) -> Self::Future {
        Box::pin(async move { Ok(TestResponse(req.0)) })
    }
}

fn bench_baseline(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("baseline_no_middleware", |b| {
        b.to_async(&runtime).iter(|| async {
            let mut service = BaselineService;
            let response = service
                .ready()
                .await
                .unwrap()
                .call(black_box(TestRequest(42)))
                .await;
            black_box(response)
        });
    });
}

fn bench_circuit_breaker(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("circuitbreaker_closed", |b| {
        b.to_async(&runtime).iter(|| async {
            let layer = CircuitBreakerLayer::builder()
                .failure_threshold(5)
                .success_threshold(2)
                .build();
            let mut service = layer.layer(BaselineService);

            let response = service
                .ready()
                .await
                .unwrap()
                .call(black_box(TestRequest(42)))
                .await;
            black_box(response)
        });
    });
}

fn bench_bulkhead(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("bulkhead_permits_available", |b| {
        b.to_async(&runtime).iter(|| async {
            let config = BulkheadLayer::builder().max_concurrent_calls(100).build();
            let mut service = ServiceBuilder::new().layer(config).service(BaselineService);

            let response = service
                .ready()
                .await
                .unwrap()
                .call(black_box(TestRequest(42)))
                .await;
            black_box(response)
        });
    });
}

fn bench_retry(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("retry_no_retries_needed", |b| {
        b.to_async(&runtime).iter(|| async {
            let layer = RetryLayer::<TestRequest, TestError>::builder()
                .max_attempts(3)
                .fixed_backoff(Duration::from_millis(100))
                .build();
            let mut service = layer.layer(BaselineService);

            let response = service
                .ready()
                .await
                .unwrap()
                .call(black_box(TestRequest(42)))
                .await;
            black_box(response)
        });
    });
}

fn bench_time_limiter(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("timelimiter_completes_quickly", |b| {
        b.to_async(&runtime).iter(|| async {
            let layer = TimeLimiterLayer::<TestRequest>::builder()
                .timeout_duration(Duration::from_secs(30))
                .build();
            let mut service = layer.layer(BaselineService);

            let response = service
                .ready()
                .await
                .unwrap()
                .call(black_box(TestRequest(42)))
                .await;
            black_box(response)
        });
    });
}

fn bench_composition_simple(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    // The shape an outbound call through `substrate-rpc` actually takes:
    // breaker admission wrapping a bulkhead-limited inner service (§4.1).
    c.bench_function("composition_circuit_breaker_and_bulkhead", |b| {
        b.to_async(&runtime).iter(|| async {
            let cb_layer = CircuitBreakerLayer::builder()
                .failure_threshold(5)
                .success_threshold(2)
                .build();
            let bh_config = BulkheadLayer::builder().max_concurrent_calls(100).build();

            let mut service = cb_layer.layer(
                ServiceBuilder::new()
                    .layer(bh_config)
                    .service(BaselineService),
            );

            let response = service
                .ready()
                .await
                .unwrap()
                .call(black_box(TestRequest(42)))
                .await;
            black_box(response)
        });
    });
}

criterion_group!(
    benches,
    bench_baseline,
    bench_circuit_breaker,
    bench_bulkhead,
    bench_retry,
    bench_time_limiter,
    bench_composition_simple
);
criterion_main!(benches);
