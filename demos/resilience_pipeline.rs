//! Demonstrates a full retry + circuit breaker + fallback pipeline.
//!
//! Run with: cargo run --example resilience_pipeline --features tracing

use std::time::Duration;

use resilience::prelude::*;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let pipeline = Resilience::new()
        .with_retry(RetryPolicy::new(3, Duration::from_millis(200)))
        .with_circuit_breaker(CircuitBreakerPolicy::new(2, Duration::from_secs(5)))
        .with_fallback(FallbackPolicy::new(|| {
            tracing::info!("Executing fallback action");
            Ok::<_, BoxError>(())
        }));

    let result = pipeline.execute(|| {
        tracing::info!("Executing main action");
        Err("main action failed".into())
    });

    match result {
        Ok(()) => tracing::info!("Pipeline completed"),
        Err(e) => tracing::error!("Final error: {}", e),
    }
}
