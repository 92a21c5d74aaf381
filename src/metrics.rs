use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// Token proxy counters, labelled by audience (fe/be) and outcome
pub static TOKEN_FETCHES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("demo_token_fetches_total", "OAuth token exchanges"),
        &["audience", "outcome"],
    )
    .unwrap()
});

// Purchase counters, labelled by mode (plain/threeds) and outcome
pub static PURCHASES: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("demo_purchases_total", "Purchase requests forwarded"),
        &["mode", "outcome"],
    )
    .unwrap()
});

pub static PURCHASE_LATENCY: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "demo_purchase_latency_seconds",
            "End-to-end purchase forwarding latency",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
    )
    .unwrap()
});

/// Register all metrics with the registry
pub fn register_metrics() {
    REGISTRY.register(Box::new(TOKEN_FETCHES.clone())).unwrap();
    REGISTRY.register(Box::new(PURCHASES.clone())).unwrap();
    REGISTRY
        .register(Box::new(PURCHASE_LATENCY.clone()))
        .unwrap();
}
