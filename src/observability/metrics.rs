use prometheus::{Encoder, Gauge, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_placed_total: IntCounter,
    pub status_transitions_total: IntCounterVec,
    pub delivery_claims_total: IntCounterVec,
    pub rider_earnings_total: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_placed_total =
            IntCounter::new("orders_placed_total", "Total orders placed by customers")
                .expect("valid orders_placed_total metric");

        let status_transitions_total = IntCounterVec::new(
            Opts::new(
                "status_transitions_total",
                "Committed order status transitions by target status",
            ),
            &["to"],
        )
        .expect("valid status_transitions_total metric");

        let delivery_claims_total = IntCounterVec::new(
            Opts::new("delivery_claims_total", "Rider claim attempts by outcome"),
            &["outcome"],
        )
        .expect("valid delivery_claims_total metric");

        let rider_earnings_total = Gauge::new(
            "rider_earnings_total",
            "Cumulative rider share of delivery fees for completed deliveries",
        )
        .expect("valid rider_earnings_total metric");

        registry
            .register(Box::new(orders_placed_total.clone()))
            .expect("register orders_placed_total");
        registry
            .register(Box::new(status_transitions_total.clone()))
            .expect("register status_transitions_total");
        registry
            .register(Box::new(delivery_claims_total.clone()))
            .expect("register delivery_claims_total");
        registry
            .register(Box::new(rider_earnings_total.clone()))
            .expect("register rider_earnings_total");

        Self {
            registry,
            orders_placed_total,
            status_transitions_total,
            delivery_claims_total,
            rider_earnings_total,
        }
    }

    pub fn record_transition(&self, to: &str) {
        self.status_transitions_total.with_label_values(&[to]).inc();
    }

    pub fn record_claim(&self, outcome: &str) {
        self.delivery_claims_total.with_label_values(&[outcome]).inc();
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
