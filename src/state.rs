use crate::config::Config;
use crate::engine::access::ReadPolicy;
use crate::engine::lifecycle::TransitionPolicy;
use crate::observability::metrics::Metrics;
use crate::store::identity::TokenRegistry;
use crate::store::orders::OrderStore;
use crate::store::restaurants::RestaurantDirectory;

pub struct AppState {
    pub orders: OrderStore,
    pub restaurants: RestaurantDirectory,
    pub identities: TokenRegistry,
    pub metrics: Metrics,
    pub transition_policy: TransitionPolicy,
    pub read_policy: ReadPolicy,
    pub estimated_delivery_minutes: i64,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            orders: OrderStore::new(),
            restaurants: RestaurantDirectory::new(),
            identities: TokenRegistry::new(),
            metrics: Metrics::new(),
            transition_policy: config.transition_policy,
            read_policy: config.read_policy,
            estimated_delivery_minutes: config.estimated_delivery_minutes,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
