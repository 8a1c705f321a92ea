use std::sync::Arc;

use crate::aggregate::Aggregator;
use crate::models::Roster;

#[derive(Clone)]
pub struct AppState {
    pub roster: Arc<Roster>,
    pub aggregator: Aggregator,
    pub cors_origin: String,
}
