use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("coordinates are missing for node {node_id}")]
    CoordinateMissing { node_id: String },

    #[error("no provider returned a route for ({origin}, {destination})")]
    RouteUnavailable { origin: String, destination: String },

    #[error("provider {provider} returned a permanent failure: {message}")]
    ProviderPermanent { provider: String, message: String },

    #[error("storage operation failed: {0}")]
    Storage(#[from] clinker_db::DbError),
}
