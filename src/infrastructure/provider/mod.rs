//! Remote provider adapters speaking JSON over HTTP

mod computation;
mod factory;
pub mod http_client;
mod reasoning;
mod visualization;

pub use computation::HttpComputationProvider;
pub use factory::{HttpProviderFactory, ProvidersConfig};
pub use http_client::{HttpClient, HttpClientTrait};
pub use reasoning::HttpReasoningProvider;
pub use visualization::HttpVisualizationProvider;
