//! Infrastructure layer - engine, collaborators, providers and services

pub mod logging;
pub mod observability;
pub mod pipeline;
pub mod provider;
pub mod registry;
pub mod services;
pub mod workflow;
