//! Service registry implementations

mod in_memory;

pub use in_memory::{InMemoryServiceRegistry, ProviderFactory};
