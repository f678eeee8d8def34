mod loader;

pub use loader::{Config, HarvestConfig, LoaderConfig, ResolverConfig};
