mod loader;

pub use loader::{Config, ConfigError, MissingKeyPolicy, ResourcesConfig, StringsConfig};
