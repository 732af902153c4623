//! Composition root: settings, session wiring and demo seeding.

#[cfg(feature = "demo-data")]
pub mod demo_seed;
mod hub;
mod settings;

#[cfg(feature = "demo-data")]
pub use demo_seed::{
    DEFAULT_SEED_NAME, DemoSeedError, DemoSeedOutcome, default_registry_path, seed_demo_content,
};
pub use hub::Hub;
pub use settings::{HubSettings, RemoteCredentials};
