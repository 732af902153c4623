//! Deterministic campus demo content for the campus hub.
//!
//! The crate loads a JSON seed registry and generates reproducible
//! announcement posts, marketplace listings and hackathons. It does not
//! depend on backend domain types; the backend converts the seeds into its
//! own drafts.
//!
//! # Example
//!
//! ```
//! use demo_data::{SeedRegistry, generate_demo_content};
//!
//! let json = r#"{
//!     "version": 1,
//!     "colleges": ["North Campus Institute"],
//!     "seeds": [{"name": "quiet-quad", "seed": 42, "postCount": 3}]
//! }"#;
//!
//! let registry = SeedRegistry::from_json(json).expect("valid registry");
//! let seed_def = registry.find_seed("quiet-quad").expect("seed exists");
//! let content = generate_demo_content(&registry, seed_def).expect("generation succeeds");
//!
//! assert_eq!(content.posts.len(), 3);
//! ```

mod error;
mod generator;
mod registry;
mod seed;
mod validation;

pub use error::{GenerationError, RegistryError};
pub use generator::generate_demo_content;
pub use registry::{SeedDefinition, SeedRegistry};
pub use seed::{ConditionSeed, DemoContent, HackathonSeed, ListingSeed, PostKindSeed, PostSeed};
pub use validation::{TITLE_MAX, is_valid_title};
