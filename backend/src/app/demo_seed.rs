//! Demo content seeding through the mutation gateway.
//!
//! Generated seeds become ordinary drafts, so demo content passes the same
//! validation and ownership stamping as anything a user creates.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use chrono::{DateTime, Days, Utc};
use demo_data::{
    ConditionSeed, GenerationError, HackathonSeed, ListingSeed, PostKindSeed, PostSeed,
    RegistryError, SeedRegistry, generate_demo_content,
};
use thiserror::Error;
use tracing::info;

use crate::domain::ports::EntityBackend;
use crate::domain::{
    Condition, EntityDraft, Error, HackathonDraft, MarketplaceDraft, MutationGateway, PostDraft,
    PostKind, SessionContext,
};

/// Seed used when none is named.
pub const DEFAULT_SEED_NAME: &str = "quiet-quad";

/// Registry shipped with the crate.
pub fn default_registry_path() -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("demo-data")
        .join("seeds.json")
}

/// Errors returned while seeding demo content.
#[derive(Debug, Error)]
pub enum DemoSeedError {
    /// Registry file could not be read.
    #[error("failed to read registry at {path}: {source}")]
    RegistryRead {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("registry parse error: {0}")]
    Registry(#[from] RegistryError),
    #[error("demo content generation failed: {0}")]
    Generation(#[from] GenerationError),
    /// A generated record was refused by the gateway.
    #[error("seeded record rejected: {0}")]
    Rejected(#[from] Error),
    #[error("seed name must not be empty")]
    EmptySeedName,
}

/// Counts of records created by one seeding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemoSeedOutcome {
    pub posts: usize,
    pub listings: usize,
    pub hackathons: usize,
}

/// Generate the named seed and create every record as the signed-in user.
///
/// Hackathon dates are anchored to `anchor`.
pub async fn seed_demo_content<B>(
    gateway: &MutationGateway<B>,
    session: &SessionContext,
    registry_path: &Utf8Path,
    seed_name: &str,
    anchor: DateTime<Utc>,
) -> Result<DemoSeedOutcome, DemoSeedError>
where
    B: EntityBackend + ?Sized,
{
    let seed_name = seed_name.trim();
    if seed_name.is_empty() {
        return Err(DemoSeedError::EmptySeedName);
    }
    session.require_actor()?;

    let registry = load_registry(registry_path)?;
    let definition = registry.find_seed(seed_name)?;
    let content = generate_demo_content(&registry, definition)?;

    let mut outcome = DemoSeedOutcome::default();
    for post in content.posts {
        gateway.add(session, post_draft(post)).await?;
        outcome.posts += 1;
    }
    for listing in content.listings {
        gateway.add(session, listing_draft(listing)).await?;
        outcome.listings += 1;
    }
    for hackathon in content.hackathons {
        gateway.add(session, hackathon_draft(hackathon, anchor)).await?;
        outcome.hackathons += 1;
    }
    info!(
        seed = seed_name,
        posts = outcome.posts,
        listings = outcome.listings,
        hackathons = outcome.hackathons,
        "demo content seeded"
    );
    Ok(outcome)
}

fn load_registry(path: &Utf8Path) -> Result<SeedRegistry, DemoSeedError> {
    let read_error = |source| DemoSeedError::RegistryRead {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path.file_name().ok_or_else(|| {
        read_error(io::Error::new(
            io::ErrorKind::InvalidInput,
            "registry path must be a file",
        ))
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
    let contents = dir.read_to_string(file_name).map_err(read_error)?;
    Ok(SeedRegistry::from_json(&contents)?)
}

fn post_draft(seed: PostSeed) -> EntityDraft {
    let kind = match seed.kind {
        PostKindSeed::Hackathon => PostKind::Hackathon,
        PostKindSeed::Freshers => PostKind::Freshers,
        PostKindSeed::Flashmob => PostKind::Flashmob,
        PostKindSeed::Placement => PostKind::Placement,
        PostKindSeed::Internship => PostKind::Internship,
        PostKindSeed::Topper => PostKind::Topper,
        PostKindSeed::Others => PostKind::Others,
    };
    EntityDraft::Post(PostDraft {
        title: seed.title,
        description: seed.description,
        kind,
        apply_enabled: seed.apply_enabled,
        image: None,
    })
}

fn listing_draft(seed: ListingSeed) -> EntityDraft {
    let condition = match seed.condition {
        ConditionSeed::New => Condition::New,
        ConditionSeed::LikeNew => Condition::LikeNew,
        ConditionSeed::Good => Condition::Good,
        ConditionSeed::Fair => Condition::Fair,
        ConditionSeed::Poor => Condition::Poor,
    };
    EntityDraft::Marketplace(MarketplaceDraft {
        title: seed.title,
        description: seed.description,
        price: seed.price,
        category: None,
        condition,
        images: Vec::new(),
    })
}

fn hackathon_draft(seed: HackathonSeed, anchor: DateTime<Utc>) -> EntityDraft {
    let start_date = anchor
        .checked_add_days(Days::new(u64::from(seed.starts_in_days)))
        .unwrap_or(anchor);
    let end_date = start_date
        .checked_add_days(Days::new(u64::from(seed.duration_days.max(1))))
        .unwrap_or(start_date);
    EntityDraft::Hackathon(HackathonDraft {
        title: seed.title,
        description: seed.description,
        start_date,
        end_date,
        location: seed.location,
        theme: seed.theme,
        prizes: seed.prizes,
        max_participants: seed.max_participants,
    })
}
