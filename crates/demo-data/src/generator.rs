//! Deterministic demo content generation from seed definitions.
//!
//! The same seed definition always produces identical content, so demo
//! environments can be rebuilt and compared.

use fake::Fake;
use fake::faker::address::raw::{CityName, StreetName};
use fake::faker::company::raw::{Buzzword, CatchPhrase};
use fake::faker::lorem::raw::{Sentence, Words};
use fake::locales::EN;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::GenerationError;
use crate::registry::{SeedDefinition, SeedRegistry};
use crate::seed::{ConditionSeed, DemoContent, HackathonSeed, ListingSeed, PostKindSeed, PostSeed};
use crate::validation::{is_valid_title, normalise_title};

/// Maximum number of attempts to generate a valid title.
const MAX_TITLE_ATTEMPTS: usize = 100;

/// Marketplace prices fall in this inclusive range.
const MIN_PRICE: u32 = 50;
const MAX_PRICE: u32 = 5_000;

/// Hackathons start within this many days of the anchor date.
const MAX_START_OFFSET_DAYS: u32 = 60;
const MAX_DURATION_DAYS: u32 = 3;

/// Roughly one hackathon in three is capped.
const CAPPED_NUMERATOR: u32 = 1;
const CAPPED_DENOMINATOR: u32 = 3;

/// Generates demo content from a seed definition.
///
/// # Errors
///
/// Returns [`GenerationError`] if the registry has no colleges or a title
/// cannot be produced within the retry budget.
///
/// # Example
///
/// ```
/// use demo_data::{SeedRegistry, generate_demo_content};
///
/// let json = r#"{
///     "version": 1,
///     "colleges": ["North Campus Institute"],
///     "seeds": [{"name": "quiet-quad", "seed": 42, "postCount": 3, "listingCount": 2, "hackathonCount": 1}]
/// }"#;
///
/// let registry = SeedRegistry::from_json(json).expect("valid");
/// let seed_def = registry.find_seed("quiet-quad").expect("found");
/// let content = generate_demo_content(&registry, seed_def).expect("generated");
///
/// assert_eq!(content.len(), 6);
/// let again = generate_demo_content(&registry, seed_def).expect("generated");
/// assert_eq!(content, again);
/// ```
pub fn generate_demo_content(
    registry: &SeedRegistry,
    seed_def: &SeedDefinition,
) -> Result<DemoContent, GenerationError> {
    if registry.colleges().is_empty() {
        return Err(GenerationError::NoColleges);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed_def.seed());

    let posts = (0..seed_def.post_count())
        .map(|_| generate_post(&mut rng, registry.colleges()))
        .collect::<Result<Vec<_>, _>>()?;
    let listings = (0..seed_def.listing_count())
        .map(|_| generate_listing(&mut rng))
        .collect::<Result<Vec<_>, _>>()?;
    let hackathons = (0..seed_def.hackathon_count())
        .map(|_| generate_hackathon(&mut rng))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DemoContent {
        posts,
        listings,
        hackathons,
    })
}

fn generate_post(rng: &mut ChaCha8Rng, colleges: &[String]) -> Result<PostSeed, GenerationError> {
    let kind = pick(rng, &PostKindSeed::ALL).unwrap_or(PostKindSeed::Others);
    let college = pick(rng, colleges).ok_or(GenerationError::NoColleges)?;
    let title = generate_title(rng, |r| CatchPhrase(EN).fake_with_rng(r))?;
    let description: String = Sentence(EN, 8..16).fake_with_rng(rng);

    Ok(PostSeed {
        title,
        description,
        kind,
        apply_enabled: kind.accepts_applications() && rng.random_bool(0.5),
        college,
    })
}

fn generate_listing(rng: &mut ChaCha8Rng) -> Result<ListingSeed, GenerationError> {
    let title = generate_title(rng, |r| {
        let words: Vec<String> = Words(EN, 2..4).fake_with_rng(r);
        words.join(" ")
    })?;
    let description: String = Sentence(EN, 6..12).fake_with_rng(rng);
    let condition = pick(rng, &ConditionSeed::ALL).unwrap_or(ConditionSeed::Good);

    Ok(ListingSeed {
        title,
        description,
        price: rng.random_range(MIN_PRICE..=MAX_PRICE),
        condition,
    })
}

fn generate_hackathon(rng: &mut ChaCha8Rng) -> Result<HackathonSeed, GenerationError> {
    let theme: String = Buzzword(EN).fake_with_rng(rng);
    let title = generate_title(rng, |r| {
        let suffix: String = Buzzword(EN).fake_with_rng(r);
        format!("{theme} {suffix} hack")
    })?;
    let description: String = Sentence(EN, 10..20).fake_with_rng(rng);
    let street: String = StreetName(EN).fake_with_rng(rng);
    let city: String = CityName(EN).fake_with_rng(rng);
    let first_prize = rng.random_range(10_u32..=100) * 1_000;

    let max_participants = rng
        .random_ratio(CAPPED_NUMERATOR, CAPPED_DENOMINATOR)
        .then(|| rng.random_range(20..=200));

    Ok(HackathonSeed {
        title,
        description,
        theme,
        location: format!("{street}, {city}"),
        prizes: format!("First prize {first_prize}"),
        starts_in_days: rng.random_range(1..=MAX_START_OFFSET_DAYS),
        duration_days: rng.random_range(1..=MAX_DURATION_DAYS),
        max_participants,
    })
}

/// Draws titles from `source` until one passes validation.
fn generate_title<F>(rng: &mut ChaCha8Rng, source: F) -> Result<String, GenerationError>
where
    F: Fn(&mut ChaCha8Rng) -> String,
{
    for _ in 0..MAX_TITLE_ATTEMPTS {
        let candidate = normalise_title(&source(rng));
        if is_valid_title(&candidate) {
            return Ok(candidate);
        }
    }

    Err(GenerationError::TitleGenerationFailed {
        max_attempts: MAX_TITLE_ATTEMPTS,
    })
}

fn pick<T: Clone>(rng: &mut ChaCha8Rng, items: &[T]) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.random_range(0..items.len())).cloned()
}
