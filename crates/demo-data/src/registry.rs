//! Seed registry types and JSON parsing.
//!
//! The registry names deterministic seeds and lists the colleges generated
//! content is attributed to.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::RegistryError;

/// Current supported registry version.
const SUPPORTED_VERSION: u32 = 1;

/// A seed registry containing named seeds and the colleges content may
/// belong to.
///
/// # Example
///
/// ```
/// use demo_data::SeedRegistry;
///
/// let json = r#"{
///     "version": 1,
///     "colleges": ["North Campus Institute"],
///     "seeds": [{"name": "quiet-quad", "seed": 7, "postCount": 2, "listingCount": 1, "hackathonCount": 1}]
/// }"#;
///
/// let registry = SeedRegistry::from_json(json).expect("valid registry");
/// assert_eq!(registry.seeds().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedRegistry {
    version: u32,
    colleges: Vec<String>,
    seeds: Vec<SeedDefinition>,
}

impl SeedRegistry {
    /// Parses a seed registry from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the JSON is malformed, the version is
    /// unsupported, a college is blank, or the seeds are empty or repeated.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let raw: RawSeedRegistry =
            serde_json::from_str(json).map_err(|e| RegistryError::ParseError {
                message: e.to_string(),
            })?;

        Self::from_raw(raw)
    }

    /// Loads a seed registry from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let contents = fs::read_to_string(path).map_err(|e| RegistryError::IoError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Self::from_json(&contents)
    }

    fn from_raw(raw: RawSeedRegistry) -> Result<Self, RegistryError> {
        if raw.version != SUPPORTED_VERSION {
            return Err(RegistryError::UnsupportedVersion {
                expected: SUPPORTED_VERSION,
                actual: raw.version,
            });
        }

        if raw.colleges.is_empty() {
            return Err(RegistryError::EmptyColleges);
        }
        if let Some(index) = raw.colleges.iter().position(|c| c.trim().is_empty()) {
            return Err(RegistryError::BlankCollege { index });
        }

        if raw.seeds.is_empty() {
            return Err(RegistryError::EmptySeeds);
        }

        let mut names = HashSet::new();
        let mut seeds = Vec::with_capacity(raw.seeds.len());
        for s in raw.seeds {
            if !names.insert(s.name.clone()) {
                return Err(RegistryError::DuplicateSeed { name: s.name });
            }
            seeds.push(SeedDefinition {
                name: s.name,
                seed: s.seed,
                post_count: s.post_count,
                listing_count: s.listing_count,
                hackathon_count: s.hackathon_count,
            });
        }

        Ok(Self {
            version: raw.version,
            colleges: raw
                .colleges
                .into_iter()
                .map(|c| c.trim().to_owned())
                .collect(),
            seeds,
        })
    }

    /// Returns the registry version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Returns the colleges generated content may be attributed to.
    #[must_use]
    pub fn colleges(&self) -> &[String] {
        &self.colleges
    }

    /// Returns all seed definitions.
    #[must_use]
    pub fn seeds(&self) -> &[SeedDefinition] {
        &self.seeds
    }

    /// Finds a seed definition by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SeedNotFound`] if no seed with the given name
    /// exists.
    pub fn find_seed(&self, name: &str) -> Result<&SeedDefinition, RegistryError> {
        self.seeds
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| RegistryError::SeedNotFound {
                name: name.to_owned(),
            })
    }
}

/// A named seed definition for deterministic content generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDefinition {
    name: String,
    seed: u64,
    post_count: usize,
    listing_count: usize,
    hackathon_count: usize,
}

impl SeedDefinition {
    /// Returns the seed name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the RNG seed value.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Returns the number of announcement posts to generate.
    #[must_use]
    pub const fn post_count(&self) -> usize {
        self.post_count
    }

    /// Returns the number of marketplace listings to generate.
    #[must_use]
    pub const fn listing_count(&self) -> usize {
        self.listing_count
    }

    /// Returns the number of hackathons to generate.
    #[must_use]
    pub const fn hackathon_count(&self) -> usize {
        self.hackathon_count
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSeedRegistry {
    version: u32,
    colleges: Vec<String>,
    seeds: Vec<RawSeedDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSeedDefinition {
    name: String,
    seed: u64,
    #[serde(default)]
    post_count: usize,
    #[serde(default)]
    listing_count: usize,
    #[serde(default)]
    hackathon_count: usize,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const VALID_JSON: &str = r#"{
        "version": 1,
        "colleges": ["North Campus Institute", "  Riverside College  "],
        "seeds": [
            {"name": "quiet-quad", "seed": 2026, "postCount": 4, "listingCount": 3, "hackathonCount": 2},
            {"name": "exam-week", "seed": 11, "postCount": 1}
        ]
    }"#;

    #[test]
    fn parses_valid_registry() {
        let registry = SeedRegistry::from_json(VALID_JSON).expect("valid registry");

        assert_eq!(registry.version(), 1);
        assert_eq!(registry.colleges().len(), 2);
        assert_eq!(registry.seeds().len(), 2);
    }

    #[test]
    fn trims_college_names() {
        let registry = SeedRegistry::from_json(VALID_JSON).expect("valid registry");
        assert_eq!(
            registry.colleges().get(1).map(String::as_str),
            Some("Riverside College")
        );
    }

    #[test]
    fn missing_counts_default_to_zero() {
        let registry = SeedRegistry::from_json(VALID_JSON).expect("valid registry");
        let seed = registry.find_seed("exam-week").expect("seed found");

        assert_eq!(seed.post_count(), 1);
        assert_eq!(seed.listing_count(), 0);
        assert_eq!(seed.hackathon_count(), 0);
    }

    #[test]
    fn returns_error_for_unknown_seed() {
        let registry = SeedRegistry::from_json(VALID_JSON).expect("valid registry");

        assert_eq!(
            registry.find_seed("unknown"),
            Err(RegistryError::SeedNotFound {
                name: "unknown".to_owned()
            })
        );
    }

    #[rstest]
    #[case::malformed_json("not valid json")]
    #[case::missing_version(r#"{"colleges": ["A"], "seeds": [{"name": "a", "seed": 1}]}"#)]
    fn rejects_json_with_parse_error(#[case] json: &str) {
        let result = SeedRegistry::from_json(json);
        assert!(matches!(result, Err(RegistryError::ParseError { .. })));
    }

    #[rstest]
    #[case::unsupported_version(
        r#"{"version": 99, "colleges": ["A"], "seeds": [{"name": "a", "seed": 1}]}"#,
        RegistryError::UnsupportedVersion { expected: 1, actual: 99 }
    )]
    #[case::empty_colleges(
        r#"{"version": 1, "colleges": [], "seeds": [{"name": "a", "seed": 1}]}"#,
        RegistryError::EmptyColleges
    )]
    #[case::blank_college(
        r#"{"version": 1, "colleges": ["A", "  "], "seeds": [{"name": "a", "seed": 1}]}"#,
        RegistryError::BlankCollege { index: 1 }
    )]
    #[case::empty_seeds(
        r#"{"version": 1, "colleges": ["A"], "seeds": []}"#,
        RegistryError::EmptySeeds
    )]
    #[case::duplicate_seed(
        r#"{"version": 1, "colleges": ["A"], "seeds": [{"name": "a", "seed": 1}, {"name": "a", "seed": 2}]}"#,
        RegistryError::DuplicateSeed { name: "a".to_owned() }
    )]
    fn rejects_invalid_registry(#[case] json: &str, #[case] expected: RegistryError) {
        assert_eq!(SeedRegistry::from_json(json), Err(expected));
    }
}
