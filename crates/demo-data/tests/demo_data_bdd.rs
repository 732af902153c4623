//! Behavioural tests for demo content generation.

#![expect(
    clippy::expect_used,
    reason = "test code uses expect for clear failure messages"
)]

use demo_data::{
    DemoContent, RegistryError, SeedDefinition, SeedRegistry, generate_demo_content,
    is_valid_title,
};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};

const VALID_REGISTRY_JSON: &str = r#"{
    "version": 1,
    "colleges": ["North Campus Institute", "Riverside College"],
    "seeds": [
        {"name": "busy-term", "seed": 42, "postCount": 6, "listingCount": 4, "hackathonCount": 3}
    ]
}"#;

#[derive(Default, ScenarioState)]
struct World {
    json_input: Slot<String>,
    registry_result: Slot<Result<SeedRegistry, RegistryError>>,
    seed_def: Slot<SeedDefinition>,
    generated: Slot<DemoContent>,
    second_generation: Slot<DemoContent>,
}

impl World {
    fn registry(&self) -> SeedRegistry {
        self.registry_result
            .get()
            .expect("registry should be set")
            .expect("registry should be valid")
    }

    fn registry_result(&self) -> Result<SeedRegistry, RegistryError> {
        self.registry_result
            .get()
            .expect("registry result should be set")
    }

    fn seed_def(&self) -> SeedDefinition {
        self.seed_def.get().expect("seed definition should be set")
    }

    fn content(&self) -> DemoContent {
        self.generated.get().expect("content should be generated")
    }
}

#[fixture]
fn world() -> World {
    World::default()
}

#[given("a valid seed registry JSON")]
fn a_valid_seed_registry_json(world: &World) {
    world.json_input.set(VALID_REGISTRY_JSON.to_owned());
}

#[given("a valid seed registry")]
fn a_valid_seed_registry(world: &World) {
    let registry = SeedRegistry::from_json(VALID_REGISTRY_JSON).expect("valid test registry");
    world.registry_result.set(Ok(registry));
}

#[given("the seed definition {name}")]
fn the_seed_definition(world: &World, name: String) {
    let registry = world.registry();
    let seed_def = registry.find_seed(&name).expect("seed exists");
    world.seed_def.set(seed_def.clone());
}

#[given("malformed JSON")]
fn malformed_json(world: &World) {
    world.json_input.set("not valid json".to_owned());
}

#[given("registry JSON without colleges")]
fn registry_json_without_colleges(world: &World) {
    let json = r#"{
        "version": 1,
        "colleges": [],
        "seeds": [{"name": "busy-term", "seed": 1}]
    }"#;
    world.json_input.set(json.to_owned());
}

#[when("the registry is parsed")]
fn the_registry_is_parsed(world: &World) {
    let json = world.json_input.get().expect("JSON input should be set");
    world.registry_result.set(SeedRegistry::from_json(&json));
}

#[when("content is generated")]
fn content_is_generated(world: &World) {
    let content =
        generate_demo_content(&world.registry(), &world.seed_def()).expect("generation succeeds");
    world.generated.set(content);
}

#[when("content is generated twice")]
fn content_is_generated_twice(world: &World) {
    let registry = world.registry();
    let seed_def = world.seed_def();

    let first = generate_demo_content(&registry, &seed_def).expect("first generation");
    let second = generate_demo_content(&registry, &seed_def).expect("second generation");

    world.generated.set(first);
    world.second_generation.set(second);
}

#[then("parsing succeeds")]
fn parsing_succeeds(world: &World) {
    let result = world.registry_result();
    assert!(result.is_ok(), "Expected parsing to succeed: {result:?}");
}

#[then("the registry contains the expected seed definitions")]
fn the_registry_contains_the_expected_seed_definitions(world: &World) {
    let registry = world.registry();
    let seed = registry.find_seed("busy-term").expect("seed should exist");
    assert_eq!(seed.seed(), 42);
    assert_eq!(seed.post_count(), 6);
    assert_eq!(seed.listing_count(), 4);
    assert_eq!(seed.hackathon_count(), 3);
}

#[then("both generations produce identical content")]
fn both_generations_produce_identical_content(world: &World) {
    let second = world
        .second_generation
        .get()
        .expect("second generation should be set");
    assert_eq!(world.content(), second, "Generations should be deterministic");
}

#[then("all titles satisfy backend constraints")]
fn all_titles_satisfy_backend_constraints(world: &World) {
    let content = world.content();
    let titles = content
        .posts
        .iter()
        .map(|p| p.title.as_str())
        .chain(content.listings.iter().map(|l| l.title.as_str()))
        .chain(content.hackathons.iter().map(|h| h.title.as_str()));
    for title in titles {
        assert!(is_valid_title(title), "Invalid title: {title}");
    }
}

#[then("every post belongs to a registry college")]
fn every_post_belongs_to_a_registry_college(world: &World) {
    let registry = world.registry();
    for post in world.content().posts {
        assert!(
            registry.colleges().contains(&post.college),
            "College {} not in registry",
            post.college
        );
    }
}

#[then("parsing fails with a parse error")]
fn parsing_fails_with_a_parse_error(world: &World) {
    match world.registry_result() {
        Err(RegistryError::ParseError { .. }) => {}
        other => panic!("Expected ParseError, got: {other:?}"),
    }
}

#[then("parsing fails with an empty colleges error")]
fn parsing_fails_with_an_empty_colleges_error(world: &World) {
    match world.registry_result() {
        Err(RegistryError::EmptyColleges) => {}
        other => panic!("Expected EmptyColleges, got: {other:?}"),
    }
}

#[scenario(
    path = "tests/features/demo_data.feature",
    name = "Valid registry parses successfully"
)]
fn valid_registry_parses_successfully(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/demo_data.feature",
    name = "Deterministic generation produces identical content"
)]
fn deterministic_generation_produces_identical_content(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/demo_data.feature",
    name = "Generated titles are valid"
)]
fn generated_titles_are_valid(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/demo_data.feature",
    name = "Post colleges stay within the registry"
)]
fn post_colleges_stay_within_the_registry(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/demo_data.feature",
    name = "Invalid JSON fails parsing"
)]
fn invalid_json_fails_parsing(world: World) {
    let _ = world;
}

#[scenario(
    path = "tests/features/demo_data.feature",
    name = "Registry without colleges fails parsing"
)]
fn registry_without_colleges_fails_parsing(world: World) {
    let _ = world;
}
