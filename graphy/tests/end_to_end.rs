//! End-to-end coverage driving [`graphy::Engine`] through a full document ->
//! response cycle for each of the engine's headline behaviours: union
//! fragment dispatch, field-name metadata priority, input validation (plain
//! and scope-aware), memory limits, and subscription streaming.

use std::sync::Arc;

use graphy::config::{EngineConfig, MemoryLimits};
use graphy::{Engine, GraphyAbstract, GraphyEnum, GraphyError, GraphyInputObject, GraphyObject, Validate, ValidateWithScope};

struct Ctx {
    current_user: String,
}

// --- Scenario 1: alias + abstract-container fragments -------------------

#[derive(Clone, GraphyObject)]
struct Course {
    title: String,
    instructor: String,
}

#[derive(Clone, GraphyObject)]
struct CourseA {
    title: String,
    instructor: String,
    price: i32,
}

#[derive(Clone, GraphyObject)]
struct CourseB {
    title: String,
    instructor: String,
    price: i32,
}

/// A resolver's declared return type standing in for the abstract container
/// a union/interface field actually returns — the derive macros only ever
/// produce a single concrete object type per struct, so this enum names the
/// set of variants a `courses` field can resolve to. `CourseA`/`CourseB`
/// both share `Course`'s `title`/`instructor` fields, so `GraphyAbstract`
/// interns this container as an `Interface` (not a `Union`) the first time
/// it's reflected; see `abstract_container_with_no_shared_fields_becomes_a_union`
/// below for the other branch of that decision.
#[derive(GraphyAbstract)]
enum CourseResult {
    Base(Course),
    A(CourseA),
    B(CourseB),
}

async fn list_courses(_scope: Arc<Ctx>, categories: Vec<String>) -> Result<Vec<CourseResult>, GraphyError> {
    let names = ["John Doe", "Judy Doe"];
    Ok(categories
        .into_iter()
        .enumerate()
        .map(|(i, title)| CourseResult::Base(Course { title, instructor: names[i % names.len()].to_owned() }))
        .collect())
}

#[tokio::test]
async fn interface_fragments_are_skipped_when_the_type_condition_does_not_match() {
    let engine: Engine<Ctx> = Engine::new(EngineConfig::default());
    engine.register_query("courses", &["categories"], list_courses);

    let scope = Arc::new(Ctx { current_user: "user123".to_owned() });
    let document = r#"{
        alias: courses(categories: ["Golang", "C#"]) {
            title
            instructor
            __typename
            ... on CourseA { price }
            ... on CourseB { price }
        }
    }"#;

    let response = engine.process_request(scope, document, None, None).await;
    assert!(response.get("errors").is_none(), "{response}");

    let alias = response["data"]["alias"].as_array().expect("alias is a list");
    assert_eq!(alias.len(), 2);
    assert_eq!(alias[0]["title"], "Golang");
    assert_eq!(alias[0]["instructor"], "John Doe");
    assert_eq!(alias[0]["__typename"], "Course");
    assert!(alias[0].get("price").is_none(), "fragment on CourseA must not contribute `price`");
    assert_eq!(alias[1]["title"], "C#");
    assert_eq!(alias[1]["instructor"], "Judy Doe");
}

// --- Scenario 2: field-name metadata priority ---------------------------

#[derive(Clone, GraphyObject)]
#[allow(non_snake_case)]
struct Simple {
    #[graphy("g1")]
    graphy_only: String,
    #[serde(rename = "j1")]
    json_only: String,
    #[graphy("g2")]
    #[serde(rename = "j2")]
    both_tags: String,
    NoTags: String,
    #[graphy("")]
    #[serde(rename = "j3")]
    graphy_empty: String,
}

async fn get_simple(_scope: Arc<Ctx>) -> Result<Simple, GraphyError> {
    Ok(Simple {
        graphy_only: "g1-value".to_owned(),
        json_only: "j1-value".to_owned(),
        both_tags: "both-tags-value".to_owned(),
        NoTags: "no-tags-value".to_owned(),
        graphy_empty: "graphy-empty-value".to_owned(),
    })
}

#[tokio::test]
async fn graphy_attribute_wins_and_empty_graphy_falls_through_to_serde_rename() {
    let engine: Engine<Ctx> = Engine::new(EngineConfig::default());
    engine.register_query("getSimple", &[], get_simple);

    let scope = Arc::new(Ctx { current_user: "user123".to_owned() });
    let document = "{ getSimple { g1 j1 g2 NoTags j3 } }";
    let response = engine.process_request(scope, document, None, None).await;

    assert!(response.get("errors").is_none(), "{response}");
    let simple = &response["data"]["getSimple"];
    assert_eq!(simple["g1"], "g1-value");
    assert_eq!(simple["j1"], "j1-value");
    assert_eq!(simple["g2"], "both-tags-value", "graphy name must win over serde rename");
    assert_eq!(simple["NoTags"], "no-tags-value");
    assert_eq!(simple["j3"], "graphy-empty-value", "an empty graphy override must fall through to the serde rename");
}

// --- Scenario 3: input validation ---------------------------------------

#[derive(Clone, GraphyInputObject)]
struct CreateValidatedUserInput {
    name: String,
    email: String,
    age: i32,
}

impl Validate for CreateValidatedUserInput {
    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name is required".to_owned());
        }
        Ok(())
    }
}

#[derive(Clone, GraphyObject)]
struct User {
    id: String,
    name: String,
}

async fn create_validated_user(_scope: Arc<Ctx>, input: CreateValidatedUserInput) -> Result<User, GraphyError> {
    input.validate().map_err(GraphyError::validation)?;
    Ok(User { id: "1".to_owned(), name: input.name })
}

#[tokio::test]
async fn invalid_input_is_rejected_before_the_resolver_body_runs() {
    let engine: Engine<Ctx> = Engine::new(EngineConfig::default());
    engine.register_mutation("createValidatedUser", &["input"], create_validated_user);

    let scope = Arc::new(Ctx { current_user: "user123".to_owned() });
    let document = r#"mutation { createValidatedUser(input: {name: "", email: "a@b", age: 25}) { id } }"#;
    let response = engine.process_request(scope, document, None, None).await;

    assert!(response["data"].is_null(), "a non-null mutation field failing must null out the root");
    let message = response["errors"][0]["message"].as_str().unwrap();
    assert!(message.contains("name is required"), "{message}");
}

// --- Scenario 4: context-aware validation -------------------------------

#[derive(Clone, GraphyEnum)]
enum Role {
    Editor,
    Admin,
}

#[derive(Clone, GraphyInputObject)]
struct UpdateUserRoleInput {
    #[serde(rename = "userId")]
    user_id: String,
    role: Role,
    action: String,
}

impl ValidateWithScope<Ctx> for UpdateUserRoleInput {
    fn validate_with_scope(&self, scope: &Ctx) -> Result<(), String> {
        if self.user_id != scope.current_user {
            return Err("can only modify your own data".to_owned());
        }
        Ok(())
    }
}

async fn update_user_role(scope: Arc<Ctx>, input: UpdateUserRoleInput) -> Result<bool, GraphyError> {
    input.validate_with_scope(&scope).map_err(GraphyError::validation)?;
    Ok(true)
}

fn build_role_engine() -> Engine<Ctx> {
    let engine = Engine::new(EngineConfig::default());
    engine.register_mutation("updateUserRole", &["input"], update_user_role);
    engine
}

#[tokio::test]
async fn scope_mismatch_is_rejected_and_a_matching_scope_succeeds() {
    let engine = build_role_engine();
    let document = r#"mutation { updateUserRole(input: {userId: "otheruser", role: Editor, action: "update"}) }"#;

    let denied = engine.process_request(Arc::new(Ctx { current_user: "user123".to_owned() }), document, None, None).await;
    assert!(denied["data"].is_null());
    assert!(denied["errors"][0]["message"].as_str().unwrap().contains("can only modify your own data"));

    let allowed = engine.process_request(Arc::new(Ctx { current_user: "otheruser".to_owned() }), document, None, None).await;
    assert!(allowed.get("errors").is_none(), "{allowed}");
    assert_eq!(allowed["data"]["updateUserRole"], serde_json::json!(true));
}

// --- Scenario 5: memory limits -------------------------------------------

async fn echo(_scope: Arc<Ctx>, input: String) -> Result<String, GraphyError> {
    Ok(input)
}

#[tokio::test]
async fn oversized_variables_payload_is_rejected_with_a_limit_error() {
    let mut config = EngineConfig::default();
    config.memory_limits = MemoryLimits { max_variable_size: 50, ..MemoryLimits::default() };
    let engine: Engine<Ctx> = Engine::new(config);
    engine.register_query("echo", &["input"], echo);

    let scope = Arc::new(Ctx { current_user: "user123".to_owned() });
    let document = "query($input: String!) { echo(input: $input) }";
    let oversized = serde_json::json!({ "input": "x".repeat(60) });

    let response = engine.process_request(scope, document, None, Some(oversized)).await;
    assert!(response.get("data").is_none());
    let message = response["errors"][0]["message"].as_str().unwrap();
    assert!(message.contains("variables payload"), "{message}");
}

// --- Scenario 6: subscription streaming ----------------------------------

async fn test_sub(_scope: Arc<Ctx>) -> Result<impl futures::Stream<Item = Result<String, GraphyError>>, GraphyError> {
    Ok(futures::stream::iter(["msg1", "msg2", "msg3"].into_iter().map(|s| Ok(s.to_owned()))))
}

#[tokio::test]
async fn subscription_emits_every_item_in_order_then_closes() {
    let mut config = EngineConfig::default();
    config.memory_limits = MemoryLimits { subscription_buffer_size: 3, ..MemoryLimits::default() };
    let engine: Engine<Ctx> = Engine::new(config);
    engine.register_subscription("testSub", &[], test_sub);

    let scope = Arc::new(Ctx { current_user: "user123".to_owned() });
    let document = "subscription { testSub }";
    let (mut stream, _cancel) = engine.process_subscription(scope, document, None, None).await.expect("subscription starts");

    use futures::StreamExt;
    let mut seen = Vec::new();
    while let Some(envelope) = stream.next().await {
        seen.push(envelope["data"]["testSub"].as_str().unwrap().to_owned());
    }

    assert_eq!(seen, vec!["msg1", "msg2", "msg3"]);
}

// --- Scenario 7: automatic union inference --------------------------------

#[derive(Clone, GraphyObject)]
struct Photo {
    url: String,
}

#[derive(Clone, GraphyObject)]
struct Video {
    length: i32,
}

/// `Photo` and `Video` share no field beyond `__typename`, so `GraphyAbstract`
/// interns this container as a `Union` rather than an `Interface` — the
/// other branch of the decision exercised by `CourseResult` above.
#[derive(GraphyAbstract)]
enum SearchResult {
    Photo(Photo),
    Video(Video),
}

async fn search(_scope: Arc<Ctx>) -> Result<Vec<SearchResult>, GraphyError> {
    Ok(vec![SearchResult::Photo(Photo { url: "a.jpg".to_owned() }), SearchResult::Video(Video { length: 42 })])
}

#[tokio::test]
async fn abstract_container_with_no_shared_fields_becomes_a_union() {
    let engine: Engine<Ctx> = Engine::new(EngineConfig::default());
    engine.register_query("search", &[], search);

    let scope = Arc::new(Ctx { current_user: "user123".to_owned() });
    let document = "{ search { __typename ... on Photo { url } ... on Video { length } } }";
    let response = engine.process_request(scope, document, None, None).await;

    assert!(response.get("errors").is_none(), "{response}");
    let results = response["data"]["search"].as_array().expect("search is a list");
    assert_eq!(results[0]["__typename"], "Photo");
    assert_eq!(results[0]["url"], "a.jpg");
    assert!(results[0].get("length").is_none());
    assert_eq!(results[1]["__typename"], "Video");
    assert_eq!(results[1]["length"], 42);
    assert!(results[1].get("url").is_none());
}
