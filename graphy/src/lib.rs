//! graphy is a GraphQL server engine that infers its schema from ordinary
//! Rust types and `async fn`s instead of a hand-written SDL file.
//!
//! Expose a query by registering an async procedure with an [`Engine`]:
//! the procedure's argument types and return type are reflected into the
//! schema automatically, and its body runs as the field's resolver.
//! [`Engine::process_request`] then parses, validates, plans, and executes
//! an incoming document against whatever has been registered so far.
//!
//! ```ignore
//! use std::sync::Arc;
//! use graphy::{Engine, config::EngineConfig};
//!
//! struct Context;
//!
//! async fn hello(_ctx: Arc<Context>) -> Result<String, graphy::GraphyError> {
//!     Ok("world".to_owned())
//! }
//!
//! # async fn run() {
//! let engine: Engine<Context> = Engine::new(EngineConfig::default());
//! engine.register_query("hello", &[], hello);
//! let response = engine.process_request(Arc::new(Context), "{ hello }", None, None).await;
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::type_complexity)]

mod ast;
pub mod binder;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod introspection;
pub mod limits;
pub mod parser;
mod position;
pub mod reflect;
pub mod resolve;
pub mod schema;
pub mod subscription;
pub mod validation;
pub mod value;

pub use ast::{InputValue, Selection, Type};
pub use config::EngineConfig;
pub use engine::{Engine, OperationKind};
pub use error::{GraphyError, ResponseError};
pub use executor::ExecutionResult;
pub use graphy_macros::{graphy_object, GraphyAbstract, GraphyEnum, GraphyInputObject, GraphyObject};
pub use reflect::{FromInput, Id, Reflect, ToInput, Validate, ValidateWithScope};
pub use resolve::{ArgumentValues, FieldValue, GraphyObject, IntoFieldValue, IntoRootResolver, IntoSubscriptionResolver};
pub use schema::model::SchemaType;
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Context;

    async fn hello(_scope: Arc<Context>) -> Result<String, GraphyError> {
        Ok("world".to_owned())
    }

    #[tokio::test]
    async fn registers_and_answers_a_trivial_query() {
        let engine: Engine<Context> = Engine::new(EngineConfig::default());
        engine.register_query("hello", &[], hello);

        let response = engine.process_request(Arc::new(Context), "{ hello }", None, None).await;
        assert_eq!(response["data"]["hello"], serde_json::json!("world"));
        assert!(response.get("errors").is_none());
    }

    #[tokio::test]
    async fn reports_validation_errors_for_unknown_fields() {
        let engine: Engine<Context> = Engine::new(EngineConfig::default());
        engine.register_query("hello", &[], hello);

        let response = engine.process_request(Arc::new(Context), "{ nope }", None, None).await;
        assert!(response.get("data").is_none());
        assert!(response["errors"].as_array().unwrap().len() == 1);
    }
}
