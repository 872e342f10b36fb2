//! The Engine facade: the single entry point embedders use to register
//! procedures, build the inferred schema, and run requests.
//!
//! The schema snapshot is rebuilt lazily — the first request after a new
//! registration pays the rebuild cost, every one after that reads the
//! cached `Arc<SchemaType>` without taking the write lock.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use futures::{Stream, StreamExt};
use tracing::instrument;

use crate::ast::InputValue;
use crate::binder;
use crate::config::EngineConfig;
use crate::error::GraphyError;
use crate::executor::{self, ExecutionResult};
use crate::parser::parse_document_source;
use crate::resolve::{
    ArgumentValues, BoxFuture, FieldValue, GraphyObject, IntoRootResolver, IntoSubscriptionResolver, RootResolver,
    SubscriptionRootResolver, SubscriptionStream,
};
use crate::schema::meta::Field;
use crate::schema::model::SchemaType;
use crate::schema::registry::TypeRegistry;
use crate::validation::{self, OperationPlan};
use crate::{ast::OperationType, introspection};
use tokio_util::sync::CancellationToken;

/// Which root the legacy [`Engine::register_processor`] form should bind a
/// procedure under. Rust can't recover this from the procedure's type alone
/// the way a reflection-based host language can, so it's an explicit
/// parameter here rather than inferred — see `DESIGN.md`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

struct Registrations<S> {
    registry: TypeRegistry,
    query_fields: Vec<Field>,
    query_resolvers: HashMap<String, RootResolver<S>>,
    mutation_fields: Vec<Field>,
    mutation_resolvers: HashMap<String, RootResolver<S>>,
    subscription_fields: Vec<Field>,
    subscription_resolvers: HashMap<String, SubscriptionRootResolver<S>>,
    introspection_enabled: bool,
    schema: Option<Arc<SchemaType>>,
    stub_cache: HashMap<String, Arc<HashMap<String, OperationPlan>>>,
}

impl<S> Default for Registrations<S> {
    fn default() -> Self {
        Registrations {
            registry: TypeRegistry::new(),
            query_fields: Vec::new(),
            query_resolvers: HashMap::new(),
            mutation_fields: Vec::new(),
            mutation_resolvers: HashMap::new(),
            subscription_fields: Vec::new(),
            subscription_resolvers: HashMap::new(),
            introspection_enabled: false,
            schema: None,
            stub_cache: HashMap::new(),
        }
    }
}

pub struct Engine<S> {
    state: RwLock<Registrations<S>>,
    config: EngineConfig,
}

impl<S> Engine<S>
where
    S: Send + Sync + 'static,
{
    pub fn new(config: EngineConfig) -> Engine<S> {
        let mut registrations = Registrations::default();
        registrations.introspection_enabled = config.enable_introspection;
        Engine { state: RwLock::new(registrations), config }
    }

    pub fn register_query<F, Args>(&self, name: &str, parameter_names: &[&str], procedure: F)
    where
        F: IntoRootResolver<S, Args> + 'static,
    {
        let mut state = self.state.write().expect("engine registration lock poisoned");
        let field = F::reflect_field(name, parameter_names, &mut state.registry);
        state.query_fields.push(field);
        state.query_resolvers.insert(name.to_owned(), procedure.into_root_resolver());
        invalidate(&mut state);
    }

    pub fn register_mutation<F, Args>(&self, name: &str, parameter_names: &[&str], procedure: F)
    where
        F: IntoRootResolver<S, Args> + 'static,
    {
        let mut state = self.state.write().expect("engine registration lock poisoned");
        let field = F::reflect_field(name, parameter_names, &mut state.registry);
        state.mutation_fields.push(field);
        state.mutation_resolvers.insert(name.to_owned(), procedure.into_root_resolver());
        invalidate(&mut state);
    }

    pub fn register_subscription<F, Args>(&self, name: &str, parameter_names: &[&str], procedure: F)
    where
        F: IntoSubscriptionResolver<S, Args> + 'static,
    {
        let mut state = self.state.write().expect("engine registration lock poisoned");
        let field = F::reflect_field(name, parameter_names, &mut state.registry);
        state.subscription_fields.push(field);
        state.subscription_resolvers.insert(name.to_owned(), procedure.into_subscription_resolver());
        invalidate(&mut state);
    }

    /// The legacy combined registration form. Limited to query/mutation
    /// procedures (see [`OperationKind`]); subscriptions, whose signature
    /// shape differs, must use [`Self::register_subscription`].
    pub fn register_processor<F, Args>(&self, kind: OperationKind, name: &str, parameter_names: &[&str], procedure: F)
    where
        F: IntoRootResolver<S, Args> + 'static,
    {
        match kind {
            OperationKind::Query => self.register_query(name, parameter_names, procedure),
            OperationKind::Mutation => self.register_mutation(name, parameter_names, procedure),
        }
    }

    pub fn enable_introspection(&self) {
        let mut state = self.state.write().expect("engine registration lock poisoned");
        state.introspection_enabled = true;
        invalidate(&mut state);
    }

    fn snapshot(&self) -> Arc<SchemaType> {
        if let Some(schema) = self.state.read().expect("engine registration lock poisoned").schema.clone() {
            return schema;
        }

        let mut state = self.state.write().expect("engine registration lock poisoned");
        if let Some(schema) = &state.schema {
            return schema.clone();
        }

        let registry = std::mem::replace(&mut state.registry, TypeRegistry::new());
        let schema = Arc::new(SchemaType::build(
            registry,
            state.query_fields.clone(),
            state.mutation_fields.clone(),
            state.subscription_fields.clone(),
            state.introspection_enabled,
        ));
        state.schema = Some(schema.clone());
        schema
    }

    fn stub(&self, document_text: &str, schema: &SchemaType) -> Result<Arc<HashMap<String, OperationPlan>>, Vec<GraphyError>> {
        if let Some(stub) = self.state.read().expect("engine registration lock poisoned").stub_cache.get(document_text) {
            return Ok(stub.clone());
        }

        let document = parse_document_source(document_text).map_err(|e| vec![GraphyError::from(e)])?;
        let plans = Arc::new(validation::validate_and_plan(&document, schema)?);

        let mut state = self.state.write().expect("engine registration lock poisoned");
        state.stub_cache.insert(document_text.to_owned(), plans.clone());
        Ok(plans)
    }

    fn select_operation<'a>(
        &self,
        plans: &'a HashMap<String, OperationPlan>,
        operation_name: Option<&str>,
    ) -> Result<&'a OperationPlan, GraphyError> {
        match operation_name {
            Some(name) => plans.get(name).ok_or_else(|| GraphyError::validation(format!("unknown operation `{name}`"))),
            None if plans.len() == 1 => Ok(plans.values().next().unwrap()),
            None => Err(GraphyError::validation("document defines multiple operations; `operationName` is required")),
        }
    }

    /// Execute a query or mutation document and return the serialised
    /// response envelope.
    #[instrument(skip(self, scope, document_text, variables_json))]
    pub async fn process_request(
        &self,
        scope: Arc<S>,
        document_text: &str,
        operation_name: Option<&str>,
        variables_json: Option<serde_json::Value>,
    ) -> serde_json::Value {
        let result = self.run_request(scope, document_text, operation_name, variables_json).await;
        serde_json::to_value(&result).unwrap_or_else(|_| {
            serde_json::json!({"errors": [{"message": "internal error: response could not be serialised"}]})
        })
    }

    async fn run_request(
        &self,
        scope: Arc<S>,
        document_text: &str,
        operation_name: Option<&str>,
        variables_json: Option<serde_json::Value>,
    ) -> ExecutionResult {
        let schema = self.snapshot();

        let plans = match self.stub(document_text, &schema) {
            Ok(plans) => plans,
            Err(errors) => return ExecutionResult::errors_only(errors.iter().map(GraphyError::to_response_error).collect()),
        };

        let plan = match self.select_operation(&plans, operation_name) {
            Ok(plan) => plan,
            Err(err) => return ExecutionResult::errors_only(vec![err.to_response_error()]),
        };

        if plan.operation_type == OperationType::Subscription {
            return ExecutionResult::errors_only(vec![
                GraphyError::validation("use process_subscription for subscription operations").to_response_error(),
            ]);
        }

        let raw_len = variables_json.as_ref().map(|v| v.to_string().len()).unwrap_or(0);
        let variables = match binder::bind_variables(
            variables_json.as_ref(),
            raw_len,
            &plan.variable_definitions,
            &schema,
            &self.config.memory_limits,
        ) {
            Ok(v) => v,
            Err(err) => return ExecutionResult::errors_only(vec![err.to_response_error()]),
        };

        // Clone the relevant resolver map out from under the lock rather than
        // holding the guard across the `.await` below — `std::sync::RwLockReadGuard`
        // isn't `Send`, so an executor-suspended future couldn't resume on
        // another worker thread while still holding one.
        let (resolvers, type_name) = {
            let state = self.state.read().expect("engine registration lock poisoned");
            match plan.operation_type {
                OperationType::Query => (state.query_resolvers.clone(), "Query"),
                OperationType::Mutation => (state.mutation_resolvers.clone(), "Mutation"),
                OperationType::Subscription => unreachable!("rejected above"),
            }
        };
        let root = RootObject { resolvers: &resolvers, type_name, schema: &schema };

        executor::execute_operation(plan, &root, &scope, &variables).await
    }

    /// Start a subscription and return a stream of serialised response
    /// envelopes, plus a token the caller can cancel to stop it early.
    pub async fn process_subscription(
        &self,
        scope: Arc<S>,
        document_text: &str,
        operation_name: Option<&str>,
        variables_json: Option<serde_json::Value>,
    ) -> Result<(impl Stream<Item = serde_json::Value>, CancellationToken), serde_json::Value> {
        let schema = self.snapshot();

        let plans = self
            .stub(document_text, &schema)
            .map_err(|errors| serde_json::json!({"errors": errors.iter().map(GraphyError::to_response_error).collect::<Vec<_>>()}))?;

        let plan = self
            .select_operation(&plans, operation_name)
            .map_err(|e| serde_json::to_value(ExecutionResult::errors_only(vec![e.to_response_error()])).unwrap())?;

        if plan.operation_type != OperationType::Subscription {
            return Err(serde_json::json!({"errors": [{"message": "document's operation is not a subscription"}]}));
        }

        let raw_len = variables_json.as_ref().map(|v| v.to_string().len()).unwrap_or(0);
        let variables = binder::bind_variables(variables_json.as_ref(), raw_len, &plan.variable_definitions, &schema, &self.config.memory_limits)
            .map_err(|e| serde_json::to_value(ExecutionResult::errors_only(vec![e.to_response_error()])).unwrap())?;

        let root_field = &plan.selection[0];
        let resolver = {
            let state = self.state.read().expect("engine registration lock poisoned");
            state
                .subscription_resolvers
                .get(&root_field.field_name)
                .cloned()
                .ok_or_else(|| serde_json::json!({"errors": [{"message": format!("no such subscription `{}`", root_field.field_name)}]}))?
        };

        let args = ArgumentValues::new(
            root_field.arguments.iter().map(|(name, value)| (name.clone(), value.item.clone().into_const(&variables))).collect(),
        );

        let source: SubscriptionStream<S> = crate::subscription::start_subscription(&resolver, scope.clone(), args)
            .await
            .map_err(|e| serde_json::to_value(ExecutionResult::errors_only(vec![e.to_response_error()])).unwrap())?;

        let plan_owned = Arc::new(clone_plan(plan));
        let variables = Arc::new(variables);
        let buffer_size = crate::limits::subscription_buffer_capacity(&self.config.memory_limits);

        let (rx, cancel) = crate::subscription::drive_subscription(source, plan_owned, scope, variables, buffer_size);
        let stream = tokio_stream::wrappers::ReceiverStream::new(rx)
            .map(|result| serde_json::to_value(&result).unwrap_or_else(|_| serde_json::json!({"errors": [{"message": "internal error"}]})));

        Ok((stream, cancel))
    }
}

fn invalidate<S>(state: &mut Registrations<S>) {
    state.schema = None;
    state.stub_cache.clear();
}

fn clone_plan(plan: &OperationPlan) -> OperationPlan {
    OperationPlan {
        operation_type: plan.operation_type,
        name: plan.name.clone(),
        variable_definitions: plan.variable_definitions.clone(),
        selection: plan.selection.clone(),
    }
}

/// Adapts the flat `name -> resolver` map the engine keeps for one root
/// operation kind into a [`GraphyObject`], so the executor can dispatch into
/// it exactly like any other resolved object. Also answers introspection's
/// `__schema`/`__type` meta-fields, which bypass the ordinary resolver table
/// entirely.
struct RootObject<'a, S> {
    resolvers: &'a HashMap<String, RootResolver<S>>,
    type_name: &'static str,
    schema: &'a SchemaType,
}

impl<'a, S> GraphyObject<S> for RootObject<'a, S>
where
    S: Send + Sync + 'static,
{
    fn graphy_type_name(&self) -> &'static str {
        self.type_name
    }

    fn resolve_field<'b>(
        &'b self,
        field_name: &'b str,
        args: &'b ArgumentValues,
        scope: &'b Arc<S>,
    ) -> BoxFuture<'b, Result<FieldValue<S>, GraphyError>> {
        Box::pin(async move {
            match field_name {
                "__schema" => Ok(FieldValue::leaf(introspection::resolve_schema(self.schema))),
                "__type" => Ok(FieldValue::leaf(introspection::resolve_type(self.schema, args))),
                _ => match self.resolvers.get(field_name) {
                    Some(resolver) => resolver(scope.clone(), args.clone()).await,
                    None => Err(GraphyError::internal(anyhow::anyhow!("no resolver registered for field `{field_name}`"))),
                },
            }
        })
    }
}
