//! Executor: walks an [`OperationPlan`] against a root [`GraphyObject`],
//! resolving fields depth-first and assembling the `{"data": ..., "errors":
//! [...]}` response.
//!
//! Sibling fields of a query or subscription's selection set are resolved
//! concurrently (via [`futures::future::join_all`], not OS threads — the
//! plan and scope are borrowed, so spawning onto the runtime isn't an
//! option); mutation fields run one at a time, each waited on before the
//! next starts, per the GraphQL spec's mutation ordering guarantee.
//!
//! A resolver error, or a non-null field that resolves to `null`, nulls out
//! the nearest nullable ancestor position rather than failing the whole
//! response — the well-known GraphQL "error propagation" rule.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;

use crate::ast::{InputValue, OperationType, Type};
use crate::error::{ErrorLocation, ResponseError};
use crate::resolve::{ArgumentValues, BoxFuture, FieldValue, GraphyObject};
use crate::validation::{OperationPlan, PlanField};
use crate::value::Value;

/// The wire-level response envelope: `data` is present unless the whole
/// operation failed before or during top-level execution.
#[derive(Serialize)]
pub struct ExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ResponseError>,
}

impl ExecutionResult {
    pub fn data_only(data: Value) -> ExecutionResult {
        ExecutionResult { data: Some(data), errors: Vec::new() }
    }

    pub fn errors_only(errors: Vec<ResponseError>) -> ExecutionResult {
        ExecutionResult { data: None, errors }
    }
}

/// Run one operation's plan to completion. `root` must already be resolved
/// to the value that answers the operation's root type.
pub async fn execute_operation<S>(
    plan: &OperationPlan,
    root: &dyn GraphyObject<S>,
    scope: &Arc<S>,
    variables: &HashMap<String, InputValue>,
) -> ExecutionResult
where
    S: Send + Sync + 'static,
{
    let concurrent = plan.operation_type != OperationType::Mutation;
    let (result, errors) = execute_selection_set(&plan.selection, root, scope, variables, Vec::new(), concurrent).await;
    match result {
        Ok(fields) => ExecutionResult { data: Some(Value::Object(fields)), errors },
        Err(()) => ExecutionResult { data: Some(Value::Null), errors },
    }
}

/// Apply the remainder of a subscription's plan (its single root field's
/// children) to one already-resolved event value. Used by the subscription
/// driver, which calls the root procedure only once to obtain the producer;
/// each subsequent item skips straight to this step instead of re-invoking
/// `resolve_field`.
pub async fn execute_subscription_event<S>(
    plan: &OperationPlan,
    event: FieldValue<S>,
    scope: &Arc<S>,
    variables: &HashMap<String, InputValue>,
) -> ExecutionResult
where
    S: Send + Sync + 'static,
{
    let root_field = &plan.selection[0];
    let (result, errors) = convert_field_value(
        event,
        &root_field.field_type,
        &root_field.children,
        scope,
        variables,
        vec![PathSegmentOwned::Field(root_field.response_key.clone())],
        true,
    )
    .await;

    let mut data = IndexMap::new();
    match result {
        Ok(v) => {
            data.insert(root_field.response_key.clone(), v);
        }
        Err(()) => {
            data.insert(root_field.response_key.clone(), Value::Null);
        }
    }
    ExecutionResult { data: Some(Value::Object(data)), errors }
}

fn execute_selection_set<'a, S>(
    fields: &'a [PlanField],
    object: &'a dyn GraphyObject<S>,
    scope: &'a Arc<S>,
    variables: &'a HashMap<String, InputValue>,
    path: Vec<PathSegmentOwned>,
    concurrent: bool,
) -> BoxFuture<'a, (Result<IndexMap<String, Value>, ()>, Vec<ResponseError>)>
where
    S: Send + Sync + 'static,
{
    Box::pin(async move {
        let type_name = object.graphy_type_name();
        let applicable: Vec<&PlanField> = fields
            .iter()
            .filter(|f| f.skip_include.resolve(variables))
            .filter(|f| f.type_condition.as_deref().map_or(true, |t| t == type_name))
            .collect();

        let outcomes: Vec<(String, bool, Result<Value, ()>, Vec<ResponseError>)> = if concurrent {
            let futures = applicable.iter().map(|field| {
                let mut field_path = path.clone();
                field_path.push(PathSegmentOwned::Field(field.response_key.clone()));
                execute_field(field, object, scope, variables, field_path)
            });
            futures::future::join_all(futures).await
        } else {
            let mut out = Vec::with_capacity(applicable.len());
            for field in &applicable {
                let mut field_path = path.clone();
                field_path.push(PathSegmentOwned::Field(field.response_key.clone()));
                out.push(execute_field(field, object, scope, variables, field_path).await);
            }
            out
        };

        let mut errors = Vec::new();
        let mut propagate = false;
        let mut values = IndexMap::new();
        for (response_key, nullable, outcome, mut field_errors) in outcomes {
            errors.append(&mut field_errors);
            match outcome {
                Ok(v) => {
                    values.insert(response_key, v);
                }
                Err(()) => {
                    if nullable {
                        values.insert(response_key, Value::Null);
                    } else {
                        propagate = true;
                    }
                }
            }
        }

        if propagate { (Err(()), errors) } else { (Ok(values), errors) }
    })
}

async fn execute_field<'a, S>(
    field: &'a PlanField,
    object: &'a dyn GraphyObject<S>,
    scope: &'a Arc<S>,
    variables: &'a HashMap<String, InputValue>,
    path: Vec<PathSegmentOwned>,
) -> (String, bool, Result<Value, ()>, Vec<ResponseError>)
where
    S: Send + Sync + 'static,
{
    let nullable = !field.field_type.is_non_null();

    if field.field_name == "__typename" {
        return (field.response_key.clone(), nullable, Ok(Value::String(object.graphy_type_name().to_owned())), Vec::new());
    }

    let args = ArgumentValues::new(
        field
            .arguments
            .iter()
            .map(|(name, value)| (name.clone(), value.item.clone().into_const(variables)))
            .collect(),
    );

    match object.resolve_field(&field.field_name, &args, scope).await {
        Ok(value) => {
            let (result, errors) = convert_field_value(value, &field.field_type, &field.children, scope, variables, path, true).await;
            (field.response_key.clone(), nullable, result, errors)
        }
        Err(err) => {
            let location = ErrorLocation { line: field.location.line, column: field.location.column };
            let response_error = ResponseError { message: err.to_string(), locations: vec![location], path: to_response_path(&path) };
            (field.response_key.clone(), nullable, Err(()), vec![response_error])
        }
    }
}

fn convert_field_value<'a, S>(
    value: FieldValue<S>,
    field_type: &'a Type,
    children: &'a [PlanField],
    scope: &'a Arc<S>,
    variables: &'a HashMap<String, InputValue>,
    path: Vec<PathSegmentOwned>,
    concurrent: bool,
) -> BoxFuture<'a, (Result<Value, ()>, Vec<ResponseError>)>
where
    S: Send + Sync + 'static,
{
    Box::pin(async move {
        match value {
            FieldValue::Null => {
                if field_type.is_non_null() {
                    let error = ResponseError {
                        message: "non-null field resolved to null".to_owned(),
                        locations: Vec::new(),
                        path: to_response_path(&path),
                    };
                    (Err(()), vec![error])
                } else {
                    (Ok(Value::Null), Vec::new())
                }
            }
            FieldValue::Leaf(v) => (Ok(v), Vec::new()),
            FieldValue::List(items) => {
                let inner_type = list_inner(field_type);
                let mut out = Vec::with_capacity(items.len());
                let mut errors = Vec::new();
                let mut propagate = false;
                for (index, item) in items.into_iter().enumerate() {
                    let mut item_path = path.clone();
                    item_path.push(PathSegmentOwned::Index(index));
                    let (result, mut item_errors) =
                        convert_field_value(item, inner_type, children, scope, variables, item_path, concurrent).await;
                    errors.append(&mut item_errors);
                    match result {
                        Ok(v) => out.push(v),
                        Err(()) => {
                            if inner_type.is_non_null() {
                                propagate = true;
                                break;
                            }
                            out.push(Value::Null);
                        }
                    }
                }
                if propagate { (Err(()), errors) } else { (Ok(Value::List(out)), errors) }
            }
            FieldValue::Object(obj) => {
                let (result, errors) = execute_selection_set(children, obj.as_ref(), scope, variables, path, concurrent).await;
                (result.map(Value::Object), errors)
            }
        }
    })
}

fn list_inner(t: &Type) -> &Type {
    match t {
        Type::List(inner) | Type::NonNullList(inner) => inner,
        other => other,
    }
}

/// An owned analogue of [`crate::error::PathSegment`] accumulated while
/// descending into the result tree; converted to the wire form only when an
/// error needs reporting at that position.
#[derive(Clone, Debug)]
enum PathSegmentOwned {
    Field(String),
    Index(usize),
}

fn to_response_path(path: &[PathSegmentOwned]) -> Vec<crate::error::PathSegment> {
    path.iter()
        .map(|s| match s {
            PathSegmentOwned::Field(name) => crate::error::PathSegment::Field(name.clone()),
            PathSegmentOwned::Index(i) => crate::error::PathSegment::Index(*i),
        })
        .collect()
}
