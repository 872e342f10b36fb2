//! Variable Binder: turns the top-level `variables` JSON payload into the
//! `InputValue` map the planner's `into_const` substitution draws from.
//!
//! This only produces `InputValue`s, not concrete host types — materialising
//! a concrete `T` (and, for validated input objects, running
//! [`crate::reflect::Validate`]/[`ValidateWithScope`](crate::reflect::ValidateWithScope))
//! happens per-argument at resolver-invocation time via
//! [`crate::resolve::ArgumentValues::get`], since only the field that
//! declared an argument knows its Rust type. See `DESIGN.md` for why
//! binding is split this way.

use std::collections::HashMap;

use crate::ast::{InputValue, Type, VariableDefinition};
use crate::config::MemoryLimits;
use crate::error::GraphyError;
use crate::limits;
use crate::schema::model::SchemaType;

/// Parse and type-check a request's `variables` payload against the
/// operation's declared variable signature.
///
/// `raw` is `None` when the request carried no `variables` key at all
/// (equivalent to `{}`); `raw_len` is the payload's byte length as received
/// on the wire, checked against [`MemoryLimits::max_variable_size`] before
/// any parsing happens.
pub fn bind_variables(
    raw: Option<&serde_json::Value>,
    raw_len: usize,
    declarations: &[(String, VariableDefinition)],
    schema: &SchemaType,
    limits: &MemoryLimits,
) -> Result<HashMap<String, InputValue>, GraphyError> {
    limits::check_variable_payload_size(raw_len, limits)?;

    let supplied: HashMap<String, serde_json::Value> = match raw {
        None => HashMap::new(),
        Some(serde_json::Value::Null) => HashMap::new(),
        Some(serde_json::Value::Object(map)) => map.clone().into_iter().collect(),
        Some(_) => return Err(GraphyError::Variable("variables payload must be a JSON object".to_owned())),
    };

    let mut bound = HashMap::with_capacity(declarations.len());
    for (name, declaration) in declarations {
        let value = match supplied.get(name) {
            Some(json) => InputValue::from_json(json.clone()),
            None => InputValue::Null,
        };

        let value = if value.is_null() {
            match &declaration.default_value {
                Some(default) => default.item.clone(),
                None if declaration.var_type.item.is_non_null() => {
                    return Err(GraphyError::Variable(format!("missing value for required variable `${name}`")));
                }
                None => InputValue::Null,
            }
        } else {
            value
        };

        check_against_type(&value, &declaration.var_type.item, schema)
            .map_err(|reason| GraphyError::Variable(format!("variable `${name}`: {reason}")))?;

        bound.insert(name.clone(), value);
    }

    Ok(bound)
}

fn check_against_type(value: &InputValue, var_type: &Type, schema: &SchemaType) -> Result<(), String> {
    match var_type {
        Type::NonNullNamed(name) => {
            if value.is_null() {
                Err("value is required".to_owned())
            } else {
                check_named(value, name, schema)
            }
        }
        Type::Named(name) => {
            if value.is_null() {
                Ok(())
            } else {
                check_named(value, name, schema)
            }
        }
        Type::NonNullList(inner) => {
            if value.is_null() {
                Err("value is required".to_owned())
            } else {
                check_list(value, inner, schema)
            }
        }
        Type::List(inner) => {
            if value.is_null() {
                Ok(())
            } else {
                check_list(value, inner, schema)
            }
        }
    }
}

fn check_list(value: &InputValue, inner: &Type, schema: &SchemaType) -> Result<(), String> {
    match value {
        InputValue::List(items) => {
            for item in items {
                check_against_type(&item.item, inner, schema)?;
            }
            Ok(())
        }
        _ => Err("expected a list".to_owned()),
    }
}

fn check_named(value: &InputValue, name: &str, schema: &SchemaType) -> Result<(), String> {
    let meta = schema.concrete_type_by_name(name).ok_or_else(|| format!("unknown type `{name}`"))?;
    match meta.input_value_parse_fn() {
        Some(parse_fn) if parse_fn(value) => Ok(()),
        Some(_) => Err(format!("value is not a valid `{name}`")),
        None => Err(format!("`{name}` is not an input type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Spanning;
    use crate::schema::registry::TypeRegistry;

    fn schema() -> SchemaType {
        SchemaType::build(TypeRegistry::new(), vec![], vec![], vec![], false)
    }

    fn decl(name: &str, var_type: Type, default: Option<InputValue>) -> (String, VariableDefinition) {
        (
            name.to_owned(),
            VariableDefinition { var_type: Spanning::unlocated(var_type), default_value: default.map(Spanning::unlocated) },
        )
    }

    #[test]
    fn fills_in_default_when_absent() {
        let schema = schema();
        let decls = vec![decl("limit", Type::Named("Int".to_owned()), Some(InputValue::Int(10)))];
        let bound = bind_variables(None, 0, &decls, &schema, &MemoryLimits::default()).unwrap();
        assert_eq!(bound["limit"], InputValue::Int(10));
    }

    #[test]
    fn rejects_missing_required_variable() {
        let schema = schema();
        let decls = vec![decl("id", Type::NonNullNamed("ID".to_owned()), None)];
        assert!(bind_variables(None, 0, &decls, &schema, &MemoryLimits::default()).is_err());
    }

    #[test]
    fn enforces_payload_size_limit() {
        let schema = schema();
        let limits = MemoryLimits { max_variable_size: 4, ..MemoryLimits::default() };
        assert!(bind_variables(None, 100, &[], &schema, &limits).is_err());
    }
}
