//! Validator & Planner: turns a parsed [`Document`] plus a [`SchemaType`]
//! into a [`RequestPlan`] the executor can walk directly, with fragment
//! spreads and inline fragments already expanded and same-alias selections
//! already merged.
//!
//! Field-by-field type checking happens here, not in the executor: by the
//! time a [`PlanField`] exists, its target [`Field`] descriptor is known to
//! exist on its parent type and its arguments are known to reference only
//! declared variables.

use std::collections::HashMap;

use crate::ast::{
    Definition, Directive, Document, Field as AstField, Fragment, InlineFragment, InputValue, OperationType, Selection,
    Type, VariableDefinition,
};
use crate::error::{ErrorLocation, GraphyError};
use crate::position::Spanning;
use crate::schema::meta::MetaType;
use crate::schema::model::SchemaType;

/// One root operation extracted from a document, with its selection set
/// already expanded and merged.
pub struct OperationPlan {
    pub operation_type: OperationType,
    pub name: Option<String>,
    pub variable_definitions: Vec<(String, VariableDefinition)>,
    pub selection: Vec<PlanField>,
}

/// A single field to resolve, with any directly-nested field flattened in
/// (fragment spreads and inline fragments never survive planning as their
/// own node; their children are merged into their containing selection).
#[derive(Clone, Debug)]
pub struct PlanField {
    pub response_key: String,
    pub field_name: String,
    pub location: ErrorLocation,
    pub arguments: Vec<(String, Spanning<InputValue>)>,
    /// The field's declared return type, used by the executor to decide
    /// null-propagation and whether a result is a list.
    pub field_type: Type,
    pub children: Vec<PlanField>,
    /// Only present when this field came from a fragment spread or inline
    /// fragment on an abstract (interface/union) type: the field should only
    /// be applied to the concrete objects named here.
    pub type_condition: Option<String>,
    pub skip_include: SkipInclude,
}

/// The runtime-evaluated form of `@skip`/`@include`. Literal conditions are
/// folded away at plan time; a condition behind a variable is carried
/// forward and checked once variables are bound.
#[derive(Clone, Debug, Default)]
pub enum SkipInclude {
    #[default]
    Always,
    Never,
    IfVariableTruthy(String),
    UnlessVariableTruthy(String),
}

impl SkipInclude {
    pub fn resolve(&self, variables: &HashMap<String, InputValue>) -> bool {
        let truthy = |name: &str| matches!(variables.get(name), Some(InputValue::Boolean(true)));
        match self {
            SkipInclude::Always => true,
            SkipInclude::Never => false,
            SkipInclude::IfVariableTruthy(name) => truthy(name),
            SkipInclude::UnlessVariableTruthy(name) => !truthy(name),
        }
    }
}

struct PlanningContext<'a> {
    schema: &'a SchemaType,
    fragments: &'a HashMap<String, &'a Fragment>,
    declared_variables: &'a HashMap<String, VariableDefinition>,
    errors: Vec<GraphyError>,
}

/// Validate `document` against `schema` and, if it passes, produce the
/// executable plan for every operation it defines.
pub fn validate_and_plan(document: &Document, schema: &SchemaType) -> Result<HashMap<String, OperationPlan>, Vec<GraphyError>> {
    let mut fragments = HashMap::new();
    let mut operations = Vec::new();

    for definition in document {
        match definition {
            Definition::Fragment(Spanning { item, .. }) => {
                if fragments.insert(item.name.item.clone(), item).is_some() {
                    return Err(vec![GraphyError::validation(format!(
                        "duplicate fragment definition `{}`",
                        item.name.item
                    ))]);
                }
            }
            Definition::Operation(op) => operations.push(op),
        }
    }

    if operations.is_empty() {
        return Err(vec![GraphyError::validation("document defines no operations")]);
    }

    let mut plans = HashMap::new();
    let mut errors = Vec::new();

    for Spanning { item: operation, .. } in &operations {
        let key = operation.name.as_ref().map(|n| n.item.clone()).unwrap_or_default();
        if plans.contains_key(&key) {
            errors.push(GraphyError::validation(if key.is_empty() {
                "multiple anonymous operations in one document".to_owned()
            } else {
                format!("duplicate operation name `{key}`")
            }));
            continue;
        }

        let root_type = match operation.operation_type {
            OperationType::Query => schema.concrete_query_type(),
            OperationType::Mutation => match schema.concrete_mutation_type() {
                Some(t) => t,
                None => {
                    errors.push(GraphyError::validation("schema defines no mutation type"));
                    continue;
                }
            },
            OperationType::Subscription => match schema.concrete_subscription_type() {
                Some(t) => t,
                None => {
                    errors.push(GraphyError::validation("schema defines no subscription type"));
                    continue;
                }
            },
        };

        let declared_variables: HashMap<String, VariableDefinition> = operation
            .variable_definitions
            .as_ref()
            .map(|Spanning { item, .. }| item.items.iter().map(|(n, d)| (n.item.clone(), d.clone())).collect())
            .unwrap_or_default();

        let mut ctx = PlanningContext { schema, fragments: &fragments, declared_variables: &declared_variables, errors: Vec::new() };
        let selection = ctx.plan_selection_set(&operation.selection_set, root_type, None);
        errors.append(&mut ctx.errors);

        if operation.operation_type == OperationType::Subscription && selection.len() != 1 {
            errors.push(GraphyError::validation("subscription operations must select exactly one field"));
        }

        plans.insert(
            key.clone(),
            OperationPlan {
                operation_type: operation.operation_type,
                name: operation.name.as_ref().map(|n| n.item.clone()),
                variable_definitions: declared_variables.into_iter().collect(),
                selection,
            },
        );
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(plans)
}

impl<'a> PlanningContext<'a> {
    fn plan_selection_set(&mut self, selection_set: &[Selection], parent_type: &MetaType, type_condition: Option<&str>) -> Vec<PlanField> {
        let mut out: Vec<PlanField> = Vec::new();
        for selection in selection_set {
            match selection {
                Selection::Field(spanned) => {
                    if let Some(field) = self.plan_field(&spanned.item, parent_type, type_condition.map(str::to_owned)) {
                        merge_into(&mut self.errors, &mut out, field);
                    }
                }
                Selection::FragmentSpread(spanned) => {
                    let fragment_name = &spanned.item.name.item;
                    let Some(fragment) = self.fragments.get(fragment_name).copied() else {
                        self.errors.push(GraphyError::validation(format!("undefined fragment `{fragment_name}`")));
                        continue;
                    };
                    let Some(fragment_type) = self.schema.concrete_type_by_name(&fragment.type_condition.item) else {
                        self.errors.push(GraphyError::validation(format!(
                            "fragment `{fragment_name}` targets unknown type `{}`",
                            fragment.type_condition.item
                        )));
                        continue;
                    };
                    if !self.schema.type_overlap(parent_type, fragment_type) {
                        self.errors.push(GraphyError::validation(format!(
                            "fragment `{fragment_name}` cannot apply to type `{}`",
                            parent_type.name().unwrap_or("?")
                        )));
                        continue;
                    }
                    let skip_include = directive_condition(spanned.item.directives.as_deref());
                    let branch_condition = branch_type_condition(parent_type, fragment_type);
                    for mut field in self.plan_selection_set(&fragment.selection_set, fragment_type, branch_condition.as_deref()) {
                        field.skip_include = combine(field.skip_include, skip_include.clone());
                        merge_into(&mut self.errors, &mut out, field);
                    }
                }
                Selection::InlineFragment(spanned) => {
                    let InlineFragment { type_condition: cond, directives, selection_set } = &spanned.item;
                    let branch_type = match cond {
                        Some(name) => match self.schema.concrete_type_by_name(&name.item) {
                            Some(t) => t,
                            None => {
                                self.errors.push(GraphyError::validation(format!("inline fragment targets unknown type `{}`", name.item)));
                                continue;
                            }
                        },
                        None => parent_type,
                    };
                    if !self.schema.type_overlap(parent_type, branch_type) {
                        self.errors.push(GraphyError::validation("inline fragment cannot apply to this type"));
                        continue;
                    }
                    let skip_include = directive_condition(directives.as_deref());
                    let branch_condition = branch_type_condition(parent_type, branch_type);
                    for mut field in self.plan_selection_set(selection_set, branch_type, branch_condition.as_deref()) {
                        field.skip_include = combine(field.skip_include, skip_include.clone());
                        merge_into(&mut self.errors, &mut out, field);
                    }
                }
            }
        }
        out
    }

    fn plan_field(&mut self, field: &AstField, parent_type: &MetaType, type_condition: Option<String>) -> Option<PlanField> {
        let location = ErrorLocation::from(&field.name.start);
        let field_name = field.name.item.as_str();

        if field_name == "__typename" {
            return Some(PlanField {
                response_key: field.response_key().to_owned(),
                field_name: "__typename".to_owned(),
                location,
                arguments: Vec::new(),
                field_type: Type::NonNullNamed("String".to_owned()),
                children: Vec::new(),
                type_condition,
                skip_include: directive_condition(field.directives.as_deref()),
            });
        }

        let descriptor = parent_type.field_by_name(field_name);
        let Some(descriptor) = descriptor else {
            self.errors.push(GraphyError::validation_at(
                format!("field `{field_name}` does not exist on type `{}`", parent_type.name().unwrap_or("?")),
                location.clone(),
            ));
            return None;
        };

        let mut arguments = Vec::new();
        if let Some(Spanning { item: args, .. }) = &field.arguments {
            for (name, value) in args.iter() {
                if descriptor.arguments.iter().all(|a| a.name != name.item) {
                    self.errors.push(GraphyError::validation_at(
                        format!("unknown argument `{}` on field `{field_name}`", name.item),
                        location.clone(),
                    ));
                    continue;
                }
                for var in value.item.referenced_variables() {
                    if !self.declared_variables.contains_key(var) {
                        self.errors.push(GraphyError::validation_at(format!("undeclared variable `${var}`"), location.clone()));
                    }
                }
                arguments.push((name.item.clone(), value.clone()));
            }
        }
        for argument in &descriptor.arguments {
            if argument.arg_type.is_non_null()
                && argument.default_value.is_none()
                && arguments.iter().all(|(n, _)| n != &argument.name)
            {
                self.errors.push(GraphyError::validation_at(
                    format!("missing required argument `{}` on field `{field_name}`", argument.name),
                    location.clone(),
                ));
            }
        }

        let field_type = self.schema.make_type(&descriptor.field_type);
        let children = match (&field.selection_set, field_type.to_concrete()) {
            (Some(sub), Some(concrete)) if concrete.is_composite() => self.plan_selection_set(sub, concrete, None),
            (Some(_), _) => {
                self.errors.push(GraphyError::validation_at(format!("field `{field_name}` does not take a selection set"), location.clone()));
                Vec::new()
            }
            (None, Some(concrete)) if concrete.is_composite() => {
                self.errors.push(GraphyError::validation_at(format!("field `{field_name}` requires a selection set"), location.clone()));
                Vec::new()
            }
            (None, _) => Vec::new(),
        };

        Some(PlanField {
            response_key: field.response_key().to_owned(),
            field_name: field_name.to_owned(),
            location,
            arguments,
            field_type: descriptor.field_type.clone(),
            children,
            type_condition,
            skip_include: directive_condition(field.directives.as_deref()),
        })
    }
}

/// An interface/union branch only needs a runtime type guard when the
/// fragment narrows to something more specific than the parent already
/// guarantees.
fn branch_type_condition(parent_type: &MetaType, branch_type: &MetaType) -> Option<String> {
    if std::ptr::eq(parent_type, branch_type) || !branch_type.is_abstract() && !parent_type.is_abstract() {
        return None;
    }
    branch_type.name().filter(|_| !branch_type.is_abstract()).map(str::to_owned)
}

fn directive_condition(directives: Option<&[Spanning<Directive>]>) -> SkipInclude {
    let Some(directives) = directives else { return SkipInclude::Always };
    for d in directives {
        let Some(arg) = d
            .item
            .arguments
            .as_ref()
            .and_then(|a| a.item.get("if"))
        else {
            continue;
        };
        let negate = match d.item.name.item.as_str() {
            "skip" => true,
            "include" => false,
            _ => continue,
        };
        return match &arg.item {
            InputValue::Boolean(true) => if negate { SkipInclude::Never } else { SkipInclude::Always },
            InputValue::Boolean(false) => if negate { SkipInclude::Always } else { SkipInclude::Never },
            InputValue::Variable(name) => {
                if negate {
                    SkipInclude::UnlessVariableTruthy(name.clone())
                } else {
                    SkipInclude::IfVariableTruthy(name.clone())
                }
            }
            _ => SkipInclude::Always,
        };
    }
    SkipInclude::Always
}

fn combine(inner: SkipInclude, outer: SkipInclude) -> SkipInclude {
    match (inner, outer) {
        (SkipInclude::Always, other) | (other, SkipInclude::Always) => other,
        (SkipInclude::Never, _) | (_, SkipInclude::Never) => SkipInclude::Never,
        (a, _) => a,
    }
}

/// Merge a newly-planned field into `out`, combining children with any
/// existing entry that shares the same response key and type condition (the
/// GraphQL field-merging rule for fragments). Two selections sharing a
/// response key but naming different fields, or the same field with
/// incompatible arguments, can never both legally occupy that key in the
/// response and are rejected instead of silently shadowing one another.
fn merge_into(errors: &mut Vec<GraphyError>, out: &mut Vec<PlanField>, field: PlanField) {
    if let Some(existing) = out.iter_mut().find(|f| f.response_key == field.response_key && f.type_condition == field.type_condition) {
        if existing.field_name != field.field_name {
            errors.push(GraphyError::validation_at(
                format!(
                    "fields `{}` and `{}` cannot be merged under the response key `{}`: they do not refer to the same field",
                    existing.field_name, field.field_name, field.response_key
                ),
                field.location,
            ));
            return;
        }
        if !arguments_equivalent(&existing.arguments, &field.arguments) {
            errors.push(GraphyError::validation_at(
                format!("field `{}` is selected twice under the response key `{}` with different arguments", field.field_name, field.response_key),
                field.location,
            ));
            return;
        }
        for child in field.children {
            merge_into(errors, &mut existing.children, child);
        }
    } else {
        out.push(field);
    }
}

/// Order-independent comparison of two argument lists, used by [`merge_into`]
/// to decide whether two selections of the same field under the same
/// response key agree closely enough to be treated as one.
fn arguments_equivalent(a: &[(String, Spanning<InputValue>)], b: &[(String, Spanning<InputValue>)]) -> bool {
    a.len() == b.len() && a.iter().all(|(name, value)| b.iter().any(|(n, v)| n == name && v.item == value.item))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document_source;
    use crate::schema::meta::{Field as MetaField, ObjectMeta};
    use crate::schema::registry::TypeRegistry;

    fn parse_document(source: &str) -> Result<Document, ()> {
        parse_document_source(source).map_err(|_| ())
    }

    fn test_schema() -> SchemaType {
        let mut registry = TypeRegistry::new();
        let echo_arg = registry.arg::<String>("value");
        SchemaType::build(
            registry,
            vec![
                MetaField { name: "hello".to_owned(), description: None, arguments: vec![], field_type: Type::NonNullNamed("String".to_owned()), deprecation_reason: None },
                MetaField { name: "echo".to_owned(), description: None, arguments: vec![echo_arg], field_type: Type::NonNullNamed("String".to_owned()), deprecation_reason: None },
            ],
            vec![],
            vec![],
            false,
        )
    }

    #[test]
    fn plans_simple_query() {
        let schema = test_schema();
        let document = parse_document("{ hello }").unwrap();
        let plans = validate_and_plan(&document, &schema).unwrap();
        let plan = &plans[""];
        assert_eq!(plan.selection.len(), 1);
        assert_eq!(plan.selection[0].field_name, "hello");
    }

    #[test]
    fn rejects_unknown_field() {
        let schema = test_schema();
        let document = parse_document("{ nope }").unwrap();
        assert!(validate_and_plan(&document, &schema).is_err());
    }

    #[test]
    fn merges_duplicate_aliases() {
        let schema = test_schema();
        let document = parse_document("{ hello hello }").unwrap();
        let plans = validate_and_plan(&document, &schema).unwrap();
        assert_eq!(plans[""].selection.len(), 1);
    }

    #[test]
    fn rejects_same_alias_on_different_fields() {
        let schema = test_schema();
        let document = parse_document(r#"{ same: hello same: echo(value: "x") }"#).unwrap();
        assert!(validate_and_plan(&document, &schema).is_err());
    }

    #[test]
    fn rejects_same_field_with_different_arguments() {
        let schema = test_schema();
        let document = parse_document(r#"{ echo(value: "a") echo(value: "b") }"#).unwrap();
        assert!(validate_and_plan(&document, &schema).is_err());
    }

    #[test]
    fn merges_same_field_with_identical_arguments() {
        let schema = test_schema();
        let document = parse_document(r#"{ echo(value: "a") echo(value: "a") }"#).unwrap();
        let plans = validate_and_plan(&document, &schema).unwrap();
        assert_eq!(plans[""].selection.len(), 1);
    }

    #[allow(dead_code)]
    fn unused(_: &ObjectMeta) {}
}
