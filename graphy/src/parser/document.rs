//! Parses a full GraphQL request document into an [`ast::Document`].

use crate::ast::{
    Arguments, Definition, Directive, Document, Field, Fragment, FragmentSpread, InlineFragment,
    InputValue, Operation, OperationType, Selection, Type, VariableDefinition, VariableDefinitions,
};
use crate::parser::lexer::Token;
use crate::parser::parser::{OptionParseResult, ParseError, ParseResult, Parser, UnlocatedParseResult};
use crate::parser::value::parse_value_literal;
use crate::position::Spanning;

pub fn parse_document_source(source: &str) -> UnlocatedParseResult<Document> {
    let mut parser = Parser::new(source)?;
    parse_document(&mut parser)
}

fn parse_document<'a>(parser: &mut Parser<'a>) -> UnlocatedParseResult<Document> {
    let mut defs = Vec::new();
    loop {
        defs.push(parse_definition(parser)?);
        if parser.peek().item == Token::EndOfFile {
            return Ok(defs);
        }
    }
}

fn parse_definition<'a>(parser: &mut Parser<'a>) -> UnlocatedParseResult<Definition> {
    match parser.peek().item.clone() {
        Token::CurlyOpen => Ok(Definition::Operation(parse_operation_definition(parser)?)),
        Token::Name(n) if matches!(n.as_str(), "query" | "mutation" | "subscription") => {
            Ok(Definition::Operation(parse_operation_definition(parser)?))
        }
        Token::Name(n) if n == "fragment" => Ok(Definition::Fragment(parse_fragment_definition(parser)?)),
        _ => Err(parser.next().map(ParseError::UnexpectedToken)),
    }
}

fn parse_operation_definition<'a>(parser: &mut Parser<'a>) -> ParseResult<Operation> {
    if parser.peek().item == Token::CurlyOpen {
        let selection_set = parse_selection_set(parser)?;
        return Ok(Spanning::start_end(
            &selection_set.start,
            &selection_set.end,
            Operation {
                operation_type: OperationType::Query,
                name: None,
                variable_definitions: None,
                directives: None,
                selection_set: selection_set.item,
            },
        ));
    }

    let start_pos = parser.peek().start.clone();
    let operation_type = parse_operation_type(parser)?;
    let name = match parser.peek().item {
        Token::Name(_) => Some(parser.expect_name()?),
        _ => None,
    };
    let variable_definitions = parse_variable_definitions(parser)?;
    let directives = parse_directives(parser)?;
    let selection_set = parse_selection_set(parser)?;

    Ok(Spanning::start_end(
        &start_pos,
        &selection_set.end,
        Operation {
            operation_type: operation_type.item,
            name,
            variable_definitions,
            directives: directives.map(|s| s.item),
            selection_set: selection_set.item,
        },
    ))
}

fn parse_fragment_definition<'a>(parser: &mut Parser<'a>) -> ParseResult<Fragment> {
    let Spanning { start: start_pos, .. } = parser.expect(&Token::Name("fragment".into()))?;
    let name = parser.expect_name()?;
    if name.item == "on" {
        return Err(name.map(|_| ParseError::UnexpectedToken(Token::Name("on".into()))));
    }

    parser.expect(&Token::Name("on".into()))?;
    let type_cond = parser.expect_name()?;
    let directives = parse_directives(parser)?;
    let selection_set = parse_selection_set(parser)?;

    Ok(Spanning::start_end(
        &start_pos,
        &selection_set.end,
        Fragment {
            name,
            type_condition: type_cond,
            directives: directives.map(|s| s.item),
            selection_set: selection_set.item,
        },
    ))
}

fn parse_optional_selection_set<'a>(parser: &mut Parser<'a>) -> OptionParseResult<Vec<Selection>> {
    if parser.peek().item == Token::CurlyOpen {
        Ok(Some(parse_selection_set(parser)?))
    } else {
        Ok(None)
    }
}

fn parse_selection_set<'a>(parser: &mut Parser<'a>) -> ParseResult<Vec<Selection>> {
    parser.delimited_nonempty_list(&Token::CurlyOpen, parse_selection_spanned, &Token::CurlyClose)
        .map(|s| s.map(|items| items.into_iter().map(|s| s.item).collect()))
}

fn parse_selection_spanned<'a>(parser: &mut Parser<'a>) -> ParseResult<Selection> {
    let sel = parse_selection(parser)?;
    let span = selection_span(&sel);
    Ok(Spanning::start_end(&span.0, &span.1, sel))
}

fn selection_span(sel: &Selection) -> (crate::position::SourcePosition, crate::position::SourcePosition) {
    match sel {
        Selection::Field(s) => (s.start.clone(), s.end.clone()),
        Selection::FragmentSpread(s) => (s.start.clone(), s.end.clone()),
        Selection::InlineFragment(s) => (s.start.clone(), s.end.clone()),
    }
}

fn parse_selection<'a>(parser: &mut Parser<'a>) -> UnlocatedParseResult<Selection> {
    match parser.peek().item {
        Token::Ellipsis => parse_fragment(parser),
        _ => parse_field(parser).map(Selection::Field),
    }
}

fn parse_fragment<'a>(parser: &mut Parser<'a>) -> UnlocatedParseResult<Selection> {
    let Spanning { start: start_pos, .. } = parser.expect(&Token::Ellipsis)?;

    match parser.peek().item.clone() {
        Token::Name(n) if n == "on" => {
            parser.next();
            let name = parser.expect_name()?;
            let directives = parse_directives(parser)?;
            let selection_set = parse_selection_set(parser)?;

            Ok(Selection::InlineFragment(Spanning::start_end(
                &start_pos,
                &selection_set.end,
                InlineFragment {
                    type_condition: Some(name),
                    directives: directives.map(|s| s.item),
                    selection_set: selection_set.item,
                },
            )))
        }
        Token::CurlyOpen => {
            let selection_set = parse_selection_set(parser)?;

            Ok(Selection::InlineFragment(Spanning::start_end(
                &start_pos,
                &selection_set.end,
                InlineFragment {
                    type_condition: None,
                    directives: None,
                    selection_set: selection_set.item,
                },
            )))
        }
        Token::Name(_) => {
            let frag_name = parser.expect_name()?;
            let directives = parse_directives(parser)?;
            let end = directives.as_ref().map_or(&frag_name.end, |s| &s.end).clone();

            Ok(Selection::FragmentSpread(Spanning::start_end(
                &start_pos,
                &end,
                FragmentSpread { name: frag_name, directives: directives.map(|s| s.item) },
            )))
        }
        Token::At => {
            let directives = parse_directives(parser)?;
            let selection_set = parse_selection_set(parser)?;

            Ok(Selection::InlineFragment(Spanning::start_end(
                &start_pos,
                &selection_set.end,
                InlineFragment {
                    type_condition: None,
                    directives: directives.map(|s| s.item),
                    selection_set: selection_set.item,
                },
            )))
        }
        _ => Err(parser.next().map(ParseError::UnexpectedToken)),
    }
}

fn parse_field<'a>(parser: &mut Parser<'a>) -> ParseResult<Field> {
    let mut alias = Some(parser.expect_name()?);

    let name = if parser.skip(&Token::Colon)?.is_some() {
        parser.expect_name()?
    } else {
        alias.take().unwrap()
    };

    let arguments = parse_arguments(parser)?;
    let directives = parse_directives(parser)?;
    let selection_set = parse_optional_selection_set(parser)?;

    let start = alias.as_ref().unwrap_or(&name).start.clone();
    let end = selection_set
        .as_ref()
        .map(|s| s.end.clone())
        .or_else(|| directives.as_ref().map(|s| s.end.clone()))
        .or_else(|| arguments.as_ref().map(|s| s.end.clone()))
        .unwrap_or_else(|| name.end.clone());

    Ok(Spanning::start_end(
        &start,
        &end,
        Field {
            alias,
            name,
            arguments,
            directives: directives.map(|s| s.item),
            selection_set: selection_set.map(|s| s.item),
        },
    ))
}

fn parse_arguments<'a>(parser: &mut Parser<'a>) -> OptionParseResult<Arguments> {
    if parser.peek().item != Token::ParenOpen {
        Ok(None)
    } else {
        let args = parser.delimited_nonempty_list(&Token::ParenOpen, parse_argument, &Token::ParenClose)?;
        Ok(Some(args.map(|items| Arguments { items })))
    }
}

fn parse_argument<'a>(parser: &mut Parser<'a>) -> ParseResult<(Spanning<String>, Spanning<InputValue>)> {
    let name = parser.expect_name()?;
    parser.expect(&Token::Colon)?;
    let value = parse_value_literal(parser, false)?;

    Ok(Spanning::start_end(&name.start.clone(), &value.end.clone(), (name, value)))
}

fn parse_operation_type<'a>(parser: &mut Parser<'a>) -> ParseResult<OperationType> {
    match parser.peek().item.clone() {
        Token::Name(n) if n == "query" => Ok(parser.next().map(|_| OperationType::Query)),
        Token::Name(n) if n == "mutation" => Ok(parser.next().map(|_| OperationType::Mutation)),
        Token::Name(n) if n == "subscription" => Ok(parser.next().map(|_| OperationType::Subscription)),
        _ => Err(parser.next().map(ParseError::UnexpectedToken)),
    }
}

fn parse_variable_definitions<'a>(parser: &mut Parser<'a>) -> OptionParseResult<VariableDefinitions> {
    if parser.peek().item != Token::ParenOpen {
        Ok(None)
    } else {
        let defs = parser.delimited_nonempty_list(&Token::ParenOpen, parse_variable_definition, &Token::ParenClose)?;
        Ok(Some(defs.map(|items| VariableDefinitions { items })))
    }
}

fn parse_variable_definition<'a>(
    parser: &mut Parser<'a>,
) -> ParseResult<(Spanning<String>, VariableDefinition)> {
    let Spanning { start: start_pos, .. } = parser.expect(&Token::Dollar)?;
    let var_name = parser.expect_name()?;
    parser.expect(&Token::Colon)?;
    let var_type = parse_type(parser)?;

    let default_value = if parser.skip(&Token::Equals)?.is_some() {
        Some(parse_value_literal(parser, true)?)
    } else {
        None
    };

    let end = default_value.as_ref().map_or(&var_type.end, |s| &s.end).clone();

    Ok(Spanning::start_end(
        &start_pos,
        &end,
        (
            Spanning::start_end(&start_pos, &var_name.end, var_name.item),
            VariableDefinition { var_type, default_value },
        ),
    ))
}

fn parse_directives<'a>(parser: &mut Parser<'a>) -> OptionParseResult<Vec<Spanning<Directive>>> {
    if parser.peek().item != Token::At {
        Ok(None)
    } else {
        let mut items = Vec::new();
        while parser.peek().item == Token::At {
            items.push(parse_directive(parser)?);
        }
        Ok(Spanning::spanning(items))
    }
}

fn parse_directive<'a>(parser: &mut Parser<'a>) -> ParseResult<Directive> {
    let Spanning { start: start_pos, .. } = parser.expect(&Token::At)?;
    let name = parser.expect_name()?;
    let arguments = parse_arguments(parser)?;

    let end = arguments.as_ref().map_or(&name.end, |s| &s.end).clone();

    Ok(Spanning::start_end(&start_pos, &end, Directive { name, arguments }))
}

pub fn parse_type<'a>(parser: &mut Parser<'a>) -> ParseResult<Type> {
    let parsed_type = if let Some(Spanning { start: start_pos, .. }) = parser.skip(&Token::BracketOpen)? {
        let inner_type = parse_type(parser)?;
        let Spanning { end: end_pos, .. } = parser.expect(&Token::BracketClose)?;
        Spanning::start_end(&start_pos, &end_pos, Type::List(Box::new(inner_type.item)))
    } else {
        parser.expect_name()?.map(Type::Named)
    };

    if parser.peek().item == Token::ExclamationMark {
        wrap_non_null(parser, parsed_type)
    } else {
        Ok(parsed_type)
    }
}

fn wrap_non_null<'a>(parser: &mut Parser<'a>, inner: Spanning<Type>) -> ParseResult<Type> {
    let Spanning { end: end_pos, .. } = parser.expect(&Token::ExclamationMark)?;

    let wrapped = match inner.item {
        Type::Named(name) => Type::NonNullNamed(name),
        Type::List(l) => Type::NonNullList(l),
        t => t,
    };

    Ok(Spanning::start_end(&inner.start, &end_pos, wrapped))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_anonymous_query() {
        let doc = parse_document_source("{ hero { name } }").unwrap();
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn parses_named_mutation_with_variables() {
        let doc = parse_document_source(
            "mutation CreateHero($name: String!) { createHero(name: $name) { id } }",
        )
        .unwrap();
        match &doc[0] {
            Definition::Operation(op) => {
                assert_eq!(op.item.operation_type, OperationType::Mutation);
                assert_eq!(op.item.name.as_ref().unwrap().item, "CreateHero");
            }
            _ => panic!("expected operation"),
        }
    }

    #[test]
    fn parses_fragment_and_inline_fragment() {
        let doc = parse_document_source(
            "{ hero { ...Fields ... on Droid { primaryFunction } } } fragment Fields on Hero { name }",
        )
        .unwrap();
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn rejects_malformed_document() {
        assert!(parse_document_source("{ hero { ").is_err());
    }
}
