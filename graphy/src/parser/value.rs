//! Parses GraphQL value literals into [`InputValue`] trees.

use crate::ast::InputValue;
use crate::parser::lexer::Token;
use crate::parser::parser::{ParseResult, Parser};
use crate::position::Spanning;

pub fn parse_value_literal<'a>(
    parser: &mut Parser<'a>,
    is_const: bool,
) -> ParseResult<InputValue> {
    match parser.peek().item.clone() {
        Token::BracketOpen => parse_list_literal(parser, is_const),
        Token::CurlyOpen => parse_object_literal(parser, is_const),
        Token::Dollar if !is_const => {
            let Spanning { start, .. } = parser.expect(&Token::Dollar)?;
            let name = parser.expect_name()?;
            Ok(Spanning::start_end(&start, &name.end, InputValue::Variable(name.item)))
        }
        Token::Int(i) => Ok(parser.next().map(|_| InputValue::Int(i))),
        Token::Float(f) => Ok(parser.next().map(|_| InputValue::Float(f))),
        Token::String(s) => Ok(parser.next().map(|_| InputValue::String(s))),
        Token::Name(ref n) if n == "true" => Ok(parser.next().map(|_| InputValue::Boolean(true))),
        Token::Name(ref n) if n == "false" => Ok(parser.next().map(|_| InputValue::Boolean(false))),
        Token::Name(ref n) if n == "null" => Ok(parser.next().map(|_| InputValue::Null)),
        Token::Name(n) => Ok(parser.next().map(|_| InputValue::Enum(n))),
        _ => {
            let found = parser.next();
            Err(found.map(crate::parser::parser::ParseError::UnexpectedToken))
        }
    }
}

fn parse_list_literal<'a>(parser: &mut Parser<'a>, is_const: bool) -> ParseResult<InputValue> {
    let items = parser.delimited_nonempty_list_or_empty(
        &Token::BracketOpen,
        |p| parse_value_literal(p, is_const),
        &Token::BracketClose,
    )?;
    Ok(items.map(InputValue::List))
}

fn parse_object_literal<'a>(parser: &mut Parser<'a>, is_const: bool) -> ParseResult<InputValue> {
    let Spanning { start, .. } = parser.expect(&Token::CurlyOpen)?;
    let mut fields = Vec::new();
    while parser.peek().item != Token::CurlyClose {
        let name = parser.expect_name()?;
        parser.expect(&Token::Colon)?;
        let value = parse_value_literal(parser, is_const)?;
        fields.push((name, value));
    }
    let Spanning { end, .. } = parser.expect(&Token::CurlyClose)?;
    Ok(Spanning::start_end(&start, &end, InputValue::Object(fields)))
}
