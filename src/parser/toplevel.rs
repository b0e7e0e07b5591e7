use crate::{
    ast::ast::{Function, Prototype},
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::TokenSource, tokens::TokenKind},
};

use super::{expr::parse_expr, parser::Parser};

/// prototype ::= identifier `(` identifier* `)`
///
/// Parameters are separated by whitespace only.
pub fn parse_prototype<S: TokenSource>(parser: &mut Parser<S>) -> Result<Prototype, Error> {
    let name = parser.expect_identifier("expected function name in prototype")?;
    parser.expect_operator('(', "expected `(` in prototype")?;

    let mut params: Vec<String> = vec![];

    while parser.current_token_kind() == TokenKind::Identifier {
        let param = parser.current_token().text().to_string();

        if params.contains(&param) {
            return Err(Error::new(
                ErrorImpl::DuplicateParameter {
                    parameter: param,
                    function: name,
                },
                parser.get_position(),
            ));
        }

        parser.advance();
        params.push(param);
    }

    parser.expect_operator(')', "expected `)` in prototype")?;

    Ok(Prototype { name, params })
}

/// definition ::= `def` prototype expression
pub fn parse_definition<S: TokenSource>(parser: &mut Parser<S>) -> Result<Function, Error> {
    parser.advance();

    let proto = parse_prototype(parser)?;
    let body = parse_expr(parser)?;

    Ok(Function::new(proto, body))
}

/// external ::= `extern` prototype
pub fn parse_extern<S: TokenSource>(parser: &mut Parser<S>) -> Result<Prototype, Error> {
    parser.advance();
    parse_prototype(parser)
}

/// A bare expression, wrapped in a parameterless anonymous routine.
pub fn parse_top_level_expr<S: TokenSource>(parser: &mut Parser<S>) -> Result<Function, Error> {
    let body = parse_expr(parser)?;
    Ok(Function::anonymous(body))
}
