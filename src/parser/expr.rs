use crate::{
    ast::ast::Expr,
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::TokenSource, tokens::TokenKind},
};

use super::parser::Parser;

/// expression ::= primary binop_rhs
pub fn parse_expr<S: TokenSource>(parser: &mut Parser<S>) -> Result<Expr, Error> {
    let lhs = parse_primary_expr(parser)?;
    parse_binop_rhs(parser, 0, lhs)
}

/// Every nested expression passes through here, so this is where nesting
/// depth is bounded.
pub fn parse_primary_expr<S: TokenSource>(parser: &mut Parser<S>) -> Result<Expr, Error> {
    parser.enter_nesting()?;
    let primary = parse_primary_kind(parser);
    parser.leave_nesting();
    primary
}

fn parse_primary_kind<S: TokenSource>(parser: &mut Parser<S>) -> Result<Expr, Error> {
    match parser.current_token_kind() {
        TokenKind::Identifier => parse_identifier_expr(parser),
        TokenKind::Number => parse_number_expr(parser),
        TokenKind::If => parse_if_expr(parser),
        TokenKind::For => parse_for_expr(parser),
        TokenKind::Operator if parser.current_token().is_operator('(') => parse_paren_expr(parser),
        _ => Err(Error::new(
            ErrorImpl::ExpectedExpression {
                token: parser.current_token().to_string(),
            },
            parser.get_position(),
        )),
    }
}

/// binop_rhs ::= (operator primary)*
///
/// Folds operators of precedence at least `expr_precedence` onto `lhs`.
/// Equal precedence associates to the left; a tighter operator on the right
/// takes the current right operand with it first.
pub fn parse_binop_rhs<S: TokenSource>(
    parser: &mut Parser<S>,
    expr_precedence: i32,
    mut lhs: Expr,
) -> Result<Expr, Error> {
    loop {
        let (op, token_precedence) = match parser.token_precedence() {
            Some((op, precedence)) if precedence >= expr_precedence => (op, precedence),
            _ => return Ok(lhs),
        };
        parser.advance();

        let mut rhs = parse_primary_expr(parser)?;

        if let Some((_, next_precedence)) = parser.token_precedence() {
            if token_precedence < next_precedence {
                rhs = parse_binop_rhs(parser, token_precedence + 1, rhs)?;
            }
        }

        lhs = Expr::binary(op, lhs, rhs);
    }
}

pub fn parse_number_expr<S: TokenSource>(parser: &mut Parser<S>) -> Result<Expr, Error> {
    let text = parser.current_token().text().to_string();

    match text.parse::<f64>() {
        Ok(value) => {
            parser.advance();
            Ok(Expr::number(value))
        }
        Err(_) => Err(Error::new(
            ErrorImpl::NumberParseError { token: text },
            parser.get_position(),
        )),
    }
}

/// `( expression )`
pub fn parse_paren_expr<S: TokenSource>(parser: &mut Parser<S>) -> Result<Expr, Error> {
    parser.advance();
    let expr = parse_expr(parser)?;
    parser.expect_operator(')', "expected `)`")?;

    Ok(expr)
}

/// A variable reference, or a call when followed by `(`.
///
/// Call arguments are separated by commas.
pub fn parse_identifier_expr<S: TokenSource>(parser: &mut Parser<S>) -> Result<Expr, Error> {
    let name = parser.advance().text().to_string();

    if !parser.current_token().is_operator('(') {
        return Ok(Expr::Variable(name));
    }
    parser.advance();

    let mut args = vec![];

    if !parser.current_token().is_operator(')') {
        loop {
            args.push(parse_expr(parser)?);

            if parser.current_token().is_operator(')') {
                break;
            }

            parser.expect_operator(',', "expected `)` or `,` in argument list")?;
        }
    }

    parser.advance();

    Ok(Expr::Call { callee: name, args })
}

/// `if cond then a else b`
pub fn parse_if_expr<S: TokenSource>(parser: &mut Parser<S>) -> Result<Expr, Error> {
    parser.advance();

    let condition = parse_expr(parser)?;
    parser.expect(TokenKind::Then, "expected `then`")?;
    let then_branch = parse_expr(parser)?;
    parser.expect(TokenKind::Else, "expected `else`")?;
    let else_branch = parse_expr(parser)?;

    Ok(Expr::conditional(condition, then_branch, else_branch))
}

/// `for x = start, end[, step] in body`
pub fn parse_for_expr<S: TokenSource>(parser: &mut Parser<S>) -> Result<Expr, Error> {
    parser.advance();

    let var = parser.expect_identifier("expected identifier after `for`")?;
    parser.expect_operator('=', "expected `=` after loop variable")?;
    let start = parse_expr(parser)?;
    parser.expect_operator(',', "expected `,` after loop start value")?;
    let end = parse_expr(parser)?;

    let step = if parser.current_token().is_operator(',') {
        parser.advance();
        Some(parse_expr(parser)?)
    } else {
        None
    };

    parser.expect(TokenKind::In, "expected `in` after loop header")?;
    let body = parse_expr(parser)?;

    Ok(Expr::for_loop(&var, start, end, step, body))
}
