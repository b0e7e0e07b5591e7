//! Unit tests for the lexer module.

use pretty_assertions::assert_eq;

use super::{
    lexer::{tokenize, Lexer, TokenBuffer, TokenSource},
    tokens::{Token, TokenKind},
};

#[test]
fn test_tokenize_prototype() {
    let tokens = tokenize("def my_func()", None);

    assert_eq!(
        tokens,
        vec![
            Token::new(TokenKind::Def, None),
            Token::identifier("my_func"),
            Token::operator('('),
            Token::operator(')'),
            Token::eof(),
        ]
    );
}

#[test]
fn test_tokenize_function() {
    let tokens = tokenize("def my_func(a, b)\n\r\ta + b", None);

    assert_eq!(
        tokens,
        vec![
            Token::new(TokenKind::Def, None),
            Token::identifier("my_func"),
            Token::operator('('),
            Token::identifier("a"),
            Token::operator(','),
            Token::identifier("b"),
            Token::operator(')'),
            Token::identifier("a"),
            Token::operator('+'),
            Token::identifier("b"),
            Token::eof(),
        ]
    );
}

#[test]
fn test_tokenize_keywords() {
    let tokens = tokenize("def extern if then else for in", None);
    let kinds: Vec<TokenKind> = tokens.iter().map(|token| token.kind).collect();

    assert_eq!(
        kinds,
        vec![
            TokenKind::Def,
            TokenKind::Extern,
            TokenKind::If,
            TokenKind::Then,
            TokenKind::Else,
            TokenKind::For,
            TokenKind::In,
            TokenKind::EOF,
        ]
    );
    assert!(tokens.iter().all(|token| token.value.is_none()));
}

#[test]
fn test_keyword_prefix_is_identifier() {
    let tokens = tokenize("define iffy in_range", None);

    assert_eq!(tokens[0], Token::identifier("define"));
    assert_eq!(tokens[1], Token::identifier("iffy"));
    assert_eq!(tokens[2], Token::identifier("in_range"));
}

#[test]
fn test_tokenize_numbers() {
    let tokens = tokenize("42 3.14 .5 1.2.3", None);

    assert_eq!(tokens[0], Token::number("42"));
    assert_eq!(tokens[1], Token::number("3.14"));
    assert_eq!(tokens[2], Token::number(".5"));
    // Kept verbatim; rejecting it is the parser's job.
    assert_eq!(tokens[3], Token::number("1.2.3"));
    assert_eq!(tokens[4].kind, TokenKind::EOF);
}

#[test]
fn test_comments_are_skipped() {
    let tokens = tokenize("# leading comment\nx # trailing\n# last", None);

    assert_eq!(tokens, vec![Token::identifier("x"), Token::eof()]);
}

#[test]
fn test_unknown_characters_become_operators() {
    let tokens = tokenize("a % b ; _", None);

    assert_eq!(tokens[1], Token::operator('%'));
    assert_eq!(tokens[3], Token::operator(';'));
    assert_eq!(tokens[4], Token::operator('_'));
}

#[test]
fn test_spans_are_byte_offsets() {
    let tokens = tokenize("ab  + 12", Some("test.hls".to_string()));

    assert_eq!(tokens[0].span.start.0, 0);
    assert_eq!(tokens[0].span.end.0, 2);
    assert_eq!(tokens[1].span.start.0, 4);
    assert_eq!(tokens[2].span.start.0, 6);
    assert_eq!(tokens[2].span.end.0, 8);
    assert_eq!(tokens[3].span.start.0, 8);
    assert_eq!(*tokens[0].span.start.1, "test.hls");
}

#[test]
fn test_equality_ignores_span() {
    let lexed = tokenize("   x", None);

    assert_eq!(lexed[0], Token::identifier("x"));
    assert_ne!(lexed[0], Token::identifier("y"));
    assert_ne!(Token::number("1"), Token::identifier("1"));
}

#[test]
fn test_lexer_returns_eof_forever() {
    let mut lexer = Lexer::new("x", None);

    assert_eq!(lexer.pull(), Token::identifier("x"));
    for _ in 0..3 {
        assert_eq!(lexer.pull().kind, TokenKind::EOF);
    }
}

#[test]
fn test_token_buffer_replays_then_repeats_eof() {
    let mut buffer = TokenBuffer::new(vec![
        Token::identifier("a"),
        Token::eof(),
        Token::identifier("ignored"),
    ]);

    assert_eq!(buffer.remaining(), 1);
    assert_eq!(buffer.pull(), Token::identifier("a"));
    assert_eq!(buffer.pull(), Token::eof());
    assert_eq!(buffer.pull(), Token::eof());
}

#[test]
fn test_token_display() {
    assert_eq!(Token::new(TokenKind::Extern, None).to_string(), "extern");
    assert_eq!(Token::operator('(').to_string(), "(");
    assert_eq!(Token::eof().to_string(), "<eof>");
}
