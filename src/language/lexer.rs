use crate::language::{
    span::Span,
    token::{Token, TokenKind},
};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1},
    character::complete::{char, digit1, multispace1, none_of},
    combinator::{recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub span: Span,
}

impl LexError {
    fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Splits `source` into tokens, always terminated by `Eof`.
///
/// Lexing continues past bad characters so that every problem in the
/// file is reported at once.
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<LexError>> {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    let mut rest = source;

    loop {
        if let Ok((remaining, ())) = trivia(rest) {
            rest = remaining;
        }
        let start = source.len() - rest.len();
        if rest.is_empty() {
            break;
        }
        if rest.starts_with("/*") {
            errors.push(LexError::new(
                "unterminated block comment",
                Span::new(start, source.len()),
            ));
            break;
        }

        if let Ok((remaining, digits)) = digit1::<_, nom::error::Error<&str>>(rest) {
            let end = source.len() - remaining.len();
            match digits.parse::<i64>() {
                Ok(number) => tokens.push(Token {
                    kind: TokenKind::IntLiteral(number),
                    span: Span::new(start, end),
                }),
                Err(_) => errors.push(LexError::new(
                    format!("integer literal `{digits}` does not fit in 64 bits"),
                    Span::new(start, end),
                )),
            }
            rest = remaining;
            continue;
        }

        if rest.starts_with('\'') {
            match char_literal(rest) {
                Ok((remaining, ch)) => {
                    let end = source.len() - remaining.len();
                    if ch.is_ascii() {
                        tokens.push(Token {
                            kind: TokenKind::CharLiteral(ch as u8),
                            span: Span::new(start, end),
                        });
                    } else {
                        errors.push(LexError::new(
                            format!("character {ch:?} does not fit in a `char`"),
                            Span::new(start, end),
                        ));
                    }
                    rest = remaining;
                }
                Err(_) => {
                    errors.push(LexError::new(
                        "malformed character literal",
                        Span::new(start, start + 1),
                    ));
                    rest = &rest[1..];
                }
            }
            continue;
        }

        match alt((word, symbol))(rest) {
            Ok((remaining, kind)) => {
                let end = source.len() - remaining.len();
                tokens.push(Token {
                    kind,
                    span: Span::new(start, end),
                });
                rest = remaining;
            }
            Err(_) => {
                let width = rest.chars().next().map_or(1, char::len_utf8);
                errors.push(LexError::new(
                    format!("unexpected character `{}`", &rest[..width]),
                    Span::new(start, start + width),
                ));
                rest = &rest[width..];
            }
        }
    }

    let end = source.len();
    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(end, end),
    });

    if errors.is_empty() {
        Ok(tokens)
    } else {
        Err(errors)
    }
}

fn trivia(input: &str) -> IResult<&str, ()> {
    value((), many0(alt((multispace1, line_comment, block_comment))))(input)
}

fn line_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(tag("//"), take_while(|c: char| c != '\n')))(input)
}

fn block_comment(input: &str) -> IResult<&str, &str> {
    recognize(delimited(tag("/*"), take_until("*/"), tag("*/")))(input)
}

fn char_literal(input: &str) -> IResult<&str, char> {
    delimited(char('\''), alt((escape_sequence, none_of("\\'\n"))), char('\''))(input)
}

fn escape_sequence(input: &str) -> IResult<&str, char> {
    preceded(
        char('\\'),
        alt((
            value('\n', char('n')),
            value('\t', char('t')),
            value('\r', char('r')),
            value('\0', char('0')),
            value('\\', char('\\')),
            value('\'', char('\'')),
            value('"', char('"')),
        )),
    )(input)
}

fn word(input: &str) -> IResult<&str, TokenKind> {
    let (input, text) = recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)?;
    let kind = TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()));
    Ok((input, kind))
}

fn symbol(input: &str) -> IResult<&str, TokenKind> {
    alt((compound_symbol, single_symbol))(input)
}

fn compound_symbol(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::PlusPlus, tag("++")),
        value(TokenKind::MinusMinus, tag("--")),
        value(TokenKind::PlusEq, tag("+=")),
        value(TokenKind::MinusEq, tag("-=")),
        value(TokenKind::StarEq, tag("*=")),
        value(TokenKind::SlashEq, tag("/=")),
        value(TokenKind::PercentEq, tag("%=")),
        value(TokenKind::EqEq, tag("==")),
        value(TokenKind::BangEq, tag("!=")),
        value(TokenKind::LtEq, tag("<=")),
        value(TokenKind::GtEq, tag(">=")),
        value(TokenKind::AmpAmp, tag("&&")),
        value(TokenKind::PipePipe, tag("||")),
    ))(input)
}

fn single_symbol(input: &str) -> IResult<&str, TokenKind> {
    alt((
        value(TokenKind::Plus, char('+')),
        value(TokenKind::Minus, char('-')),
        value(TokenKind::Star, char('*')),
        value(TokenKind::Slash, char('/')),
        value(TokenKind::Percent, char('%')),
        value(TokenKind::Eq, char('=')),
        value(TokenKind::Bang, char('!')),
        value(TokenKind::Lt, char('<')),
        value(TokenKind::Gt, char('>')),
        value(TokenKind::Amp, char('&')),
        value(TokenKind::Dot, char('.')),
        value(TokenKind::Comma, char(',')),
        value(TokenKind::Colon, char(':')),
        value(TokenKind::Semi, char(';')),
        value(TokenKind::LParen, char('(')),
        value(TokenKind::RParen, char(')')),
        value(TokenKind::LBrace, char('{')),
        value(TokenKind::RBrace, char('}')),
        value(TokenKind::LBracket, char('[')),
        value(TokenKind::RBracket, char(']')),
    ))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source)
            .expect("lex")
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn lexes_reference_parameter_signature() {
        assert_eq!(
            kinds("int fluppie(int &x);"),
            vec![
                TokenKind::Int,
                TokenKind::Identifier("fluppie".into()),
                TokenKind::LParen,
                TokenKind::Int,
                TokenKind::Amp,
                TokenKind::Identifier("x".into()),
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn prefers_compound_operators() {
        assert_eq!(
            kinds("d-- <= a && b != c"),
            vec![
                TokenKind::Identifier("d".into()),
                TokenKind::MinusMinus,
                TokenKind::LtEq,
                TokenKind::Identifier("a".into()),
                TokenKind::AmpAmp,
                TokenKind::Identifier("b".into()),
                TokenKind::BangEq,
                TokenKind::Identifier("c".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments_and_decodes_character_escapes() {
        let source = "// heading\nprint_char('\\n'); /* block\n comment */ 'y'";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Identifier("print_char".into()),
                TokenKind::LParen,
                TokenKind::CharLiteral(b'\n'),
                TokenKind::RParen,
                TokenKind::Semi,
                TokenKind::CharLiteral(b'y'),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn spans_point_into_source() {
        let tokens = lex("  foo = 42;").expect("lex");
        assert_eq!(tokens[0].span, Span::new(2, 5));
        assert_eq!(tokens[2].span, Span::new(8, 10));
    }

    #[test]
    fn reports_every_bad_character() {
        let errors = lex("int a = 1 # 2 $;").expect_err("should fail");
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].span, Span::new(10, 11));
        assert!(errors[1].message.contains('$'));
    }

    #[test]
    fn rejects_unterminated_block_comment() {
        let errors = lex("int a; /* never closed").expect_err("should fail");
        assert_eq!(errors[0].message, "unterminated block comment");
    }
}
