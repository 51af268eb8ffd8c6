//! Text template evaluator.
//!
//! A text object's `source` is a sequence of tokens concatenated in order:
//!
//! ```text
//! "Invoice " number " of " [customer name] " - page " @Page " / " @Pages
//! ```
//!
//! - `"..."` literal text (`\"` and `\\` escapes)
//! - `ident` or `[any name]` field reference, resolved through the caller
//! - `@Page`, `@Pages`, `@Date`, `@Time`, the last two optionally followed by
//!   a `{format}` using `%Y %m %d %H %M %S`
//!
//! Tokens may be separated by whitespace and/or `+`. Evaluation is a pure
//! function of the source, the [`EvalContext`] and the field resolver.

use chrono::NaiveDateTime;
use chrono::format::{Item, Numeric, StrftimeItems};
use thiserror::Error;

/// Left in the output for the whole-document total page sweep.
pub const PAGES_MARKER: &str = "@Pages";

/// Substituted for fields nobody could resolve.
pub const ERROR_TEXT: &str = "{ERROR}";

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Field(String),
    Page,
    Pages,
    Date(Option<String>),
    Time(Option<String>),
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated string literal at byte {0}")]
    UnterminatedString(usize),
    #[error("unterminated field name at byte {0}")]
    UnterminatedField(usize),
    #[error("unterminated format at byte {0}")]
    UnterminatedFormat(usize),
    #[error("unknown special token @{0}")]
    UnknownSpecial(String),
    #[error("unexpected character {0:?} at byte {1}")]
    Unexpected(char, usize),
}

#[derive(Clone, Copy, Debug)]
pub struct EvalContext {
    /// 1-based number of the page being filled.
    pub page: usize,
    pub now: NaiveDateTime,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

pub fn parse(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        match c {
            c if c.is_whitespace() || c == '+' => {
                chars.next();
            }
            '"' => {
                chars.next();
                let mut literal = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some((_, 'n')) => literal.push('\n'),
                            Some((_, 't')) => literal.push('\t'),
                            Some((_, esc)) => literal.push(esc),
                            None => break,
                        },
                        c => literal.push(c),
                    }
                }
                if !closed {
                    return Err(TemplateError::UnterminatedString(start));
                }
                tokens.push(Token::Literal(literal));
            }
            '[' => {
                chars.next();
                let mut name = String::new();
                let mut closed = false;
                for (_, c) in chars.by_ref() {
                    if c == ']' {
                        closed = true;
                        break;
                    }
                    name.push(c);
                }
                if !closed {
                    return Err(TemplateError::UnterminatedField(start));
                }
                tokens.push(Token::Field(name.trim().to_string()));
            }
            '@' => {
                chars.next();
                let mut word = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !c.is_ascii_alphabetic() {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                let format = if matches!(word.as_str(), "Date" | "Time")
                    && matches!(chars.peek(), Some((_, '{')))
                {
                    let (brace, _) = chars.next().unwrap_or((start, '{'));
                    let mut format = String::new();
                    let mut closed = false;
                    for (_, c) in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        format.push(c);
                    }
                    if !closed {
                        return Err(TemplateError::UnterminatedFormat(brace));
                    }
                    Some(format)
                } else {
                    None
                };
                let token = match word.as_str() {
                    "Page" => Token::Page,
                    "Pages" => Token::Pages,
                    "Date" => Token::Date(format),
                    "Time" => Token::Time(format),
                    _ => return Err(TemplateError::UnknownSpecial(word)),
                };
                tokens.push(token);
            }
            c if is_ident_start(c) => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                tokens.push(Token::Field(name));
            }
            other => return Err(TemplateError::Unexpected(other, start)),
        }
    }

    Ok(tokens)
}

/// Render `now` with the supported subset of strftime conversions. Anything
/// else is copied through unchanged.
pub fn format_datetime(format: &str, now: &NaiveDateTime) -> String {
    let mut items = Vec::new();
    let mut rest = format;
    while let Some(i) = rest.find('%') {
        items.push(Item::Literal(&rest[..i]));
        let len = rest[i + 1..].chars().next().map_or(1, |c| 1 + c.len_utf8());
        let spec = &rest[i..i + len];
        items.push(supported_item(spec).unwrap_or(Item::Literal(spec)));
        rest = &rest[i + len..];
    }
    items.push(Item::Literal(rest));
    now.format_with_items(items.iter()).to_string()
}

fn supported_item(spec: &str) -> Option<Item<'_>> {
    let item = StrftimeItems::new(spec).next()?;
    match item {
        Item::Numeric(
            Numeric::Year
            | Numeric::Month
            | Numeric::Day
            | Numeric::Hour
            | Numeric::Minute
            | Numeric::Second,
            _,
        )
        | Item::Literal("%") => Some(item),
        _ => None,
    }
}

/// Evaluate a template. `resolve` is asked for every field reference;
/// `None` becomes [`ERROR_TEXT`]. `@Pages` is left as [`PAGES_MARKER`].
/// A source that does not parse is logged and returned verbatim.
pub fn evaluate(
    source: &str,
    ctx: &EvalContext,
    resolve: &mut dyn FnMut(&str) -> Option<String>,
) -> String {
    let tokens = match parse(source) {
        Ok(tokens) => tokens,
        Err(e) => {
            log::warn!("Text source {source:?} not evaluated: {e}");
            return source.to_string();
        }
    };

    let mut out = String::new();
    for token in &tokens {
        match token {
            Token::Literal(s) => out.push_str(s),
            Token::Field(name) => match resolve(name) {
                Some(value) => out.push_str(&value),
                None => {
                    log::debug!("Field \"{name}\" unresolved");
                    out.push_str(ERROR_TEXT);
                }
            },
            Token::Page => out.push_str(&ctx.page.to_string()),
            Token::Pages => out.push_str(PAGES_MARKER),
            Token::Date(format) => out.push_str(&format_datetime(
                format.as_deref().unwrap_or(DEFAULT_DATE_FORMAT),
                &ctx.now,
            )),
            Token::Time(format) => out.push_str(&format_datetime(
                format.as_deref().unwrap_or(DEFAULT_TIME_FORMAT),
                &ctx.now,
            )),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ctx(page: usize) -> EvalContext {
        EvalContext {
            page,
            now: NaiveDate::from_ymd_opt(2024, 3, 7)
                .and_then(|d| d.and_hms_opt(9, 5, 30))
                .unwrap(),
        }
    }

    fn eval(source: &str) -> String {
        evaluate(source, &ctx(3), &mut |name| match name {
            "city" => Some("Oslo".to_string()),
            "customer name" => Some("ACME".to_string()),
            _ => None,
        })
    }

    #[test]
    fn tokenizes_mixed_source() {
        let tokens = parse(r#""Page " + @Page " of " @Pages city [customer name] @Date{%d/%m}"#)
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Literal("Page ".into()),
                Token::Page,
                Token::Literal(" of ".into()),
                Token::Pages,
                Token::Field("city".into()),
                Token::Field("customer name".into()),
                Token::Date(Some("%d/%m".into())),
            ]
        );
    }

    #[test]
    fn evaluates_page_and_keeps_pages_marker() {
        assert_eq!(eval(r#""Page " @Page " of " @Pages"#), "Page 3 of @Pages");
    }

    #[test]
    fn fields_resolve_or_fall_back_to_error() {
        assert_eq!(eval(r#"city ", " [customer name]"#), "Oslo, ACME");
        assert_eq!(eval("nowhere"), ERROR_TEXT);
    }

    #[test]
    fn date_and_time_formats() {
        assert_eq!(eval("@Date"), "2024-03-07");
        assert_eq!(eval("@Time"), "09:05:30");
        assert_eq!(eval(r#"@Date{%d.%m.%Y} " " @Time{%H%M}"#), "07.03.2024 0905");
        assert_eq!(format_datetime("%Y %q %%", &ctx(1).now), "2024 %q %");
        assert_eq!(format_datetime("%y/%e %S%", &ctx(1).now), "%y/%e 30%");
    }

    #[test]
    fn literal_escapes() {
        assert_eq!(eval(r#""say \"hi\" \\ ok""#), r#"say "hi" \ ok"#);
    }

    #[test]
    fn malformed_source_is_returned_verbatim() {
        assert_eq!(parse(r#""open"#), Err(TemplateError::UnterminatedString(0)));
        assert_eq!(
            parse("@Bogus"),
            Err(TemplateError::UnknownSpecial("Bogus".into()))
        );
        assert_eq!(eval("\"open"), "\"open");
        assert_eq!(eval("a ; b"), "a ; b");
    }

    #[test]
    fn empty_source_is_empty() {
        assert_eq!(eval(""), "");
        assert_eq!(eval("   "), "");
    }
}
