//! Conversion of literal token text into values.

use crate::compiler::ast::LiteralValue;
use num_bigint::BigInt;
use num_traits::Num;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),
    #[error("(unicode error) truncated \\{0} escape")]
    TruncatedEscape(char),
    #[error("(unicode error) illegal Unicode character")]
    InvalidCodePoint,
    #[error("bytes can only contain ASCII literal characters")]
    NonAsciiBytes,
}

/// A decoded literal plus whether it carried an imaginary suffix.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLiteral {
    pub value: LiteralValue,
    pub is_complex: bool,
}

impl ParsedLiteral {
    fn real(value: LiteralValue) -> Self {
        Self { value, is_complex: false }
    }
}

/// Decode the source text of a NUMBER, STRING, `True`, `False` or `None`
/// token.
pub fn parse_literal(raw: &str) -> Result<ParsedLiteral, LiteralError> {
    match raw {
        "None" => Ok(ParsedLiteral::real(LiteralValue::None)),
        "True" => Ok(ParsedLiteral::real(LiteralValue::Bool(true))),
        "False" => Ok(ParsedLiteral::real(LiteralValue::Bool(false))),
        _ if raw.ends_with(['\'', '"']) => parse_string(raw).map(ParsedLiteral::real),
        _ => parse_number(raw),
    }
}

fn parse_number(raw: &str) -> Result<ParsedLiteral, LiteralError> {
    let invalid = || LiteralError::InvalidNumber(raw.to_string());
    let clean = raw.replace('_', "");

    if let Some(magnitude) = clean.strip_suffix(['j', 'J']) {
        let value = parse_float(magnitude).ok_or_else(invalid)?;
        return Ok(ParsedLiteral { value: LiteralValue::Float(value), is_complex: true });
    }

    let lower = clean.to_ascii_lowercase();
    let radix = [("0x", 16), ("0o", 8), ("0b", 2)]
        .into_iter()
        .find_map(|(prefix, radix)| lower.strip_prefix(prefix).map(|digits| (digits, radix)));
    let value = match radix {
        Some((digits, radix)) => LiteralValue::Int(BigInt::from_str_radix(digits, radix).map_err(|_| invalid())?),
        None if lower.contains(['.', 'e']) => LiteralValue::Float(parse_float(&lower).ok_or_else(invalid)?),
        None => LiteralValue::Int(BigInt::from_str_radix(&lower, 10).map_err(|_| invalid())?),
    };
    Ok(ParsedLiteral::real(value))
}

fn parse_float(text: &str) -> Option<f64> {
    let lower = text.to_ascii_lowercase();
    if lower.contains(['.', 'e']) {
        lower.replace(".e", ".0e").parse().ok()
    } else {
        // Integer magnitudes with leading zeros, e.g. `00j`.
        BigInt::from_str_radix(&lower, 10).ok().and_then(|n| n.to_string().parse().ok())
    }
}

fn parse_string(raw: &str) -> Result<LiteralValue, LiteralError> {
    let quote_at = raw.find(['\'', '"']).unwrap_or(0);
    let prefix = raw[..quote_at].to_ascii_lowercase();
    let quoted = &raw[quote_at..];
    let width = if quoted.len() >= 6 && (quoted.starts_with("'''") || quoted.starts_with("\"\"\"")) { 3 } else { 1 };
    let body = quoted.get(width..quoted.len().saturating_sub(width)).unwrap_or("");

    let is_raw = prefix.contains('r');
    let is_bytes = prefix.contains('b');
    if is_bytes && !body.is_ascii() {
        return Err(LiteralError::NonAsciiBytes);
    }
    let text = if is_raw { body.to_string() } else { decode_escapes(body, is_bytes)? };
    if is_bytes {
        // Escapes in bytes decode to chars below U+0100.
        Ok(LiteralValue::Bytes(text.chars().map(|c| c as u32 as u8).collect()))
    } else {
        Ok(LiteralValue::Str(text))
    }
}

fn decode_escapes(body: &str, is_bytes: bool) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(esc) = chars.next() else {
            out.push('\\');
            break;
        };
        match esc {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            '\\' | '\'' | '"' => out.push(esc),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = esc.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                let code = if is_bytes { code & 0xff } else { code };
                out.push(char::from_u32(code).ok_or(LiteralError::InvalidCodePoint)?);
            }
            'x' => out.push(take_hex(&mut chars, 2, 'x')?),
            'u' if !is_bytes => out.push(take_hex(&mut chars, 4, 'u')?),
            'U' if !is_bytes => out.push(take_hex(&mut chars, 8, 'U')?),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    Ok(out)
}

fn take_hex(chars: &mut impl Iterator<Item = char>, len: usize, esc: char) -> Result<char, LiteralError> {
    let mut code = 0u32;
    for _ in 0..len {
        let digit = chars.next().and_then(|d| d.to_digit(16)).ok_or(LiteralError::TruncatedEscape(esc))?;
        code = code * 16 + digit;
    }
    char::from_u32(code).ok_or(LiteralError::InvalidCodePoint)
}
