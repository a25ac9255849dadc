//! Value model decoder: wire fragments back to `Value` trees.
//!
//! The structural inverse of the encoder. Variant dispatch is by element
//! name; `i4`/`int` and bare `<value>` text both decode as integers, and a
//! `<value>` with no typed child decodes as nil. Responses are untrusted, so
//! nesting depth is capped.

use chrono::NaiveDateTime;

use crate::encoder::DATE_TIME_FORMAT;
use crate::reader::Token;
use crate::reader::XmlReader;
use crate::types::Error;
use crate::types::Result;
use crate::types::Struct;
use crate::types::Value;

/// Hard ceiling on value nesting.
const MAX_DEPTH: usize = 64;

/// Extended ISO form some servers emit instead of the compact one.
const DATE_TIME_FORMAT_EXTENDED: &str = "%Y-%m-%dT%H:%M:%S";

/// Decodes a standalone wire fragment, the inverse of `encode_fragment`.
pub fn decode_fragment(src: &str) -> Result<Value> {
    let mut r = XmlReader::new(src);
    let mut text = String::new();
    loop {
        match r.next_token()? {
            Token::Text(t) => text.push_str(&t),
            Token::Open(tag) => {
                if tag == "value" {
                    return read_value_body(&mut r, 0);
                }
                return read_typed(&mut r, tag, 0);
            }
            Token::Empty(tag) => {
                if tag == "value" {
                    return Ok(Value::Nil);
                }
                return empty_element(tag);
            }
            Token::Close(_) => return Err(Error::Syntax(r.pos())),
            Token::Eof => {
                let t = text.trim();
                return if t.is_empty() {
                    Err(Error::UnexpectedEof)
                } else {
                    parse_int(t)
                };
            }
        }
    }
}

/// Reads the content of a `<value>` element whose open tag has already been
/// consumed, through its close tag.
///
/// Bare character data decodes as an integer; an element child is dispatched
/// by name; no content at all is nil.
pub fn read_value_body(r: &mut XmlReader<'_>, depth: usize) -> Result<Value> {
    if depth > MAX_DEPTH {
        return Err(Error::DepthLimit);
    }
    let mut text = String::new();
    loop {
        match r.next_token()? {
            Token::Text(t) => text.push_str(&t),
            Token::Open(tag) => {
                if !text.trim().is_empty() {
                    return Err(Error::Syntax(r.pos()));
                }
                let value = read_typed(r, tag, depth)?;
                r.expect_close("value")?;
                return Ok(value);
            }
            Token::Empty(tag) => {
                if !text.trim().is_empty() {
                    return Err(Error::Syntax(r.pos()));
                }
                let value = empty_element(tag)?;
                r.expect_close("value")?;
                return Ok(value);
            }
            Token::Close(name) if name == "value" => {
                let t = text.trim();
                return if t.is_empty() { Ok(Value::Nil) } else { parse_int(t) };
            }
            Token::Close(name) => {
                return Err(Error::MismatchedTag {
                    expected: "value".to_owned(),
                    found: name.to_owned(),
                })
            }
            Token::Eof => return Err(Error::UnexpectedEof),
        }
    }
}

/// Decodes one typed element whose open tag (`tag`) has been consumed,
/// through its close tag.
fn read_typed(r: &mut XmlReader<'_>, tag: &str, depth: usize) -> Result<Value> {
    match tag {
        "i4" | "int" => parse_int(r.text_content(tag)?.trim()),
        "boolean" => {
            // Anything other than the "0" token is truthy on the wire.
            let text = r.text_content(tag)?;
            Ok(Value::Bool(text.trim() != "0"))
        }
        "double" => {
            let text = r.text_content(tag)?;
            text.trim()
                .parse::<f64>()
                .map(Value::Double)
                .map_err(|_| Error::InvalidScalar {
                    tag: tag.to_owned(),
                    text,
                })
        }
        "string" => Ok(Value::String(r.text_content(tag)?)),
        "dateTime.iso8601" => {
            let text = r.text_content(tag)?;
            parse_datetime(text.trim()).ok_or(Error::InvalidScalar {
                tag: tag.to_owned(),
                text,
            })
        }
        "nil" => {
            r.text_content(tag)?;
            Ok(Value::Nil)
        }
        "array" => read_array(r, depth),
        "struct" => read_struct(r, depth),
        other => Err(Error::UnsupportedType(other.to_owned())),
    }
}

/// Decodes an element that appeared in self-closing form.
fn empty_element(tag: &str) -> Result<Value> {
    match tag {
        "nil" => Ok(Value::Nil),
        "string" => Ok(Value::String(String::new())),
        "struct" => Ok(Value::Struct(Struct::new())),
        "array" | "data" => Ok(Value::Array(Vec::new())),
        "i4" | "int" | "boolean" | "double" | "dateTime.iso8601" => Err(Error::InvalidScalar {
            tag: tag.to_owned(),
            text: String::new(),
        }),
        other => Err(Error::UnsupportedType(other.to_owned())),
    }
}

/// Reads `<data>` and every `<value>` child, resolving each child's inner tag
/// before recursing so nested structs and arrays keep full fidelity.
fn read_array(r: &mut XmlReader<'_>, depth: usize) -> Result<Value> {
    match r.next_element()? {
        Token::Open(name) if name == "data" => {}
        Token::Empty(name) if name == "data" => {
            r.expect_close("array")?;
            return Ok(Value::Array(Vec::new()));
        }
        Token::Close(name) if name == "array" => return Ok(Value::Array(Vec::new())),
        Token::Eof => return Err(Error::UnexpectedEof),
        _ => return Err(Error::Syntax(r.pos())),
    }
    let mut items = Vec::new();
    loop {
        match r.next_element()? {
            Token::Open(name) if name == "value" => items.push(read_value_body(r, depth + 1)?),
            Token::Empty(name) if name == "value" => items.push(Value::Nil),
            Token::Close(name) if name == "data" => break,
            Token::Close(name) => {
                return Err(Error::MismatchedTag {
                    expected: "data".to_owned(),
                    found: name.to_owned(),
                })
            }
            Token::Eof => return Err(Error::UnexpectedEof),
            _ => return Err(Error::Syntax(r.pos())),
        }
    }
    r.expect_close("array")?;
    Ok(Value::Array(items))
}

/// Reads `<member>` children in document order, appending to the output
/// struct in that order.
fn read_struct(r: &mut XmlReader<'_>, depth: usize) -> Result<Value> {
    let mut members = Struct::new();
    loop {
        match r.next_element()? {
            Token::Open(name) if name == "member" => {
                let (name, value) = read_member(r, depth)?;
                if members.contains_key(&name) {
                    return Err(Error::DuplicateMember(name));
                }
                members.insert(name, value);
            }
            Token::Empty(name) if name == "member" => return Err(Error::MissingMemberName),
            Token::Close(name) if name == "struct" => break,
            Token::Close(name) => {
                return Err(Error::MismatchedTag {
                    expected: "struct".to_owned(),
                    found: name.to_owned(),
                })
            }
            Token::Eof => return Err(Error::UnexpectedEof),
            _ => return Err(Error::Syntax(r.pos())),
        }
    }
    Ok(Value::Struct(members))
}

/// Reads one member's `<name>` and `<value>`; missing either is malformed.
fn read_member(r: &mut XmlReader<'_>, depth: usize) -> Result<(String, Value)> {
    let mut name: Option<String> = None;
    let mut value: Option<Value> = None;
    loop {
        match r.next_element()? {
            Token::Open(tag) if tag == "name" => name = Some(r.text_content("name")?),
            Token::Empty(tag) if tag == "name" => name = Some(String::new()),
            Token::Open(tag) if tag == "value" => value = Some(read_value_body(r, depth + 1)?),
            Token::Empty(tag) if tag == "value" => value = Some(Value::Nil),
            Token::Close(tag) if tag == "member" => break,
            Token::Close(tag) => {
                return Err(Error::MismatchedTag {
                    expected: "member".to_owned(),
                    found: tag.to_owned(),
                })
            }
            Token::Eof => return Err(Error::UnexpectedEof),
            _ => return Err(Error::Syntax(r.pos())),
        }
    }
    match (name, value) {
        (Some(name), Some(value)) => Ok((name, value)),
        (None, _) => Err(Error::MissingMemberName),
        (_, None) => Err(Error::MissingMemberValue),
    }
}

fn parse_int(text: &str) -> Result<Value> {
    text.parse::<i64>()
        .map(Value::Int)
        .map_err(|_| Error::InvalidScalar {
            tag: "int".to_owned(),
            text: text.to_owned(),
        })
}

fn parse_datetime(text: &str) -> Option<Value> {
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT_EXTENDED))
        .map(Value::DateTime)
        .ok()
}
