//! Pull tokenizer for the wire dialect.
//!
//! Understands exactly the subset of XML the protocol produces: elements,
//! character data, CDATA sections, entity references, comments, and the
//! document prolog. Attributes are skipped rather than reported since the
//! dialect never carries meaning in them.

use std::borrow::Cow;

use crate::types::Error;
use crate::types::Result;

/// One lexical event from the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// `<tag>` (attributes skipped).
    Open(&'a str),
    /// `</tag>`.
    Close(&'a str),
    /// `<tag/>`.
    Empty(&'a str),
    /// Character data with entities resolved. May be whitespace-only.
    Text(Cow<'a, str>),
    Eof,
}

/// A tokenizer tracking position within a borrowed document.
#[derive(Debug, Clone)]
pub struct XmlReader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> XmlReader<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Byte offset of the next unread character.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Returns the next token, silently consuming the prolog, processing
    /// instructions, comments, and doctype declarations.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        loop {
            let src = self.src;
            let rest = &src[self.pos..];
            if rest.is_empty() {
                return Ok(Token::Eof);
            }
            if let Some(after) = rest.strip_prefix('<') {
                if after.starts_with('?') {
                    self.skip_past(rest, "?>")?;
                } else if after.starts_with("!--") {
                    self.skip_past(rest, "-->")?;
                } else if after.starts_with("![CDATA[") {
                    let body = &rest["<![CDATA[".len()..];
                    let end = body.find("]]>").ok_or(Error::UnexpectedEof)?;
                    self.pos += "<![CDATA[".len() + end + "]]>".len();
                    return Ok(Token::Text(Cow::Borrowed(&body[..end])));
                } else if after.starts_with('!') {
                    self.skip_past(rest, ">")?;
                } else if let Some(closing) = after.strip_prefix('/') {
                    let end = closing.find('>').ok_or(Error::UnexpectedEof)?;
                    let name = closing[..end].trim();
                    if name.is_empty() {
                        return Err(Error::Syntax(self.pos));
                    }
                    self.pos += 2 + end + 1;
                    return Ok(Token::Close(name));
                } else {
                    return self.read_start_tag(after);
                }
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                let text = unescape(&rest[..end])?;
                self.pos += end;
                return Ok(Token::Text(text));
            }
        }
    }

    /// Next structural token, skipping whitespace-only character data.
    pub fn next_element(&mut self) -> Result<Token<'a>> {
        loop {
            match self.next_token()? {
                Token::Text(t) if t.trim().is_empty() => continue,
                token => return Ok(token),
            }
        }
    }

    /// Accumulates character data up to the close tag for `tag`, consuming it.
    pub fn text_content(&mut self, tag: &str) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.next_token()? {
                Token::Text(t) => out.push_str(&t),
                Token::Close(name) if name == tag => return Ok(out),
                Token::Close(name) => {
                    return Err(Error::MismatchedTag {
                        expected: tag.to_owned(),
                        found: name.to_owned(),
                    })
                }
                Token::Eof => return Err(Error::UnexpectedEof),
                Token::Open(_) | Token::Empty(_) => return Err(Error::Syntax(self.pos)),
            }
        }
    }

    /// Consumes the close tag for `tag`, tolerating interleaved whitespace.
    pub fn expect_close(&mut self, tag: &str) -> Result<()> {
        match self.next_element()? {
            Token::Close(name) if name == tag => Ok(()),
            Token::Close(name) => Err(Error::MismatchedTag {
                expected: tag.to_owned(),
                found: name.to_owned(),
            }),
            Token::Eof => Err(Error::UnexpectedEof),
            _ => Err(Error::Syntax(self.pos)),
        }
    }

    fn read_start_tag(&mut self, after: &'a str) -> Result<Token<'a>> {
        // Scan for the closing '>' outside quoted attribute values.
        let mut quote: Option<char> = None;
        for (i, c) in after.char_indices() {
            match (quote, c) {
                (Some(q), _) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"') | (None, '\'') => quote = Some(c),
                (None, '>') => {
                    let inside = &after[..i];
                    let self_closing = inside.ends_with('/');
                    let inside = inside.strip_suffix('/').unwrap_or(inside);
                    let name = inside
                        .split(|c: char| c.is_ascii_whitespace())
                        .next()
                        .unwrap_or("");
                    if name.is_empty() {
                        return Err(Error::Syntax(self.pos));
                    }
                    self.pos += 1 + i + 1;
                    return Ok(if self_closing {
                        Token::Empty(name)
                    } else {
                        Token::Open(name)
                    });
                }
                _ => {}
            }
        }
        Err(Error::UnexpectedEof)
    }

    fn skip_past(&mut self, rest: &str, marker: &str) -> Result<()> {
        let end = rest.find(marker).ok_or(Error::UnexpectedEof)?;
        self.pos += end + marker.len();
        Ok(())
    }
}

/// Resolves entity references in character data.
fn unescape(text: &str) -> Result<Cow<'_, str>> {
    if !text.contains('&') {
        return Ok(Cow::Borrowed(text));
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let semi = tail.find(';').ok_or_else(|| truncated_entity(tail))?;
        let entity = &tail[..semi];
        match entity {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => out.push(numeric_entity(entity)?),
        }
        rest = &tail[semi + 1..];
    }
    out.push_str(rest);
    Ok(Cow::Owned(out))
}

fn numeric_entity(entity: &str) -> Result<char> {
    let code = entity
        .strip_prefix('#')
        .ok_or_else(|| Error::UnknownEntity(entity.to_owned()))?;
    let value = match code.strip_prefix(['x', 'X']) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => code.parse::<u32>(),
    }
    .map_err(|_| Error::UnknownEntity(entity.to_owned()))?;
    char::from_u32(value).ok_or_else(|| Error::UnknownEntity(entity.to_owned()))
}

fn truncated_entity(tail: &str) -> Error {
    Error::UnknownEntity(tail.chars().take(8).collect())
}
