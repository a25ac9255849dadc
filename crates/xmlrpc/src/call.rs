//! # Transaction Engine
//!
//! One buffered request/response cycle: serialize the call document, post it,
//! decode the single returned value.
//!
//! ## Invariants
//! - A request carries exactly one parameter, the encoded argument struct.
//! - A response with zero parameters is the "returned nothing" sentinel
//!   (`Ok(None)`), never an error.
//! - A decoded result that is not a struct is a contract violation, surfaced
//!   as a typed error rather than coerced.

use tracing::debug;
use tracing::warn;

use xmlpack::read_value_body;
use xmlpack::Struct;
use xmlpack::Token;
use xmlpack::Value;
use xmlpack::XmlReader;
use xmlpack::XmlWriter;

use crate::error::CallError;
use crate::error::Result;
use crate::transport::HttpTransport;
use crate::transport::Transport;

/// A stateless engine bound to one endpoint.
///
/// Each call builds its own request buffer and response document, so one
/// instance may serve concurrent callers without locking.
pub struct Client {
    transport: Box<dyn Transport>,
}

impl Client {
    /// Binds the engine to an HTTP endpoint with the default timeout.
    pub fn open(endpoint: impl Into<String>) -> Result<Self> {
        Ok(Self::from_transport(Box::new(HttpTransport::new(endpoint)?)))
    }

    /// Binds the engine to an HTTP endpoint with a custom request timeout.
    pub fn open_with_timeout(
        endpoint: impl Into<String>,
        timeout: std::time::Duration,
    ) -> Result<Self> {
        Ok(Self::from_transport(Box::new(HttpTransport::with_timeout(
            endpoint, timeout,
        )?)))
    }

    /// Runs the engine over a caller-supplied transport.
    pub fn from_transport(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Invokes `method` with a mapping of named arguments.
    ///
    /// `Ok(None)` means the response carried no parameter at all; whether
    /// that absence is meaningful is the caller's decision.
    pub fn invoke(&self, method: &str, args: &Struct) -> Result<Option<Struct>> {
        let body = build_request(method, args);
        debug!(method, bytes = body.len(), "invoking remote procedure");
        let reply = self.transport.exchange(&body)?;
        let value = match extract_response(&reply)? {
            Some(value) => value,
            None => {
                debug!(method, "response carried no parameter");
                return Ok(None);
            }
        };
        match value {
            Value::Struct(members) => Ok(Some(members)),
            other => {
                warn!(method, found = other.type_name(), "non-struct result");
                Err(CallError::UnexpectedResultShape {
                    found: other.type_name(),
                })
            }
        }
    }

    /// Invokes `method` with no arguments.
    pub fn invoke_empty(&self, method: &str) -> Result<Option<Struct>> {
        self.invoke(method, &Struct::new())
    }
}

/// Serializes the full call document: declaration, method name, and exactly
/// one parameter holding the argument struct.
pub fn build_request(method: &str, args: &Struct) -> String {
    let mut w = XmlWriter::with_capacity(256);
    w.declaration();
    w.open("methodCall");
    w.element("methodName", method);
    w.open("params");
    w.open("param");
    w.open("value");
    xmlpack::encode_struct(&mut w, args);
    w.close("value");
    w.close("param");
    w.close("params");
    w.close("methodCall");
    w.into_string()
}

/// Locates the first parameter of a response document and decodes its value.
///
/// `Ok(None)` when no parameter element exists anywhere in the document.
/// A `<fault>` element is decoded and surfaced as `CallError::Fault`.
pub fn extract_response(body: &str) -> Result<Option<Value>> {
    let mut r = XmlReader::new(body);
    loop {
        match r.next_token().map_err(CallError::MalformedResponse)? {
            Token::Open(name) if name == "param" => {
                return match r.next_element().map_err(CallError::MalformedResponse)? {
                    Token::Open(n) if n == "value" => {
                        Ok(Some(read_value_body(&mut r, 0)?))
                    }
                    Token::Empty(n) if n == "value" => Ok(Some(Value::Nil)),
                    Token::Eof => Err(xmlpack::Error::UnexpectedEof.into()),
                    _ => Err(xmlpack::Error::Syntax(r.pos()).into()),
                };
            }
            Token::Open(name) if name == "fault" => return Err(read_fault(&mut r)),
            Token::Eof => return Ok(None),
            _ => continue,
        }
    }
}

/// Decodes the `<fault>` payload into a typed error. Malformed fault bodies
/// still fail as faults, with whatever detail could be recovered.
fn read_fault(r: &mut XmlReader<'_>) -> CallError {
    let members = match r.next_element() {
        Ok(Token::Open(name)) if name == "value" => match read_value_body(r, 0) {
            Ok(Value::Struct(members)) => members,
            _ => Struct::new(),
        },
        _ => Struct::new(),
    };
    let code = members
        .get("faultCode")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let message = members
        .get("faultString")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_owned();
    CallError::Fault { code, message }
}
