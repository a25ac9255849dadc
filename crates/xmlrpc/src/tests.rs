//! Engine tests against mock transports.

use std::sync::Arc;
use std::sync::Mutex;

use xmlpack::Struct;
use xmlpack::Value;

use crate::call::Client;
use crate::error::CallError;
use crate::transport;
use crate::transport::Transport;
use crate::error::TransportError;

/// Mock transport driven by a closure.
struct FnTransport<F>(F)
where
    F: Fn(&str) -> transport::Result<String> + Send + Sync;

impl<F> Transport for FnTransport<F>
where
    F: Fn(&str) -> transport::Result<String> + Send + Sync,
{
    fn exchange(&self, body: &str) -> transport::Result<String> {
        (self.0)(body)
    }
}

fn client_with_reply(reply: &str) -> Client {
    let reply = reply.to_owned();
    Client::from_transport(Box::new(FnTransport(move |_| Ok(reply.clone()))))
}

fn response_with_value(inner: &str) -> String {
    format!(
        "<?xml version=\"1.0\"?><methodResponse><params><param><value>{inner}</value>\
         </param></params></methodResponse>"
    )
}

#[test]
fn test_request_document_shape() -> anyhow::Result<()> {
    let seen = Arc::new(Mutex::new(Vec::<String>::new()));
    let record = Arc::clone(&seen);
    let client = Client::from_transport(Box::new(FnTransport(move |body: &str| {
        record.lock().unwrap().push(body.to_owned());
        Ok(response_with_value("<struct></struct>"))
    })));

    let mut args = Struct::new();
    args.insert("id".to_owned(), Value::Int(7));
    client.invoke("demo.echo", &args)?;

    let bodies = seen.lock().unwrap();
    assert_eq!(
        bodies[0],
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <methodCall><methodName>demo.echo</methodName>\
         <params><param><value><struct>\
         <member><name>id</name><value><i4>7</i4></value></member>\
         </struct></value></param></params></methodCall>"
    );
    Ok(())
}

#[test]
fn test_struct_result() -> anyhow::Result<()> {
    let client = client_with_reply(&response_with_value(
        "<struct><member><name>version</name><value><string>5.0</string></value></member>\
         </struct>",
    ));
    let result = client.invoke_empty("demo.version")?.unwrap();
    assert_eq!(result["version"], Value::String("5.0".to_owned()));
    Ok(())
}

#[test]
fn test_nested_result() -> anyhow::Result<()> {
    let client = client_with_reply(&response_with_value(
        "<struct><member><name>bugs</name><value><array><data>\
         <value><struct>\
         <member><name>id</name><value><i4>7</i4></value></member>\
         <member><name>status</name><value><string>NEW</string></value></member>\
         </struct></value>\
         </data></array></value></member></struct>",
    ));
    let result = client.invoke_empty("Bug.search")?.unwrap();
    let bugs = result["bugs"].as_array().unwrap();
    let first = bugs[0].as_struct().unwrap();
    assert_eq!(first["id"], Value::Int(7));
    assert_eq!(first["status"], Value::String("NEW".to_owned()));
    Ok(())
}

#[test]
fn test_missing_param_is_sentinel() -> anyhow::Result<()> {
    let client = client_with_reply(
        "<?xml version=\"1.0\"?><methodResponse><params></params></methodResponse>",
    );
    assert!(client.invoke_empty("demo.silent")?.is_none());
    Ok(())
}

#[test]
fn test_array_result_violates_shape() {
    let client = client_with_reply(&response_with_value(
        "<array><data><value><i4>1</i4></value></data></array>",
    ));
    let err = client.invoke_empty("demo.list").unwrap_err();
    assert!(matches!(
        err,
        CallError::UnexpectedResultShape { found: "array" },
    ));
}

#[test]
fn test_nil_result_violates_shape() {
    let client = client_with_reply(&response_with_value("<nil/>"));
    let err = client.invoke_empty("demo.nothing").unwrap_err();
    assert!(matches!(
        err,
        CallError::UnexpectedResultShape { found: "nil" },
    ));
}

#[test]
fn test_malformed_member_is_an_error() {
    let client = client_with_reply(&response_with_value(
        "<struct><member><value><i4>1</i4></value></member></struct>",
    ));
    let err = client.invoke_empty("demo.broken").unwrap_err();
    assert!(matches!(
        err,
        CallError::MalformedResponse(xmlpack::Error::MissingMemberName),
    ));
}

#[test]
fn test_unrecognized_tag_is_an_error() {
    let client = client_with_reply(&response_with_value("<base64>AAAA</base64>"));
    let err = client.invoke_empty("demo.blob").unwrap_err();
    match err {
        CallError::MalformedResponse(xmlpack::Error::UnsupportedType(tag)) => {
            assert_eq!(tag, "base64");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_unparsable_response() {
    let client = client_with_reply("this is not xml <");
    let err = client.invoke_empty("demo.garbage").unwrap_err();
    assert!(matches!(err, CallError::MalformedResponse(_)));
}

#[test]
fn test_fault_response() {
    let client = client_with_reply(
        "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
         <member><name>faultCode</name><value><i4>410</i4></value></member>\
         <member><name>faultString</name><value><string>no such method</string></value>\
         </member></struct></value></fault></methodResponse>",
    );
    let err = client.invoke_empty("demo.missing").unwrap_err();
    match err {
        CallError::Fault { code, message } => {
            assert_eq!(code, 410);
            assert_eq!(message, "no such method");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_transport_failure_propagates() {
    let client = Client::from_transport(Box::new(FnTransport(|_: &str| {
        Err(TransportError::Status(503))
    })));
    let err = client.invoke_empty("demo.down").unwrap_err();
    assert!(matches!(
        err,
        CallError::Transport(TransportError::Status(503)),
    ));
}
