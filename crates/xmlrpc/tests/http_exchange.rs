//! End-to-end exchange over a loopback HTTP server.

use std::io::Read;
use std::io::Write;
use std::net::TcpListener;
use std::net::TcpStream;
use std::thread;

use xmlpack::Struct;
use xmlpack::Value;
use xmlrpc::CallError;
use xmlrpc::Client;
use xmlrpc::TransportError;

/// Accepts one connection, reads the full request, answers with `status` and
/// `body`, and hands the raw request text back.
fn serve_once(listener: TcpListener, status: &'static str, body: String) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/xml\r\nContent-Length: {}\r\n\
             Connection: close\r\n\r\n{body}",
            body.len(),
        );
        stream.write_all(response.as_bytes()).unwrap();
        request
    })
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let header_end = loop {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed mid-request");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(i) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break i + 4;
        }
    };
    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).unwrap();
        assert!(n > 0, "connection closed mid-body");
        buf.extend_from_slice(&chunk[..n]);
    }
    String::from_utf8(buf).unwrap()
}

#[test]
fn posts_and_decodes_over_http() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = serve_once(
        listener,
        "200 OK",
        "<?xml version=\"1.0\"?><methodResponse><params><param><value><struct>\
         <member><name>version</name><value><string>5.0.6</string></value></member>\
         </struct></value></param></params></methodResponse>"
            .to_owned(),
    );

    let client = Client::open(format!("http://127.0.0.1:{port}/xmlrpc.cgi")).unwrap();
    let mut args = Struct::new();
    args.insert("login".to_owned(), Value::from("user@example.com"));
    let result = client.invoke("Bugzilla.version", &args).unwrap().unwrap();
    assert_eq!(result["version"], Value::String("5.0.6".to_owned()));

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /xmlrpc.cgi HTTP/1.1\r\n"));
    assert!(request.contains("content-type: text/xml; charset=\"utf-8\"")
        || request.contains("Content-Type: text/xml; charset=\"utf-8\""));
    assert!(request.contains("<methodName>Bugzilla.version</methodName>"));
    assert!(request.contains("<name>login</name><value><string>user@example.com</string></value>"));
}

#[test]
fn non_success_status_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = serve_once(listener, "404 Not Found", "gone".to_owned());

    let client = Client::open(format!("http://127.0.0.1:{port}/missing")).unwrap();
    let err = client.invoke_empty("Bugzilla.version").unwrap_err();
    assert!(matches!(
        err,
        CallError::Transport(TransportError::Status(404)),
    ));
    server.join().unwrap();
}

#[test]
fn connection_refused_is_a_transport_error() {
    // Bind then drop to get a port nothing is listening on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = Client::open(format!("http://127.0.0.1:{port}/")).unwrap();
    let err = client.invoke_empty("Bugzilla.version").unwrap_err();
    assert!(matches!(err, CallError::Transport(_)));
}
