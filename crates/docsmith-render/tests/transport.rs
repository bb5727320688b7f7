mod common;

use std::net::TcpListener;
use std::time::Duration;

use docsmith_core::ErrorKind;
use docsmith_render::{HttpRequest, HttpTransport, UreqTransport};

use common::{http_response, serve_once};

#[tokio::test]
async fn passes_status_headers_and_body_through() {
    let (base, server) = serve_once(http_response(
        "500 Internal Server Error",
        &[("Content-Type", "application/json"), ("X-Trace", "abc")],
        br#"{"error":"boom"}"#,
    ));

    let transport = UreqTransport::new(Duration::from_secs(5));
    let envelope = transport
        .execute(HttpRequest::get(format!("{base}/api/templates")))
        .await
        .unwrap();

    assert_eq!(envelope.status(), 500);
    assert_eq!(envelope.content_type(), Some("application/json"));
    assert_eq!(envelope.header("x-trace"), Some("abc"));
    assert_eq!(envelope.body(), br#"{"error":"boom"}"#);

    let request = server.join().unwrap();
    assert!(request.starts_with("GET /api/templates HTTP/1.1"));
}

#[tokio::test]
async fn posts_json_bodies() {
    let response = http_response("200 OK", &[("Content-Type", "text/plain")], b"JVBERi0=");
    let (base, server) = serve_once(response);

    let transport = UreqTransport::new(Duration::from_secs(5));
    let request = HttpRequest::post_json(
        format!("{base}/api/render-pdf/content"),
        &serde_json::json!({ "templateName": "invoice.fo.vm", "content": "<fo:root/>" }),
    )
    .unwrap()
    .with_header("Accept", "application/pdf");
    let envelope = transport.execute(request).await.unwrap();
    assert_eq!(envelope.status(), 200);

    let raw = server.join().unwrap();
    assert!(raw.starts_with("POST /api/render-pdf/content HTTP/1.1"));
    let lower = raw.to_ascii_lowercase();
    assert!(lower.contains("content-type: application/json"));
    assert!(lower.contains("accept: application/pdf"));
    assert!(raw.ends_with(r#"{"templateName":"invoice.fo.vm","content":"<fo:root/>"}"#));
}

#[tokio::test]
async fn connection_refused_is_transient() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let transport = UreqTransport::new(Duration::from_secs(5));
    let err = transport
        .execute(HttpRequest::get(format!("http://127.0.0.1:{port}/api/templates")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkTransient);
}

#[tokio::test]
async fn oversized_bodies_are_refused() {
    let (base, server) = serve_once(http_response("200 OK", &[], &[b'A'; 4096]));

    let transport = UreqTransport::new(Duration::from_secs(5)).with_max_body_bytes(1024);
    let err = transport
        .execute(HttpRequest::get(format!("{base}/big")))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    let _ = server.join();
}
