#![allow(dead_code)]

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Mutex;
use std::time::Duration;

use docsmith_core::ClassifiedError;
use docsmith_core::models::render::RenderResponseEnvelope;
use docsmith_render::{BoxFuture, HttpRequest, HttpTransport, Sleeper};

pub const PDF_BYTES: &[u8] = b"%PDF-1.7\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF\n";

pub fn pdf_envelope() -> RenderResponseEnvelope {
    RenderResponseEnvelope::new(200, Vec::new(), PDF_BYTES.to_vec())
        .with_header("Content-Type", "application/pdf")
}

struct Scripted {
    delay: Duration,
    result: Result<RenderResponseEnvelope, ClassifiedError>,
}

/// Replays queued results in order, recording every request. Once the queue
/// is empty the fallback result is used.
pub struct ScriptedTransport {
    queue: Mutex<VecDeque<Scripted>>,
    fallback: Result<RenderResponseEnvelope, ClassifiedError>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn always(result: Result<RenderResponseEnvelope, ClassifiedError>) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            fallback: result,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn then(
        self,
        delay: Duration,
        result: Result<RenderResponseEnvelope, ClassifiedError>,
    ) -> Self {
        self.queue.lock().unwrap().push_back(Scripted { delay, result });
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpTransport for ScriptedTransport {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> BoxFuture<'_, Result<RenderResponseEnvelope, ClassifiedError>> {
        self.requests.lock().unwrap().push(request);
        let next = self.queue.lock().unwrap().pop_front();
        let (delay, result) = match next {
            Some(s) => (s.delay, s.result),
            None => (Duration::ZERO, self.fallback.clone()),
        };
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }
}

#[derive(Default)]
pub struct RecordingSleeper {
    pub delays: Mutex<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        self.delays.lock().unwrap().push(duration);
        Box::pin(async {})
    }
}

/// Serve exactly one canned HTTP response on a local port. The join handle
/// yields the raw request that was received.
pub fn serve_once(response: Vec<u8>) -> (String, std::thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream);
        stream.write_all(&response).unwrap();
        stream.flush().unwrap();
        request
    });
    (format!("http://{addr}"), handle)
}

pub fn http_response(status_line: &str, headers: &[(&str, &str)], body: &[u8]) -> Vec<u8> {
    let mut out = format!("HTTP/1.1 {status_line}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n", body.len()));
    let mut bytes = out.into_bytes();
    bytes.extend_from_slice(body);
    bytes
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_string();
            let content_length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < end + 4 + content_length {
                let n = stream.read(&mut chunk).unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            break;
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}
