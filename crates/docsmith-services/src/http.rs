use std::time::Duration;

use docsmith_core::ClassifiedError;
use docsmith_core::error::{PREVIEW_LIMIT, truncate_preview};
use docsmith_core::models::render::RenderResponseEnvelope;
use docsmith_render::{HttpRequest, HttpTransport};

/// Send `request`, turning an elapsed `timeout` into a transient error.
pub(crate) async fn send(
    transport: &dyn HttpTransport,
    request: HttpRequest,
    timeout: Duration,
    service: &str,
) -> Result<RenderResponseEnvelope, ClassifiedError> {
    match tokio::time::timeout(timeout, transport.execute(request)).await {
        Ok(result) => result,
        Err(_) => Err(ClassifiedError::network_with_detail(
            format!("{service} unreachable: request timed out"),
            format!("no response within {}s", timeout.as_secs_f64()),
        )),
    }
}

/// Map a non-2xx response. JSON `{error, details}` bodies supply the message.
pub(crate) fn status_error(envelope: &RenderResponseEnvelope, service: &str) -> ClassifiedError {
    let status = envelope.status();
    let text = envelope.body_text_lossy();
    let text = text.trim();
    let json = serde_json::from_str::<serde_json::Value>(text).ok();
    let field = |name: &str| {
        json.as_ref()
            .and_then(|j| j.get(name))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let raw = (!text.is_empty()).then(|| truncate_preview(text, PREVIEW_LIMIT));
    let detail = field("details").or(raw);

    match status {
        400..500 => ClassifiedError::validation_with_detail(
            field("error")
                .unwrap_or_else(|| format!("{service} rejected the request with HTTP {status}")),
            detail,
        ),
        500.. => ClassifiedError::rejected(
            Some(status),
            field("error").unwrap_or_else(|| format!("{service} failed with HTTP {status}")),
            detail,
        ),
        _ => ClassifiedError::decode(format!("unexpected status {status} from {service}"), detail),
    }
}

pub(crate) fn is_success(envelope: &RenderResponseEnvelope) -> bool {
    (200..300).contains(&envelope.status())
}

pub(crate) fn body_text(
    envelope: &RenderResponseEnvelope,
    service: &str,
) -> Result<String, ClassifiedError> {
    String::from_utf8(envelope.body().to_vec()).map_err(|_| {
        ClassifiedError::decode(
            format!("{service} returned a body that is not UTF-8 text"),
            Some(truncate_preview(&envelope.body_text_lossy(), PREVIEW_LIMIT)),
        )
    })
}
