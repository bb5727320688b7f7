mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use docsmith_core::models::render::{RenderRequest, RenderResponseEnvelope};
use docsmith_core::{ClassifiedError, ErrorKind};
use docsmith_render::{
    Dispatcher, RenderEndpoints, RenderOutcome, Renderer, RetryPolicy, with_retry,
};

use common::{RecordingSleeper, ScriptedTransport};

fn refused() -> ClassifiedError {
    ClassifiedError::network_with_detail("service unreachable", "Connection refused (os error 111)")
}

#[tokio::test]
async fn linear_backoff_between_retries() {
    let sleeper = RecordingSleeper::default();
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = with_retry(&RetryPolicy::default(), &sleeper, |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(refused()) }
    })
    .await;

    assert_eq!(result.unwrap_err(), refused());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(
        *sleeper.delays.lock().unwrap(),
        vec![Duration::from_millis(1000), Duration::from_millis(2000)]
    );
}

#[tokio::test]
async fn recovers_when_a_retry_succeeds() {
    let sleeper = RecordingSleeper::default();
    let result = with_retry(&RetryPolicy::default(), &sleeper, |attempt| async move {
        if attempt == 0 { Err(refused()) } else { Ok(attempt) }
    })
    .await;

    assert_eq!(result.unwrap(), 1);
    assert_eq!(sleeper.delays.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn deterministic_failures_are_not_retried() {
    let failures = [
        ClassifiedError::rejected(Some(500), "boom", None),
        ClassifiedError::decode("not a pdf", None),
        ClassifiedError::validation("missing content"),
    ];
    for failure in failures {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let expected = failure.clone();

        let result: Result<(), _> = with_retry(&RetryPolicy::default(), &sleeper, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            let failure = failure.clone();
            async move { Err(failure) }
        })
        .await;

        assert_eq!(result.unwrap_err(), expected);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.delays.lock().unwrap().is_empty());
    }
}

#[test]
fn total_delay_is_bounded() {
    assert_eq!(RetryPolicy::default().total_delay(), Duration::from_millis(3000));
    assert_eq!(RetryPolicy::none().total_delay(), Duration::ZERO);
}

fn renderer(transport: Arc<ScriptedTransport>) -> Renderer {
    let dispatcher = Dispatcher::new(transport, RenderEndpoints::new("http://render.test"));
    Renderer::new(dispatcher)
}

#[tokio::test(start_paused = true)]
async fn render_retries_refused_connections_with_real_delays() {
    let transport = Arc::new(ScriptedTransport::always(Err(refused())));
    let renderer = renderer(transport.clone());

    let started = tokio::time::Instant::now();
    let err = renderer
        .render(RenderRequest::by_name("invoice").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkTransient);
    assert_eq!(transport.calls(), 3);
    assert!(started.elapsed() >= Duration::from_millis(3000));
}

#[tokio::test(start_paused = true)]
async fn render_does_not_retry_server_errors() {
    for status in [500, 503] {
        let transport = Arc::new(ScriptedTransport::always(Ok(RenderResponseEnvelope::new(
            status,
            Vec::new(),
            b"down".to_vec(),
        ))));
        let renderer = renderer(transport.clone());

        let started = tokio::time::Instant::now();
        let err = renderer
            .render(RenderRequest::by_name("invoice").unwrap())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ServerRejected);
        assert_eq!(err.is_service_unavailable(), status == 503);
        assert_eq!(transport.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}

#[tokio::test(start_paused = true)]
async fn render_succeeds_after_a_transient_failure() {
    let transport = Arc::new(
        ScriptedTransport::always(Ok(common::pdf_envelope())).then(Duration::ZERO, Err(refused())),
    );
    let renderer = renderer(transport.clone());

    let outcome = renderer
        .render(RenderRequest::by_content("invoice", "<fo:root/>").unwrap())
        .await
        .unwrap();

    assert!(matches!(outcome, RenderOutcome::Current { generation: 1, .. }));
    assert_eq!(transport.calls(), 2);
}
