//! End-to-end dispatcher tests over synthetic transport streams.

use std::convert::Infallible;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use fundflow_router::reasoning::SplitterConfig;
use fundflow_router::stream::{
    DispatcherConfig, DisplayUpdate, StreamDispatcher, EMPTY_RESULT_FALLBACK,
    SERVICE_ERROR_FALLBACK,
};

fn data_line(code: i64, message: &str, data: serde_json::Value) -> String {
    format!(
        "data: {}\n",
        serde_json::json!({ "code": code, "message": message, "data": data })
    )
}

fn text_delta(text: &str) -> String {
    data_line(1001, "text_delta", serde_json::json!(text))
}

fn stream_end() -> String {
    data_line(2000, "stream_end", serde_json::Value::Null)
}

/// Run the dispatcher over the given transport chunks and collect every
/// emitted update.
async fn run_dispatcher(chunks: Vec<String>, emit_interval: Duration) -> Vec<DisplayUpdate> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = DispatcherConfig {
        emit_interval,
        ..Default::default()
    };
    let dispatcher = StreamDispatcher::new(config, tx);

    let stream = tokio_stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<Bytes, Infallible>(Bytes::from(chunk))),
    );
    dispatcher.run(stream).await;

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    updates
}

#[tokio::test]
async fn json_envelope_turn_produces_card_fields() {
    let chunks = vec![
        text_delta("{\"content\":\"Hel"),
        text_delta("lo\",\"card_typ"),
        text_delta("e\":\"warning\",\"card_message\":\"careful\"}"),
        stream_end(),
    ];
    let updates = run_dispatcher(chunks, Duration::ZERO).await;

    let last = updates.last().unwrap();
    assert_eq!(last.content, "Hello");
    assert_eq!(last.card_type.as_deref(), Some("warning"));
    assert_eq!(last.card_message.as_deref(), Some("careful"));

    // Live updates carry the partially extracted content, never raw JSON.
    for update in &updates[..updates.len() - 1] {
        assert!(!update.content.contains("card_typ"), "{:?}", update.content);
    }
}

#[tokio::test]
async fn plain_text_turn_streams_visible_content() {
    let chunks = vec![
        text_delta("你好，提取公积金需要先完成授权。"),
        text_delta("请点击下方按钮。"),
        stream_end(),
    ];
    let updates = run_dispatcher(chunks, Duration::ZERO).await;

    let last = updates.last().unwrap();
    assert_eq!(last.content, "你好，提取公积金需要先完成授权。请点击下方按钮。");
    assert_eq!(last.card_type, None);
}

#[tokio::test]
async fn thinking_trace_is_separated_and_marked_complete() {
    let chunks = vec![
        text_delta("<thi"),
        text_delta("nk>reasoning</th"),
        text_delta("ink>answer"),
        stream_end(),
    ];
    let updates = run_dispatcher(chunks, Duration::ZERO).await;

    let last = updates.last().unwrap();
    assert_eq!(last.thinking, "reasoning");
    assert_eq!(last.content, "answer");
    assert!(last.thinking_complete);
    assert!(!last.is_thinking);
}

#[tokio::test]
async fn error_codes_substitute_the_fixed_fallback() {
    for code in [4321i64, 7777] {
        let chunks = vec![
            text_delta("partial answer that must not surface"),
            data_line(code, "error", serde_json::json!("internal detail")),
        ];
        let updates = run_dispatcher(chunks, Duration::ZERO).await;
        let last = updates.last().unwrap();
        assert_eq!(last.content, SERVICE_ERROR_FALLBACK, "code {}", code);
        assert!(!last.content.contains("internal detail"));
    }
}

#[tokio::test]
async fn empty_turn_emits_the_empty_fallback() {
    let updates = run_dispatcher(vec![stream_end()], Duration::ZERO).await;
    assert_eq!(updates.last().unwrap().content, EMPTY_RESULT_FALLBACK);
}

#[tokio::test]
async fn malformed_lines_and_unknown_events_are_skipped() {
    let chunks = vec![
        ": keep-alive\n".to_string(),
        "data: this is not json\n".to_string(),
        data_line(3333, "mystery", serde_json::Value::Null),
        data_line(1003, "flow_output", serde_json::json!("duplicate text")),
        text_delta("actual answer"),
        stream_end(),
    ];
    let updates = run_dispatcher(chunks, Duration::ZERO).await;
    let last = updates.last().unwrap();
    assert_eq!(last.content, "actual answer");
}

#[tokio::test]
async fn audio_transcript_bypasses_marker_handling() {
    let chunks = vec![
        data_line(
            1002,
            "audio_transcript_delta",
            serde_json::json!("<think> 是口述内容"),
        ),
        stream_end(),
    ];
    let updates = run_dispatcher(chunks, Duration::ZERO).await;
    let last = updates.last().unwrap();
    assert_eq!(last.content, "<think> 是口述内容");
    assert_eq!(last.thinking, "");
}

#[tokio::test]
async fn throttling_suppresses_intermediate_updates_but_not_first_and_last() {
    let mut chunks: Vec<String> = (0..20).map(|i| text_delta(&format!("w{} ", i))).collect();
    chunks.push(stream_end());

    // A long interval admits only the unthrottled first and final updates.
    let updates = run_dispatcher(chunks.clone(), Duration::from_secs(3600)).await;
    assert_eq!(updates.len(), 2);
    let full: String = (0..20).map(|i| format!("w{} ", i)).collect();
    assert_eq!(updates.last().unwrap().content, full);

    // A zero interval emits every delta plus the final update.
    let updates = run_dispatcher(chunks, Duration::ZERO).await;
    assert_eq!(updates.len(), 21);
}

#[tokio::test]
async fn events_split_across_transport_chunks_are_reassembled() {
    let line = text_delta("split across chunks");
    let (a, b) = line.split_at(10);
    let chunks = vec![a.to_string(), b.to_string(), stream_end()];
    let updates = run_dispatcher(chunks, Duration::ZERO).await;
    assert_eq!(updates.last().unwrap().content, "split across chunks");
}

#[tokio::test]
async fn endless_line_without_newline_aborts_the_turn() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let config = DispatcherConfig {
        emit_interval: Duration::ZERO,
        splitter: SplitterConfig {
            max_buffer_size: 128,
            ..Default::default()
        },
    };
    let dispatcher = StreamDispatcher::new(config, tx);

    // A single data line that keeps growing past the cap, never terminated.
    let chunks = vec![
        format!("data: {{\"code\":1001,\"message\":\"text_delta\",\"data\":\"{}", "x".repeat(64)),
        "y".repeat(128),
    ];
    let stream = tokio_stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<Bytes, Infallible>(Bytes::from(chunk))),
    );
    dispatcher.run(stream).await;

    let mut updates = Vec::new();
    while let Ok(update) = rx.try_recv() {
        updates.push(update);
    }
    assert_eq!(updates.last().unwrap().content, SERVICE_ERROR_FALLBACK);
}

#[tokio::test]
async fn upstream_close_without_end_event_still_finalizes() {
    let chunks = vec![text_delta("{\"content\":\"完成\"}")];
    let updates = run_dispatcher(chunks, Duration::ZERO).await;
    assert_eq!(updates.last().unwrap().content, "完成");
}
