//! Envelope extraction tests: live convergence and strict finalization.

use fundflow_router::envelope::{
    detect_mode, extract_live_content, parse_envelope, ResponseMode,
};

#[test]
fn live_extraction_converges_to_strict_parse() {
    let full = r#"{"content":"办理前请确认：\n1. 已实名认证\t2. 无在途业务","card_type":"notice","card_message":"提示"}"#;

    let mut accumulated = String::new();
    let mut last_live = None;
    for ch in full.chars() {
        accumulated.push(ch);
        if let Some(live) = extract_live_content(&accumulated) {
            last_live = Some(live);
        }
    }

    let envelope = parse_envelope(full).unwrap();
    assert_eq!(last_live.unwrap(), envelope.content);
    assert_eq!(envelope.content, "办理前请确认：\n1. 已实名认证\t2. 无在途业务");
}

#[test]
fn fragmented_envelope_scenario() {
    let fragments = [
        "{\"content\":\"Hel",
        "lo\",\"card_typ",
        "e\":\"warning\",\"card_message\":\"careful\"}",
    ];

    let mut accumulated = String::new();

    accumulated.push_str(fragments[0]);
    assert_eq!(detect_mode(&accumulated), Some(ResponseMode::JsonEnvelope));
    assert_eq!(
        extract_live_content(&accumulated),
        Some("Hel".to_string())
    );

    accumulated.push_str(fragments[1]);
    assert_eq!(
        extract_live_content(&accumulated),
        Some("Hello".to_string())
    );

    accumulated.push_str(fragments[2]);
    let envelope = parse_envelope(&accumulated).unwrap();
    assert_eq!(envelope.content, "Hello");
    assert_eq!(envelope.card_type.as_deref(), Some("warning"));
    assert_eq!(envelope.card_message, "careful");
}

#[test]
fn prose_never_detects_as_envelope() {
    assert_eq!(
        detect_mode("您好，请问有什么可以帮您？"),
        Some(ResponseMode::PlainText)
    );
    assert!(parse_envelope("您好，请问有什么可以帮您？").is_none());
}

#[test]
fn mode_holds_even_when_the_envelope_turns_out_malformed() {
    // An opening brace decides JsonEnvelope; garbage afterwards is a
    // finalization failure, not a mode change.
    let text = "{\"content\": not json at all";
    assert_eq!(detect_mode(text), Some(ResponseMode::JsonEnvelope));
    assert!(parse_envelope(text).is_none());
}

#[test]
fn envelope_with_selection_list() {
    let text = r#"{
        "content": "请选择提取类型",
        "card_type": "type_select",
        "card_message": "",
        "list": [
            {"id": "1", "name": "租房提取"},
            {"id": "2", "name": "购房提取"}
        ]
    }"#;
    let envelope = parse_envelope(text).unwrap();
    assert_eq!(envelope.card_type.as_deref(), Some("type_select"));
    let list = envelope.list.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].name, "购房提取");
}

#[test]
fn escapes_never_reach_the_display_raw() {
    let live = extract_live_content(r#"{"content":"第一行\n第二行\\结尾"#).unwrap();
    assert_eq!(live, "第一行\n第二行\\结尾");
    assert!(!live.contains("\\n"));
}
