//! End-to-end replays: SSE text through an adapter and the event emitter

use execstream_core::prelude::*;
use execstream_core::{get_adapter, TurnState};
use futures::stream::{self, StreamExt};

/// Replay SSE text split on newlines, as a line codec would deliver it
async fn replay(adapter: &str, sse: &str) -> Vec<Event> {
    let lines: Vec<std::io::Result<String>> = sse.lines().map(|l| Ok(l.to_string())).collect();
    let deltas = decode_lines(get_adapter(adapter), stream::iter(lines));

    StreamEventEmitter::new(EmitterConfig::default())
        .unwrap()
        .into_stream(deltas)
        .collect()
        .await
}

fn openai_chunk(delta: serde_json::Value) -> String {
    let chunk = serde_json::json!({
        "id": "chatcmpl-9",
        "object": "chat.completion.chunk",
        "model": "gpt-4o",
        "choices": [{"index": 0, "delta": delta, "finish_reason": null}],
    });
    format!("data: {}\n\n", chunk)
}

fn tool_args(fragment: &str) -> String {
    openai_chunk(serde_json::json!({
        "tool_calls": [{"index": 0, "function": {"arguments": fragment}}]
    }))
}

#[tokio::test]
async fn test_plain_text_turn() {
    let sse = [
        openai_chunk(serde_json::json!({"role": "assistant", "content": ""})),
        openai_chunk(serde_json::json!({"content": "Hello"})),
        openai_chunk(serde_json::json!({"content": " there"})),
        "data: [DONE]\n".to_string(),
    ]
    .concat();

    assert_eq!(
        replay("openai", &sse).await,
        vec![Event::message("Hello"), Event::message(" there")]
    );
}

#[tokio::test]
async fn test_code_turn_with_review() {
    let sse = [
        openai_chunk(serde_json::json!({"content": "I'll list the files."})),
        openai_chunk(serde_json::json!({
            "tool_calls": [{"index": 0, "id": "call_1", "type": "function",
                            "function": {"name": "execute", "arguments": ""}}]
        })),
        tool_args(r#"{"language": "sh"#),
        tool_args(r#"ell", "code": "ls -"#),
        tool_args(r#"la\n"}"#),
        openai_chunk(serde_json::json!({"content": "This only <sa"})),
        openai_chunk(serde_json::json!({"content": "fe>reads the directory.</safe>"})),
        "data: [DONE]\n".to_string(),
    ]
    .concat();

    assert_eq!(
        replay("openai", &sse).await,
        vec![
            Event::message("I'll list the files."),
            Event::code("shell", "ls -"),
            Event::code("shell", "la\n"),
            Event::review(ReviewCategory::Safe, "reads the directory."),
        ]
    );
}

#[tokio::test]
async fn test_legacy_function_call_dialect() {
    let sse = [
        openai_chunk(serde_json::json!({"function_call": {"name": "execute", "arguments": ""}})),
        openai_chunk(serde_json::json!({"function_call": {"arguments": "{\"language\": \"python\", \"code\": \"x"}})),
        openai_chunk(serde_json::json!({"function_call": {"arguments": " = 1\"}"}})),
        openai_chunk(serde_json::json!({"content": "Set x."})),
    ]
    .concat();

    assert_eq!(
        replay("openai", &sse).await,
        vec![
            Event::code("python", "x"),
            Event::code("python", " = 1"),
            Event::message("Set x."),
        ]
    );
}

#[tokio::test]
async fn test_hallucinated_python_function() {
    let sse = [
        openai_chunk(serde_json::json!({
            "tool_calls": [{"index": 0, "function": {"name": "python", "arguments": "import os\n"}}]
        })),
        tool_args("print(os.getcwd())"),
    ]
    .concat();

    assert_eq!(
        replay("openai", &sse).await,
        vec![
            Event::code("python", "import os\n"),
            Event::code("python", "print(os.getcwd())"),
        ]
    );
}

#[tokio::test]
async fn test_unrecognized_tool_ends_stream() {
    let sse = [
        openai_chunk(serde_json::json!({
            "tool_calls": [{"index": 0, "function": {"name": "browse_web", "arguments": ""}}]
        })),
        tool_args(r#"{"url": "https://example.com"}"#),
        openai_chunk(serde_json::json!({"content": "unreachable"})),
    ]
    .concat();

    assert_eq!(
        replay("openai", &sse).await,
        vec![Event::code("python", "browse_web")]
    );
}

#[tokio::test]
async fn test_unrecognized_tool_name_streamed_in_pieces() {
    let sse = [
        openai_chunk(serde_json::json!({
            "tool_calls": [{"index": 0, "function": {"name": "draw", "arguments": ""}}]
        })),
        openai_chunk(serde_json::json!({
            "tool_calls": [{"index": 0, "function": {"name": "_picture"}}]
        })),
        "data: [DONE]\n".to_string(),
    ]
    .concat();

    assert_eq!(
        replay("openai", &sse).await,
        vec![Event::code("python", "draw_picture")]
    );
}

#[tokio::test]
async fn test_undecodable_lines_are_skipped() {
    let sse = [
        ": keep-alive\n".to_string(),
        "data: {\"choices\": [\n".to_string(),
        openai_chunk(serde_json::json!({"content": "still here"})),
    ]
    .concat();

    assert_eq!(replay("openai", &sse).await, vec![Event::message("still here")]);
}

#[tokio::test]
async fn test_anthropic_code_turn() {
    let sse = r#"event: message_start
data: {"type":"message_start","message":{"id":"msg_1","type":"message","role":"assistant","model":"claude-3-5-sonnet","content":[]}}

event: content_block_start
data: {"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}

event: content_block_delta
data: {"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Checking the date."}}

event: content_block_stop
data: {"type":"content_block_stop","index":0}

event: content_block_start
data: {"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_01","name":"execute","input":{}}}

event: content_block_delta
data: {"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":""}}

event: content_block_delta
data: {"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"language\": \"shell\", \"code\": \"da"}}

event: content_block_delta
data: {"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"te\"}"}}

event: content_block_stop
data: {"type":"content_block_stop","index":1}

event: message_stop
data: {"type":"message_stop"}
"#;

    assert_eq!(
        replay("anthropic", sse).await,
        vec![
            Event::message("Checking the date."),
            Event::code("shell", "da"),
            Event::code("shell", "te"),
        ]
    );
}

#[test]
fn test_review_scenario_with_emitter_state() {
    let mut emitter = StreamEventEmitter::new(EmitterConfig::default()).unwrap();
    emitter.process(Delta::tool_call(0, FunctionCallDelta::name("execute")));
    emitter.process(Delta::tool_call(
        0,
        FunctionCallDelta::arguments(r#"{"language": "shell", "code": "rm -rf build"}"#),
    ));

    assert!(emitter.process(Delta::content("Looks ")).is_empty());
    assert_eq!(
        emitter.process(Delta::content("<warning>risky ")),
        vec![Event::review(ReviewCategory::Warning, "risky ")]
    );
    assert_eq!(
        emitter.process(Delta::content("command</warning>")),
        vec![Event::review(ReviewCategory::Warning, "command")]
    );
    assert!(emitter.finish().is_empty());

    assert_eq!(
        emitter.state(),
        &TurnState::Done {
            language: Some("shell".to_string())
        }
    );
    assert_eq!(emitter.language(), Some("shell"));
    assert_eq!(emitter.review_category(), Some(ReviewCategory::Warning));
    assert_eq!(emitter.emitted_code(), "rm -rf build");
}

#[test]
fn test_event_wire_format() {
    let events = [
        Event::message("hi"),
        Event::code("python", "1"),
        Event::review(ReviewCategory::Unsafe, "no"),
    ];
    let json: Vec<String> = events.iter().map(|e| serde_json::to_string(e).unwrap()).collect();

    assert_eq!(json[0], r#"{"type":"message","content":"hi"}"#);
    assert_eq!(json[1], r#"{"type":"code","format":"python","content":"1"}"#);
    assert_eq!(json[2], r#"{"type":"review","format":"unsafe","content":"no"}"#);
}
