//! Memory backend integration tests
//!
//! End-to-end tests driving a full `Console` over the in-memory backend.
//! Covers the send cycle, transcript loading, tool selection, the system
//! prompt, metrics hand-off, banners and teardown.

use a3s_console::{
    AgentResponse, ChatEvent, Console, ConsoleConfig, Endpoint, Fault, MemoryBackend, Message,
    MetricsView, NotificationKind, SendOutcome, SummarySection, ToolCatalog, TranscriptEntry,
};
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;

fn test_console(backend: &MemoryBackend) -> Console {
    Console::new(ConsoleConfig::default(), Arc::new(backend.clone()))
}

fn reply_with_metrics(text: &str) -> AgentResponse {
    serde_json::from_value(serde_json::json!({
        "messages": {"role": "assistant", "content": [{"text": text}]},
        "latencyMs": 850,
        "totalTokens": 300,
        "total_cycles": 2,
        "total_duration": 0.85,
        "average_cycle_time": 0.425,
        "tool_usage": {
            "calculator": {"execution_stats": {"call_count": 3, "success_rate": 0.6667, "average_time": 0.012}},
            "think": {"execution_stats": {"call_count": 1, "success_rate": 1.0, "average_time": 0.4}}
        },
        "accumulated_usage": {"totalTokens": 300, "inputTokens": 260, "outputTokens": 40},
        "accumulated_metrics": {"latencyMs": 850}
    }))
    .unwrap()
}

// ─── Transcript Loading ──────────────────────────────────────────

#[tokio::test]
async fn test_empty_conversation_renders_single_welcome() {
    let backend = MemoryBackend::new();
    let console = test_console(&backend);

    console.chat().load_conversation("u1").await.unwrap();

    let transcript = console.chat().transcript();
    assert_eq!(transcript.len(), 1);
    assert_eq!(
        transcript[0],
        TranscriptEntry::Welcome("Welcome! How can I help you today?".to_string())
    );
    assert!(console.notifications().banners().is_empty());
}

#[tokio::test]
async fn test_switching_user_rebuilds_transcript() {
    let backend = MemoryBackend::new()
        .with_conversation("alice", vec![Message::user("hi"), Message::assistant("hello alice")])
        .with_conversation("bob", vec![Message::user("yo")]);
    let console = test_console(&backend);

    console.chat().set_user_id("alice").await.unwrap();
    assert_eq!(console.chat().transcript().len(), 2);

    console.chat().set_user_id("bob").await.unwrap();
    assert_eq!(console.chat().transcript(), vec![TranscriptEntry::user("yo")]);
    assert_eq!(console.chat().user_id(), "bob");
}

#[tokio::test]
async fn test_sent_messages_survive_reload() {
    let backend = MemoryBackend::new();
    let console = test_console(&backend);

    console.chat().send_message("first question", "u1").await.unwrap();
    console.chat().load_conversation("u1").await.unwrap();

    assert_eq!(
        console.chat().transcript(),
        vec![
            TranscriptEntry::user("first question"),
            TranscriptEntry::assistant("You said: first question"),
        ]
    );
}

// ─── Send Cycle ──────────────────────────────────────────────────

#[tokio::test]
async fn test_send_end_to_end() {
    let backend = MemoryBackend::new();
    let mut reply = AgentResponse::text("4");
    reply.latency_ms = Some(120);
    reply.total_tokens = Some(42);
    backend.push_reply(reply);
    let console = test_console(&backend);

    let outcome = console.chat().send_message("2+2", "u1").await.unwrap();
    assert_eq!(outcome, SendOutcome::Delivered);

    assert_eq!(
        console.chat().transcript(),
        vec![TranscriptEntry::user("2+2"), TranscriptEntry::assistant("4")]
    );
    assert_eq!(console.chat().latency(), "120 ms");
    assert_eq!(console.chat().tokens(), "42");
}

#[tokio::test]
async fn test_whitespace_send_makes_no_call() {
    let backend = MemoryBackend::new();
    let console = test_console(&backend);

    for text in ["", " ", "\n\t  "] {
        let outcome = console.chat().send_message(text, "u1").await.unwrap();
        assert_eq!(outcome, SendOutcome::Empty);
    }
    assert!(console.chat().transcript().is_empty());
    assert!(backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_sends_admit_one() {
    let backend = MemoryBackend::new();
    backend.delay_next(Endpoint::Agent, Duration::from_millis(500));
    let console = test_console(&backend);

    let (a, b) = tokio::join!(
        console.chat().send_message("one", "u1"),
        console.chat().send_message("two", "u1")
    );
    assert_eq!(a.unwrap(), SendOutcome::Delivered);
    assert_eq!(b.unwrap(), SendOutcome::Busy);

    let users: Vec<_> = console
        .chat()
        .transcript()
        .into_iter()
        .filter(|e| matches!(e, TranscriptEntry::Message { speaker: a3s_console::Speaker::User, .. }))
        .collect();
    assert_eq!(users, vec![TranscriptEntry::user("one")]);
    assert_eq!(backend.call_count(Endpoint::Agent), 1);
}

#[tokio::test]
async fn test_placeholder_never_stranded() {
    let backend = MemoryBackend::new();
    backend.fail_next(Endpoint::Agent, Fault::Status(502));
    backend.fail_next(Endpoint::Agent, Fault::Malformed("expected value".into()));
    let console = test_console(&backend);

    for prompt in ["fails with status", "fails to decode", "succeeds"] {
        let _ = console.chat().send_message(prompt, "u1").await;
        assert!(!console
            .chat()
            .transcript()
            .iter()
            .any(TranscriptEntry::is_placeholder));
        assert!(!console.chat().is_busy());
    }

    // both failed user messages remain, followed by the successful exchange
    assert_eq!(console.chat().transcript().len(), 4);
    let errors = console
        .notifications()
        .banners()
        .into_iter()
        .filter(|b| b.kind == NotificationKind::Error)
        .count();
    assert_eq!(errors, 2);
}

#[tokio::test]
async fn test_chat_event_stream() {
    let backend = MemoryBackend::new();
    let console = test_console(&backend);
    let mut events = console.chat().listeners().stream();

    console.chat().send_message("ping", "u1").await.unwrap();

    let first = events.next().await.unwrap();
    assert_eq!(first, ChatEvent::Appended(TranscriptEntry::user("ping")));

    drop(events);
    assert!(console.chat().listeners().is_empty());
}

// ─── Metrics Hand-off ────────────────────────────────────────────

#[tokio::test]
async fn test_send_forwards_metrics() {
    let backend = MemoryBackend::new();
    backend.push_reply(reply_with_metrics("done"));
    let console = test_console(&backend);

    console.chat().send_message("compute", "u1").await.unwrap();

    let MetricsView::Summary(sections) = console.metrics().view() else {
        panic!("expected a rendered summary");
    };
    assert_eq!(sections.len(), 4);

    let SummarySection::ToolUsage(rows) = &sections[1] else {
        panic!("expected tool usage second");
    };
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].name, "calculator");
    assert_eq!(rows[0].items[1].value, "66.7%");
    assert_eq!(rows[1].items[1].value, "100.0%");
}

#[tokio::test]
async fn test_metrics_replaced_not_accumulated() {
    let backend = MemoryBackend::new();
    backend.push_reply(reply_with_metrics("first"));
    backend.push_reply(AgentResponse::text("second"));
    let console = test_console(&backend);

    console.chat().send_message("a", "u1").await.unwrap();
    console.chat().send_message("b", "u1").await.unwrap();

    assert_eq!(console.metrics().view(), MetricsView::Summary(Vec::new()));
    assert_eq!(console.chat().latency(), "0 ms");
    assert_eq!(console.chat().tokens(), "0");
}

#[tokio::test]
async fn test_echo_reply_uses_nested_summary() {
    let backend = MemoryBackend::new();
    let console = test_console(&backend);

    console.chat().send_message("hello world", "u1").await.unwrap();

    let MetricsView::Summary(sections) = console.metrics().view() else {
        panic!("expected a rendered summary");
    };
    let titles: Vec<&str> = sections.iter().map(|s| s.title()).collect();
    // echo replies carry an empty tool_usage map
    assert_eq!(
        titles,
        vec!["Cycle Statistics", "Token Usage", "Accumulated Metrics"]
    );
}

// ─── Tool Catalog ────────────────────────────────────────────────

#[tokio::test]
async fn test_catalog_checkboxes_and_update() {
    let backend = MemoryBackend::new().with_catalog(ToolCatalog {
        available: vec!["a".into(), "b".into(), "c".into()],
        selected: vec!["b".into()],
        descriptions: Default::default(),
    });
    let console = test_console(&backend);

    console.tools().init().await.unwrap();
    let checked: Vec<bool> = console.tools().rows().iter().map(|r| r.checked).collect();
    assert_eq!(checked, vec![false, true, false]);

    console.tools().toggle("a");
    console.tools().toggle("c");
    console.tools().toggle("c");
    console.tools().toggle("c");
    assert!(console.tools().update().await.unwrap());

    let calls = backend.calls();
    let submitted = calls
        .iter()
        .rev()
        .find(|c| c.endpoint == Endpoint::UpdateTools)
        .unwrap();
    let mut tools: Vec<String> = serde_json::from_value(submitted.payload["tools"].clone()).unwrap();
    tools.sort();
    assert_eq!(tools, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_tool_update_transport_failure() {
    let backend = MemoryBackend::new();
    let console = test_console(&backend);
    console.tools().init().await.unwrap();
    backend.fail_next(Endpoint::UpdateTools, Fault::Transport("reset".into()));

    assert!(console.tools().update().await.is_err());
    let banners = console.notifications().banners();
    assert_eq!(banners.len(), 1);
    assert_eq!(banners[0].message, "Error updating tools");
    // backend state untouched
    assert_eq!(backend.selected_tools(), vec!["calculator", "http_request", "use_aws"]);
}

// ─── System Prompt ───────────────────────────────────────────────

#[tokio::test]
async fn test_prompt_save_is_last_writer_wins() {
    let backend = MemoryBackend::new();
    let console = test_console(&backend);

    console.prompt().save("first").await.unwrap();
    console.prompt().save("second").await.unwrap();
    assert_eq!(backend.current_system_prompt(), "second");

    console.prompt().load().await.unwrap();
    assert_eq!(console.prompt().field(), "second");
}

// ─── Banners & Teardown ──────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_error_banner_auto_dismisses() {
    let backend = MemoryBackend::new();
    backend.fail_next(Endpoint::Agent, Fault::Status(500));
    let console = test_console(&backend);

    let _ = console.chat().send_message("hi", "u1").await;
    assert_eq!(console.notifications().banners().len(), 1);

    tokio::time::sleep(Duration::from_millis(100 + 5_000 + 300 + 1)).await;
    assert!(console.notifications().banners().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_leaves_no_timers() {
    let backend = MemoryBackend::new();
    backend.fail_next(Endpoint::GetSystemPrompt, Fault::Status(500));
    backend.fail_next(Endpoint::Conversations, Fault::Status(500));
    let console = test_console(&backend);

    let report = console.start().await;
    assert!(report.conversation.is_err());
    assert!(report.system_prompt.is_err());
    assert!(report.tools.is_ok());
    assert_eq!(console.notifications().pending_timers(), 2);

    console.teardown();
    assert_eq!(console.notifications().pending_timers(), 0);
    assert!(console.notifications().banners().is_empty());
}
