//! Turn graph integration tests.

use mnemos_config::ToolPolicy;
use mnemos_core::{
    CancellationToken, CoreError, Engine, EngineSettings, ThreadStore, TurnRequest,
};
use mnemos_memory::{InMemoryVectorStore, JsonlVectorStore, MemoryStore};
use mnemos_protocol::{EventPayload, Message, Role, ToolCall};
use mnemos_test_utils::{
    DownStore, FailingModel, LoopingModel, RecordingEmbedder, RecordingSink, ScriptedModel,
    SlowModel, StubWebProvider, memory_store, memory_store_over, tool_services,
};
use mnemos_tools::{MEMORY_STORED, ToolRegistry, ToolServices, WebSearchResult};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }
}

fn engine(model: ScriptedModel, memory: Arc<MemoryStore>) -> Engine {
    Engine::builder(Arc::new(model), tool_services(memory)).build()
}

#[tokio::test]
async fn direct_reply_ends_after_one_agent_step() {
    let model = ScriptedModel::new(vec![Message::assistant("Hello!")]);
    let requests = model.requests();
    let engine = engine(model, memory_store());

    let result = engine
        .invoke(TurnRequest::new("u1", "t1", "hi"), CancellationToken::new())
        .await
        .expect("turn");

    assert_eq!(result.final_message, "Hello!");
    assert_eq!(result.iterations, 1);
    assert_eq!(result.transcript.len(), 2);
    assert_eq!(result.transcript[0].role, Role::User);
    assert_eq!(result.transcript[1].role, Role::Assistant);

    let requests = requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tools.len(), 4);
    assert!(requests[0].system_prompt.contains("<core_memory>"));
    assert!(requests[0].system_prompt.contains("Current system time:"));
}

#[tokio::test]
async fn tool_batch_returns_to_agent() {
    let memory = memory_store();
    let model = ScriptedModel::new(vec![
        Message::assistant_with_tool_calls(
            "",
            vec![call(
                "call_1",
                "save_recall_memory",
                json!({ "memory": "User likes green tea" }),
            )],
        ),
        Message::assistant("Noted."),
    ]);
    let requests = model.requests();
    let engine = engine(model, memory.clone());

    let result = engine
        .invoke(
            TurnRequest::new("u1", "t1", "I like green tea"),
            CancellationToken::new(),
        )
        .await
        .expect("turn");

    assert_eq!(result.final_message, "Noted.");
    assert_eq!(result.iterations, 2);
    let roles: Vec<Role> = result.transcript.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
    );
    assert_eq!(result.transcript[2].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(result.transcript[2].content, "User likes green tea");

    let requests = requests.lock();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].messages.len(), 3);
    assert_eq!(requests[1].messages[2].role, Role::Tool);

    let recalled = memory
        .search_recall("u1", "green tea", 5)
        .await
        .expect("search");
    assert_eq!(recalled, vec!["User likes green tea".to_string()]);
}

#[tokio::test]
async fn batched_calls_run_in_request_order() {
    let memory = memory_store();
    let model = ScriptedModel::new(vec![
        Message::assistant_with_tool_calls(
            "",
            vec![
                call("call_a", "store_core_memory", json!({ "memory": "Name: Ada" })),
                call("call_b", "store_core_memory", json!({ "memory": "Lives in Oslo" })),
            ],
        ),
        Message::assistant("Got it."),
    ]);
    let engine = engine(model, memory.clone());

    let result = engine
        .invoke(TurnRequest::new("u1", "t1", "hello"), CancellationToken::new())
        .await
        .expect("turn");

    let tool_ids: Vec<Option<String>> = result
        .transcript
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.tool_call_id.clone())
        .collect();
    assert_eq!(
        tool_ids,
        vec![Some("call_a".to_string()), Some("call_b".to_string())]
    );
    let core = memory.fetch_core("u1").await.expect("core");
    assert_eq!(
        core.memories,
        vec!["Lives in Oslo".to_string(), "Name: Ada".to_string()]
    );
    assert_eq!(result.core_memories, Vec::<String>::new());
}

#[tokio::test]
async fn failed_call_does_not_stop_the_batch() {
    let memory = memory_store();
    let model = ScriptedModel::new(vec![
        Message::assistant_with_tool_calls(
            "",
            vec![
                call("call_bad", "search_memory", json!({})),
                call("call_missing", "launch_rockets", json!({})),
                call("call_ok", "store_core_memory", json!({ "memory": "Prefers tea" })),
            ],
        ),
        Message::assistant("Done."),
    ]);
    let engine = engine(model, memory.clone());

    let result = engine
        .invoke(TurnRequest::new("u1", "t1", "hello"), CancellationToken::new())
        .await
        .expect("turn");

    let outputs: Vec<&str> = result
        .transcript
        .iter()
        .filter(|m| m.role == Role::Tool)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(outputs.len(), 3);
    assert!(outputs[0].starts_with("Error: invalid arguments"));
    assert_eq!(outputs[1], "Error: tool not found: launch_rockets");
    assert_eq!(outputs[2], MEMORY_STORED);
    assert_eq!(result.final_message, "Done.");
    let core = memory.fetch_core("u1").await.expect("core");
    assert_eq!(core.memories, vec!["Prefers tea".to_string()]);
}

#[tokio::test]
async fn loaded_memories_reach_the_prompt() {
    let memory = memory_store();
    memory
        .upsert_core("u1", &["Name: Ada".to_string()], None)
        .await
        .expect("seed core");
    memory
        .append_recall("u1", "Ada visited Japan last spring")
        .await
        .expect("seed recall");
    memory
        .append_recall("u2", "Someone else's secret")
        .await
        .expect("seed other owner");
    let model = ScriptedModel::new(vec![Message::assistant("Welcome back, Ada.")]);
    let requests = model.requests();
    let engine = engine(model, memory);

    let result = engine
        .invoke(
            TurnRequest::new("u1", "t1", "Tell me about my trip to Japan"),
            CancellationToken::new(),
        )
        .await
        .expect("turn");

    assert_eq!(result.core_memories, vec!["Name: Ada".to_string()]);
    assert_eq!(
        result.recall_memories,
        vec!["Ada visited Japan last spring".to_string()]
    );
    let prompt = requests.lock()[0].system_prompt.clone();
    assert!(prompt.contains("Name: Ada"));
    assert!(prompt.contains("Ada visited Japan last spring"));
    assert!(!prompt.contains("secret"));
}

#[tokio::test]
async fn iteration_guard_aborts_tool_loops() {
    let model = LoopingModel::new("search_memory", json!({ "query": "anything" }));
    let threads = ThreadStore::new();
    let engine = Engine::builder(Arc::new(model.clone()), tool_services(memory_store()))
        .settings(EngineSettings {
            max_iterations: 3,
            ..EngineSettings::default()
        })
        .threads(threads.clone())
        .build();

    let err = engine
        .invoke(TurnRequest::new("u1", "t1", "loop"), CancellationToken::new())
        .await
        .expect_err("guard");

    assert!(matches!(err, CoreError::TurnAborted { iterations: 3 }));
    assert_eq!(model.call_count(), 3);
    assert!(threads.history("u1", "t1").is_empty());
}

#[tokio::test]
async fn cancelled_token_stops_before_any_call() {
    let model = ScriptedModel::new(vec![Message::assistant("never")]);
    let engine = engine(model.clone(), memory_store());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = engine
        .invoke(TurnRequest::new("u1", "t1", "hi"), cancel)
        .await
        .expect_err("cancelled");

    assert!(matches!(err, CoreError::Cancelled));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn cancellation_interrupts_a_model_call() {
    let engine = Engine::builder(
        Arc::new(SlowModel::new(Duration::from_secs(30), "late")),
        tool_services(memory_store()),
    )
    .build();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = engine
        .invoke(TurnRequest::new("u1", "t1", "hi"), cancel)
        .await
        .expect_err("cancelled");

    assert!(matches!(err, CoreError::Cancelled));
    assert!(engine.threads().history("u1", "t1").is_empty());
}

#[tokio::test]
async fn slow_model_call_times_out() {
    let engine = Engine::builder(
        Arc::new(SlowModel::new(Duration::from_secs(30), "late")),
        tool_services(memory_store()),
    )
    .settings(EngineSettings {
        call_timeout: Duration::from_millis(50),
        ..EngineSettings::default()
    })
    .build();

    let err = engine
        .invoke(TurnRequest::new("u1", "t1", "hi"), CancellationToken::new())
        .await
        .expect_err("timeout");

    assert!(matches!(
        err,
        CoreError::Timeout {
            operation: "model call",
            ..
        }
    ));
}

#[tokio::test]
async fn store_outage_fails_the_turn() {
    let model = ScriptedModel::new(vec![Message::assistant("never")]);
    let engine = engine(model.clone(), memory_store_over(Arc::new(DownStore)));

    let err = engine
        .invoke(TurnRequest::new("u1", "t1", "hi"), CancellationToken::new())
        .await
        .expect_err("outage");

    assert!(matches!(err, CoreError::StoreUnavailable(_)));
    assert_eq!(model.call_count(), 0);
}

#[tokio::test]
async fn model_failure_is_reported() {
    let engine = Engine::builder(Arc::new(FailingModel), tool_services(memory_store())).build();

    let err = engine
        .invoke(TurnRequest::new("u1", "t1", "hi"), CancellationToken::new())
        .await
        .expect_err("model error");

    assert!(matches!(err, CoreError::Model(_)));
    assert_eq!(err.to_string(), "model error: model API error 500: boom");
}

#[tokio::test]
async fn thread_history_carries_across_turns() {
    let model = ScriptedModel::new(vec![
        Message::assistant("Hi Ada."),
        Message::assistant("You said your name is Ada."),
        Message::assistant("Who are you?"),
    ]);
    let requests = model.requests();
    let engine = engine(model, memory_store());

    engine
        .invoke(TurnRequest::new("u1", "t1", "I'm Ada"), CancellationToken::new())
        .await
        .expect("first turn");
    engine
        .invoke(
            TurnRequest::new("u1", "t1", "What's my name?"),
            CancellationToken::new(),
        )
        .await
        .expect("second turn");
    engine
        .invoke(
            TurnRequest::new("u1", "t2", "What's my name?"),
            CancellationToken::new(),
        )
        .await
        .expect("other thread");

    let requests = requests.lock();
    assert_eq!(requests[1].messages.len(), 3);
    assert_eq!(requests[1].messages[0].content, "I'm Ada");
    assert_eq!(requests[1].messages[1].content, "Hi Ada.");
    assert_eq!(requests[2].messages.len(), 1);
    assert_eq!(engine.threads().history("u1", "t1").len(), 4);
}

#[tokio::test]
async fn events_follow_the_turn_lifecycle() {
    let sink = Arc::new(RecordingSink::new());
    let model = ScriptedModel::new(vec![
        Message::assistant_with_tool_calls(
            "",
            vec![call("call_1", "search_memory", json!({ "query": "tea" }))],
        ),
        Message::assistant("Nothing yet."),
    ]);
    let engine = Engine::builder(Arc::new(model), tool_services(memory_store()))
        .event_sink(sink.clone())
        .build();

    let result = engine
        .invoke(TurnRequest::new("u1", "t1", "tea?"), CancellationToken::new())
        .await
        .expect("turn");

    let kinds: Vec<&'static str> = sink
        .payloads()
        .iter()
        .map(|payload| match payload {
            EventPayload::TurnStarted { .. } => "turn_started",
            EventPayload::MemoriesLoaded { .. } => "memories_loaded",
            EventPayload::ToolCallStarted { .. } => "tool_call_started",
            EventPayload::ToolCallFinished { .. } => "tool_call_finished",
            EventPayload::TurnCompleted { .. } => "turn_completed",
            EventPayload::Error { .. } => "error",
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            "turn_started",
            "memories_loaded",
            "tool_call_started",
            "tool_call_finished",
            "turn_completed"
        ]
    );
    let events = sink.events();
    assert!(events.iter().all(|event| event.owner_id == "u1"));
    match &events[3].payload {
        EventPayload::ToolCallFinished {
            turn_id,
            result: output,
            success,
            ..
        } => {
            assert_eq!(*turn_id, result.turn_id);
            assert_eq!(output, "[]");
            assert!(*success);
        }
        other => panic!("unexpected payload: {other:?}"),
    }
}

#[tokio::test]
async fn disabled_tools_are_not_bound() {
    let model = ScriptedModel::new(vec![
        Message::assistant_with_tool_calls(
            "",
            vec![call("call_1", "web_search", json!({ "query": "weather" }))],
        ),
        Message::assistant("I can't browse."),
    ]);
    let requests = model.requests();
    let policy = ToolPolicy {
        allow: vec!["*".to_string()],
        deny: vec!["web_search".to_string()],
    };
    let engine = Engine::builder(Arc::new(model), tool_services(memory_store()))
        .registry(ToolRegistry::with_policy(&policy))
        .build();

    let result = engine
        .invoke(TurnRequest::new("u1", "t1", "weather?"), CancellationToken::new())
        .await
        .expect("turn");

    assert_eq!(requests.lock()[0].tools.len(), 3);
    assert_eq!(
        result.transcript[2].content,
        "Error: tool not found: web_search"
    );
}

#[tokio::test]
async fn jsonl_memories_survive_a_new_engine() {
    let temp = tempdir().expect("tempdir");
    {
        let store = JsonlVectorStore::open(temp.path()).expect("open store");
        let model = ScriptedModel::new(vec![
            Message::assistant_with_tool_calls(
                "",
                vec![call("call_1", "store_core_memory", json!({ "memory": "Name: Ada" }))],
            ),
            Message::assistant("Nice to meet you."),
        ]);
        engine(model, memory_store_over(Arc::new(store)))
            .invoke(TurnRequest::new("u1", "t1", "I'm Ada"), CancellationToken::new())
            .await
            .expect("first turn");
    }

    let store = JsonlVectorStore::open(temp.path()).expect("reopen store");
    let model = ScriptedModel::new(vec![Message::assistant("Hi Ada.")]);
    let requests = model.requests();
    let result = engine(model, memory_store_over(Arc::new(store)))
        .invoke(TurnRequest::new("u1", "t9", "hello"), CancellationToken::new())
        .await
        .expect("second turn");

    assert_eq!(result.core_memories, vec!["Name: Ada".to_string()]);
    assert!(requests.lock()[0].system_prompt.contains("Name: Ada"));
}

#[tokio::test]
async fn embedding_outage_during_a_tool_call_fails_the_turn() {
    let store = Arc::new(InMemoryVectorStore::new());
    // The recall lookup at turn start succeeds; the save that follows does not.
    let embedder = Arc::new(RecordingEmbedder::failing_after(1));
    let memory = Arc::new(MemoryStore::new(store.clone(), embedder.clone()));
    let model = ScriptedModel::new(vec![
        Message::assistant_with_tool_calls(
            "",
            vec![call(
                "call_1",
                "save_recall_memory",
                json!({ "memory": "User plays the cello" }),
            )],
        ),
        Message::assistant("Saved."),
    ]);
    let engine = engine(model.clone(), memory);

    let err = engine
        .invoke(
            TurnRequest::new("u1", "t1", "I play the cello"),
            CancellationToken::new(),
        )
        .await
        .expect_err("embedding outage");

    assert!(matches!(err, CoreError::StoreUnavailable(_)));
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(embedder.texts().len(), 2);
    assert!(store.is_empty());
    assert_eq!(model.call_count(), 1);
    assert!(engine.threads().history("u1", "t1").is_empty());
}

#[tokio::test]
async fn recall_query_follows_the_latest_message() {
    let embedder = Arc::new(RecordingEmbedder::new());
    let memory = Arc::new(MemoryStore::new(
        Arc::new(InMemoryVectorStore::new()),
        embedder.clone(),
    ));
    let threads = ThreadStore::new();
    threads.append(
        "u1",
        "t1",
        &[
            Message::user("a long story about my childhood ".repeat(20)),
            Message::assistant("What a story."),
        ],
    );
    let model = ScriptedModel::new(vec![Message::assistant("Oslo.")]);
    let engine = Engine::builder(Arc::new(model), tool_services(memory))
        .settings(EngineSettings {
            recall_query_token_budget: 8,
            ..EngineSettings::default()
        })
        .threads(threads)
        .build();

    engine
        .invoke(
            TurnRequest::new("u1", "t1", "where do I live?"),
            CancellationToken::new(),
        )
        .await
        .expect("turn");

    let texts = embedder.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].ends_with("Human: where do I live?"));
    assert!(texts[0].len() <= 32);
}

#[tokio::test]
async fn history_window_bounds_replayed_messages() {
    let model = ScriptedModel::new(vec![
        Message::assistant("one"),
        Message::assistant("two"),
        Message::assistant("three"),
    ]);
    let requests = model.requests();
    let engine = Engine::builder(Arc::new(model), tool_services(memory_store()))
        .settings(EngineSettings {
            max_history_messages: 2,
            ..EngineSettings::default()
        })
        .build();

    for text in ["first", "second", "third"] {
        engine
            .invoke(TurnRequest::new("u1", "t1", text), CancellationToken::new())
            .await
            .expect("turn");
    }

    let requests = requests.lock();
    let contents: Vec<&str> = requests[2]
        .messages
        .iter()
        .map(|message| message.content.as_str())
        .collect();
    assert_eq!(contents, vec!["second", "two", "third"]);
    let history = engine.threads().history("u1", "t1");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "third");
}

#[tokio::test]
async fn web_search_results_reach_the_model() {
    let provider = Arc::new(StubWebProvider::new(vec![WebSearchResult {
        title: "Rust 2024 edition".to_string(),
        url: "https://doc.rust-lang.org/edition-guide/rust-2024/".to_string(),
        snippet: "The 2024 edition was released with Rust 1.85.".to_string(),
    }]));
    let services = ToolServices::new(memory_store()).with_web(provider.clone());
    let model = ScriptedModel::new(vec![
        Message::assistant_with_tool_calls(
            "",
            vec![call("call_web", "web_search", json!({ "query": "rust 2024 edition" }))],
        ),
        Message::assistant("It shipped with Rust 1.85."),
    ]);
    let requests = model.requests();
    let engine = Engine::builder(Arc::new(model), Arc::new(services)).build();

    let result = engine
        .invoke(
            TurnRequest::new("u1", "t1", "When did the 2024 edition ship?"),
            CancellationToken::new(),
        )
        .await
        .expect("turn");

    assert_eq!(result.final_message, "It shipped with Rust 1.85.");
    assert_eq!(
        provider.queries(),
        vec![("rust 2024 edition".to_string(), 1)]
    );
    let requests = requests.lock();
    let tool_message = requests[1].messages.last().expect("tool result");
    assert_eq!(tool_message.role, Role::Tool);
    assert!(tool_message.content.contains("https://doc.rust-lang.org/edition-guide/rust-2024/"));
}
