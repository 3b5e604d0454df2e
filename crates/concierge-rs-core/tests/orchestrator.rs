//! Reasoning loop integration tests with scripted models and dummy tools.

use concierge_rs_config::{ConciergeConfig, LinksConfig};
use concierge_rs_core::{
    Conversation, CoreError, EXHAUSTED_FALLBACK, NO_RESPONSE_FALLBACK, ReasoningLoop,
};
use concierge_rs_protocol::{
    AssistantMessage, ChatChoice, ChatCompletion, ChatMessage, LlmError, Product, Role,
    SearchLogEntry, ToolCall,
};
use concierge_rs_test_utils::{
    DummyTool, FailingLLM, RecordingTelemetry, ReorderingExecutor, ScriptedLLM, StubCatalog,
    base_tool_context, search_hit,
};
use concierge_rs_tools::{
    ParallelToolExecutor, RegistryToolCatalog, Tool, ToolExecutor, ToolRegistry,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const DOMAIN: &str = "shop.example.com";

fn registry() -> ToolRegistry {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(
        DummyTool::new("search_products")
            .with_source("catalog")
            .with_results(vec![search_hit(
                "Trail Boot",
                "https://shop.example.com/boot",
            )])
            .with_products(vec![Product {
                name: "Trail Boot".to_string(),
                url: Some("https://shop.example.com/boot".to_string()),
                price: Some("$120".to_string()),
                ..Product::default()
            }]),
    ));
    registry.register(Arc::new(
        DummyTool::new("lookup_order")
            .with_source("orders")
            .with_delay(Duration::from_millis(30))
            .with_results(vec![search_hit(
                "Order #12345",
                "https://shop.example.com/orders/12345",
            )]),
    ));
    registry.register(Arc::new(
        DummyTool::new("slow_search").with_delay(Duration::from_secs(5)),
    ));
    registry
}

fn config(max_search_iterations: i64) -> ConciergeConfig {
    let mut config = ConciergeConfig::builder()
        .max_search_iterations(max_search_iterations)
        .links(LinksConfig {
            allowed_hosts: vec!["example.com".to_string()],
        })
        .build();
    config.orchestrator.tool_timeout_ms = 50;
    config
}

fn reasoning(llm: Arc<ScriptedLLM>, max_search_iterations: i64) -> ReasoningLoop {
    let registry = registry();
    ReasoningLoop::new(
        llm,
        Arc::new(RegistryToolCatalog::new(registry.clone())),
        Arc::new(ParallelToolExecutor::new(registry)),
        &config(max_search_iterations),
    )
}

fn history() -> Vec<ChatMessage> {
    vec![
        ChatMessage::system("You are a store assistant."),
        ChatMessage::user("Do you have boots?"),
    ]
}

#[tokio::test]
async fn plain_text_answer_takes_one_iteration() {
    let llm = Arc::new(ScriptedLLM::new([ChatCompletion::text("We stock boots.")]));
    let reasoning = ReasoningLoop::new(
        llm.clone(),
        Arc::new(StubCatalog::empty()),
        Arc::new(ParallelToolExecutor::default()),
        &config(3),
    );
    let result = reasoning
        .run(history(), DOMAIN, None, None)
        .await
        .expect("run");

    assert_eq!(result.iteration, 1);
    assert_eq!(result.final_response, "We stock boots.");
    assert!(result.search_log.is_empty());
    assert_eq!(result.shopping_products, None);

    let requests = llm.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].tools, None);
    assert_eq!(requests[0].messages[0].content, "You are a store assistant.");
}

#[tokio::test]
async fn tool_round_feeds_results_back_and_collects_products() {
    let llm = Arc::new(ScriptedLLM::new([
        ChatCompletion::tool_calls(vec![
            ToolCall::new("call_1", "lookup_order", r#"{"order_number":"12345"}"#),
            ToolCall::new("call_2", "search_products", r#"{"query":"boots"}"#),
        ]),
        ChatCompletion::text("Your order shipped.\n1. [Trail Boot](https://shop.example.com/boot)"),
    ]));
    let telemetry = RecordingTelemetry::new();
    let result = reasoning(llm.clone(), 3)
        .run(history(), DOMAIN, None, Some(&telemetry))
        .await
        .expect("run");

    assert_eq!(result.iteration, 2);
    assert_eq!(
        result.final_response,
        "Your order shipped.\n- [Trail Boot](https://shop.example.com/boot)"
    );
    assert_eq!(
        result.search_log,
        vec![
            SearchLogEntry {
                tool: "lookup_order".to_string(),
                query: "12345".to_string(),
                result_count: 1,
                source: "orders".to_string(),
            },
            SearchLogEntry {
                tool: "search_products".to_string(),
                query: "boots".to_string(),
                result_count: 1,
                source: "catalog".to_string(),
            },
        ]
    );
    let titles = result
        .all_search_results
        .iter()
        .map(|hit| hit.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["Order #12345", "Trail Boot"]);
    assert_eq!(result.shopping_products.as_ref().map(Vec::len), Some(1));
    assert_eq!(
        result.shopping_context.as_deref(),
        Some("Products referenced this turn:\n- Trail Boot ($120): https://shop.example.com/boot")
    );

    let requests = llm.requests();
    assert_eq!(requests.len(), 2);
    let tool_names = requests[0]
        .tools
        .as_ref()
        .map(|tools| tools.iter().map(|tool| tool.name.clone()).collect::<Vec<_>>())
        .unwrap_or_default();
    assert_eq!(
        tool_names,
        vec!["lookup_order", "search_products", "slow_search"]
    );
    assert!(requests[0].messages[0].content.contains("## Available tools"));
    let followup = &requests[1].messages;
    let roles = followup.iter().map(|message| message.role).collect::<Vec<_>>();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Tool]
    );
    assert_eq!(followup[2].tool_calls.len(), 2);
    assert_eq!(followup[3].tool_call_id.as_deref(), Some("call_1"));
    assert_eq!(followup[4].tool_call_id.as_deref(), Some("call_2"));

    assert_eq!(telemetry.iterations(), vec![(1, 2), (2, 0)]);
    assert_eq!(telemetry.searches(), result.search_log);
    let lines = telemetry.lines();
    let first = &lines[0];
    assert_eq!(first.message, "Getting initial completion");
    assert_eq!(first.fields["iteration"], 0);
    assert_eq!(first.fields["message_count"], 2);
}

#[tokio::test]
async fn search_log_follows_issue_order_even_when_executor_reorders() {
    let llm = Arc::new(ScriptedLLM::new([
        ChatCompletion::tool_calls(vec![
            ToolCall::new("call_1", "lookup_order", r#"{"order_number":"12345"}"#),
            ToolCall::new("call_2", "search_products", r#"{"query":"boots"}"#),
            ToolCall::new("call_3", "search_products", r#"{"query":"sandals"}"#),
        ]),
        ChatCompletion::text("Done."),
    ]));
    let registry = registry();
    let executor: Arc<dyn ToolExecutor> = Arc::new(
        ReorderingExecutor::new(Arc::new(ParallelToolExecutor::new(registry.clone())))
            .dropping("call_2"),
    );
    let reasoning = ReasoningLoop::new(
        llm.clone(),
        Arc::new(RegistryToolCatalog::new(registry)),
        executor,
        &config(3),
    );
    let result = reasoning
        .run(history(), DOMAIN, None, None)
        .await
        .expect("run");

    let logged = result
        .search_log
        .iter()
        .map(|entry| (entry.query.as_str(), entry.source.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        logged,
        vec![
            ("12345", "orders"),
            ("boots", "error:execution"),
            ("sandals", "catalog"),
        ]
    );
    let tool_ids = llm.requests()[1]
        .messages
        .iter()
        .filter_map(|message| message.tool_call_id.clone())
        .collect::<Vec<_>>();
    assert_eq!(tool_ids, vec!["call_1", "call_2", "call_3"]);
}

#[tokio::test]
async fn timed_out_tool_still_reaches_final_answer() {
    let llm = Arc::new(ScriptedLLM::new([
        ChatCompletion::tool_calls(vec![ToolCall::new(
            "call_1",
            "slow_search",
            r#"{"query":"boots"}"#,
        )]),
        ChatCompletion::text("Search is slow right now, but boots are in stock."),
    ]));
    let result = reasoning(llm.clone(), 3)
        .run(history(), DOMAIN, None, None)
        .await
        .expect("run");

    assert_eq!(
        result.final_response,
        "Search is slow right now, but boots are in stock."
    );
    assert_eq!(result.search_log[0].source, "error:timeout");
    assert_eq!(result.search_log[0].result_count, 0);
    assert!(result.all_search_results.is_empty());
    let tool_message = llm.requests()[1]
        .messages
        .iter()
        .find(|message| message.role == Role::Tool)
        .map(|message| message.content.clone())
        .unwrap_or_default();
    assert!(tool_message.starts_with("Tool 'slow_search' failed (timeout)"));
}

#[tokio::test]
async fn exhausting_the_bound_returns_the_exhausted_fallback() {
    let calls = || {
        ChatCompletion::tool_calls(vec![ToolCall::new(
            "call_x",
            "search_products",
            r#"{"query":"boots"}"#,
        )])
    };
    let llm = Arc::new(ScriptedLLM::new([calls(), calls(), calls()]));
    let result = reasoning(llm.clone(), 2)
        .run(history(), DOMAIN, None, None)
        .await
        .expect("run");

    assert_eq!(result.final_response, EXHAUSTED_FALLBACK);
    assert_eq!(result.iteration, 3);
    assert_eq!(result.search_log.len(), 2);
    assert_eq!(llm.request_count(), 3);
}

#[tokio::test]
async fn non_positive_bound_requests_a_single_completion() {
    for bound in [0, -4] {
        let llm = Arc::new(ScriptedLLM::new([ChatCompletion::tool_calls(vec![
            ToolCall::new("call_1", "search_products", r#"{"query":"boots"}"#),
        ])]));
        let result = reasoning(llm.clone(), bound)
            .run(history(), DOMAIN, None, None)
            .await
            .expect("run");
        assert_eq!(llm.request_count(), 1);
        assert_eq!(result.final_response, EXHAUSTED_FALLBACK);
        assert!(result.search_log.is_empty());
    }
}

#[tokio::test]
async fn empty_content_selects_the_matching_fallback() {
    let llm = Arc::new(ScriptedLLM::new([ChatCompletion::text("   ")]));
    let result = reasoning(llm, 3)
        .run(history(), DOMAIN, None, None)
        .await
        .expect("run");
    assert_eq!(result.final_response, NO_RESPONSE_FALLBACK);

    let llm = Arc::new(ScriptedLLM::new([
        ChatCompletion::tool_calls(vec![ToolCall::new(
            "call_1",
            "search_products",
            r#"{"query":"boots"}"#,
        )]),
        ChatCompletion::text(""),
    ]));
    let result = reasoning(llm, 3)
        .run(history(), DOMAIN, None, None)
        .await
        .expect("run");
    assert_eq!(result.final_response, EXHAUSTED_FALLBACK);
}

#[tokio::test]
async fn malformed_completions_are_protocol_errors() {
    let llm = Arc::new(ScriptedLLM::new([ChatCompletion { choices: vec![] }]));
    let err = reasoning(llm, 3)
        .run(history(), DOMAIN, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Protocol(_)));

    let llm = Arc::new(ScriptedLLM::new([ChatCompletion {
        choices: vec![ChatChoice { message: None }],
    }]));
    let err = reasoning(llm, 3)
        .run(history(), DOMAIN, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Protocol(_)));
}

#[tokio::test]
async fn transport_errors_propagate_unchanged() {
    let reasoning = ReasoningLoop::new(
        Arc::new(FailingLLM::new(LlmError::RateLimited("slow down".to_string()))),
        Arc::new(StubCatalog::empty()),
        Arc::new(ParallelToolExecutor::default()),
        &config(3),
    );
    let err = reasoning
        .run(history(), DOMAIN, None, None)
        .await
        .unwrap_err();
    match err {
        CoreError::Llm(LlmError::RateLimited(message)) => assert_eq!(message, "slow down"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn post_processing_sanitizes_links_except_on_local_domains() {
    let text = "Found it:\n\n\n\n1. [Boot](https://evil.test/boot)\n2. See https://shop.example.com/boot";

    let llm = Arc::new(ScriptedLLM::new([ChatCompletion::text(text)]));
    let result = reasoning(llm, 3)
        .run(history(), DOMAIN, None, None)
        .await
        .expect("run");
    assert_eq!(
        result.final_response,
        "Found it:\n\n- Boot\n- See https://shop.example.com/boot"
    );

    let llm = Arc::new(ScriptedLLM::new([ChatCompletion::text(text)]));
    let result = reasoning(llm, 3)
        .run(history(), "localhost:3000", None, None)
        .await
        .expect("run");
    assert_eq!(
        result.final_response,
        "Found it:\n\n- [Boot](https://evil.test/boot)\n- See https://shop.example.com/boot"
    );
}

#[tokio::test]
async fn tool_call_text_is_kept_on_the_assistant_message() {
    let llm = Arc::new(ScriptedLLM::new([
        ChatCompletion {
            choices: vec![ChatChoice {
                message: Some(AssistantMessage {
                    content: Some("Let me check.".to_string()),
                    tool_calls: vec![ToolCall::new("call_1", "search_products", "")],
                }),
            }],
        },
        ChatCompletion::text("Here you go."),
    ]));
    reasoning(llm.clone(), 3)
        .run(history(), DOMAIN, None, None)
        .await
        .expect("run");
    let assistant = llm.requests()[1]
        .messages
        .iter()
        .find(|message| message.role == Role::Assistant)
        .cloned()
        .expect("assistant message");
    assert_eq!(assistant.content, "Let me check.");
    assert_eq!(assistant.tool_calls[0].id, "call_1");
}

#[tokio::test]
async fn conversation_turns_feed_memory_into_the_next_prompt() {
    let llm = Arc::new(ScriptedLLM::new([
        ChatCompletion::text(
            "Here are two options:\n1. [Trail Boot](https://shop.example.com/boot)\n2. [City Boot](https://shop.example.com/city)",
        ),
        ChatCompletion::text("The City Boot is waterproof."),
    ]));
    let reasoning = reasoning(llm.clone(), 3);
    let mut conversation = Conversation::from_config(&config(3));

    let first = conversation
        .handle_turn(&reasoning, Vec::new(), "Show me boots", DOMAIN, None)
        .await
        .expect("first turn");
    assert_eq!(conversation.memory().current_turn(), 1);
    let second_item = conversation
        .memory()
        .resolve_reference("the second one")
        .expect("second item");
    assert_eq!(second_item.value, "City Boot");

    let history = vec![
        ChatMessage::user("Show me boots"),
        ChatMessage::assistant(first.final_response),
    ];
    conversation
        .handle_turn(&reasoning, history, "Is the second one waterproof?", DOMAIN, None)
        .await
        .expect("second turn");

    let requests = llm.requests();
    assert!(!requests[0].messages[0].content.contains("## Conversation Context"));
    let system = &requests[1].messages[0];
    assert_eq!(system.role, Role::System);
    assert!(system.content.starts_with(conversation.system_prompt()));
    assert!(system.content.contains("## Conversation Context"));
    assert!(system.content.contains("2. City Boot (https://shop.example.com/city)"));
    assert_eq!(
        requests[1].messages.last().map(|message| message.content.as_str()),
        Some("Is the second one waterproof?")
    );
    assert_eq!(conversation.memory().current_turn(), 2);
}

#[tokio::test]
async fn failed_turn_leaves_memory_untouched() {
    let reasoning = ReasoningLoop::new(
        Arc::new(FailingLLM::new(LlmError::Transport("reset".to_string()))),
        Arc::new(StubCatalog::empty()),
        Arc::new(ParallelToolExecutor::default()),
        &config(3),
    );
    let mut conversation = Conversation::new();
    let err = conversation
        .handle_turn(&reasoning, Vec::new(), "Where is order #12345?", DOMAIN, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Llm(LlmError::Transport(_))));
    assert_eq!(conversation.memory().current_turn(), 0);
    assert!(conversation.memory().entities().is_empty());
}

#[tokio::test]
async fn dummy_tools_answer_directly_through_the_tool_trait() {
    let tool = DummyTool::new("search_products")
        .with_source("catalog")
        .with_results(vec![search_hit("Trail Boot", "https://shop.example.com/boot")]);
    let output = tool
        .call(&base_tool_context(), serde_json::json!({ "query": "boots" }))
        .await
        .expect("call");
    assert_eq!(output.source, "catalog");
    assert_eq!(output.results.len(), 1);
}
