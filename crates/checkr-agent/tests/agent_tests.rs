//! Tests for checkr-agent: conversation state machine, lifecycle trace, config, chat loop

use checkr_agent::*;
use checkr_core::{lifecycle, Error, Payload, Role};
use checkr_llm::{LlmProvider, ScriptedBehavior, ScriptedProvider};
use checkr_monitor::{AssertionCatalog, AssertionContext, Checkr, Evaluator, Outcome, TaskResult};
use checkr_tools::tools::add2::Add2Tool;
use checkr_tools::tools::echo::EchoTool;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

type Trace = Arc<Mutex<Vec<(String, Payload)>>>;

async fn watch(ctx: AssertionContext, name: &'static str, trace: Trace) -> TaskResult {
    let event = ctx.event(name)?;
    loop {
        let payload = ctx.wait_event(&event).await;
        trace.lock().push((name.to_string(), payload));
    }
}

async fn trace_all(ctx: AssertionContext, trace: Trace) -> TaskResult {
    for name in lifecycle::ALL {
        ctx.spawn(name, watch(ctx.clone(), name, trace.clone()));
    }
    Ok(())
}

fn tracing_checkr(trace: &Trace) -> Checkr {
    let mut catalog = AssertionCatalog::builtin();
    let trace = trace.clone();
    catalog.register("trace", "mainfn", move |ctx| trace_all(ctx, trace.clone()));
    Checkr::with_catalog(catalog)
}

fn step_config() -> AgentConfig {
    AgentConfig {
        clock: ClockConfig {
            mode: ClockMode::Step,
            step: 1.0,
        },
        ..Default::default()
    }
}

/// Agent with `add2` and `echo`, a step clock, and the trace program plus
/// the built-in checks loaded.
fn scripted_agent(script: Vec<ScriptedBehavior>) -> (CheckrAgent, Arc<ScriptedProvider>, Trace) {
    scripted_agent_with(script, step_config())
}

fn scripted_agent_with(
    script: Vec<ScriptedBehavior>,
    config: AgentConfig,
) -> (CheckrAgent, Arc<ScriptedProvider>, Trace) {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let provider = Arc::new(ScriptedProvider::sequence(script));
    let llm: Arc<dyn LlmProvider> = provider.clone();
    let mut agent = CheckrAgent::with_parts(
        &config,
        llm,
        tracing_checkr(&trace),
        config.time_source(),
    )
    .unwrap();
    agent.add_tool(Add2Tool).unwrap();
    agent.add_tool(EchoTool).unwrap();
    agent.load_spec("trace:mainfn").unwrap();
    agent.load_spec("tool_discipline:mainfn").unwrap();
    agent.load_spec("query_liveness:mainfn").unwrap();
    (agent, provider, trace)
}

fn names(trace: &Trace) -> Vec<String> {
    trace.lock().iter().map(|(n, _)| n.clone()).collect()
}

// ===========================================================================
// Construction
// ===========================================================================

#[test]
fn construction_seeds_system_messages() {
    let config = AgentConfig {
        name: "Pronda".into(),
        instruction: Some("You are a simple agent.".into()),
        ..step_config()
    };
    let agent = CheckrAgent::new(&config, Arc::new(ScriptedProvider::echo())).unwrap();

    let messages = agent.messages();
    assert_eq!(messages.len(), 3);
    assert!(messages.iter().all(|m| m.role == Role::System));
    assert_eq!(messages[0].text(), TOOLS_INSTRUCTION);
    assert_eq!(messages[1].text(), "Your NAME is Pronda.");
    assert_eq!(messages[2].text(), "You are a simple agent.");
    assert_eq!(agent.state(), ConversationState::Idle);
    assert_eq!(agent.checkr().now(), 3.0);
}

#[test]
fn add_tool_registers_spec_predicate_and_event() {
    let (agent, _, _) = scripted_agent(vec![]);
    let specs = agent.list_tools();
    let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["add2", "echo"]);

    let pred = agent.checkr().symbols().pred("add2").unwrap();
    assert!(!pred.eval());
    agent.checkr().set_flag("add2");
    assert!(pred.eval());

    assert_eq!(
        agent.events().on_add_tool.val(),
        Payload::Tool("echo".into())
    );
}

#[test]
fn configured_assertions_load_at_construction() {
    let config = AgentConfig {
        assertions: vec!["assertion1:mainfn".into()],
        ..step_config()
    };
    let agent = CheckrAgent::new(&config, Arc::new(ScriptedProvider::echo())).unwrap();
    assert_eq!(agent.checkr().bound_programs(), vec!["assertion1:mainfn"]);

    let config = AgentConfig {
        assertions: vec!["missing:mainfn".into()],
        ..step_config()
    };
    let err = CheckrAgent::new(&config, Arc::new(ScriptedProvider::echo())).err().unwrap();
    assert!(matches!(err, Error::LoadFailed { .. }));
}

// ===========================================================================
// Query lifecycle
// ===========================================================================

#[tokio::test]
async fn add2_query_emits_full_lifecycle() {
    let (mut agent, provider, trace) = scripted_agent(vec![
        ScriptedBehavior::tool("add2", json!({"val": 3})),
        ScriptedBehavior::text("The result is 5"),
    ]);

    let result = agent.process_query("What is 3 plus 2?").await.unwrap();
    assert_eq!(
        result,
        vec![
            r#"Calling tool:add2 with args:{"val":3}"#.to_string(),
            "The result is 5".to_string(),
        ]
    );

    assert_eq!(
        names(&trace),
        vec![
            lifecycle::ON_QUERY_RECEIVED,
            lifecycle::ON_QUERY_ANALYZED,
            lifecycle::ON_ONE_TOOL_CALLED,
            lifecycle::ON_ALL_TOOLS_CALLED,
            lifecycle::ON_TOOL_CALLS_ANALYZED,
            lifecycle::ON_QUERY_HANDLED,
        ]
    );
    let trace = trace.lock().clone();
    assert_eq!(trace[0].1, Payload::Query("What is 3 plus 2?".into()));
    assert!(trace[1].1.as_response().unwrap().has_tool_calls());
    let invocation = trace[2].1.as_tool_called().unwrap();
    assert_eq!(invocation.name, "add2");
    assert_eq!(invocation.args, json!({"val": 3}));
    assert_eq!(invocation.result, json!(5));
    assert!(trace[3].1.is_empty());
    assert_eq!(trace[4].1.as_response().unwrap().text(), "The result is 5");
    assert!(trace[5].1.is_empty());

    // Flags are gone and every built-in check passed.
    assert!(agent.checkr().flags().active().is_empty());
    let verdicts = agent.checkr().verdicts().all();
    assert_eq!(verdicts.len(), 3);
    assert!(verdicts.iter().all(|v| v.outcome == Outcome::Pass));

    assert_eq!(provider.call_count().await, 2);
    assert_eq!(agent.state(), ConversationState::Idle);
}

#[tokio::test]
async fn add2_query_conversation_history() {
    let (mut agent, provider, _) = scripted_agent(vec![
        ScriptedBehavior::tool("add2", json!({"val": 3})),
        ScriptedBehavior::text("5"),
    ]);
    agent.process_query("add 2 to 3").await.unwrap();

    let roles: Vec<Role> = agent.messages().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![
            Role::System,
            Role::System,
            Role::User,
            Role::Assistant,
            Role::Tool,
            Role::Assistant,
        ]
    );
    let tool_msg = &agent.messages()[4];
    assert_eq!(tool_msg.text(), "5");
    assert_eq!(tool_msg.name.as_deref(), Some("add2"));
    assert_eq!(
        tool_msg.tool_call_id.as_deref(),
        Some(agent.messages()[3].tool_calls[0].id.as_str())
    );

    // The second completion saw the tool result and the tool specs.
    let requests = provider.requests().await;
    assert_eq!(requests[1].messages.len(), 5);
    assert_eq!(requests[1].tools.len(), 2);
}

#[tokio::test]
async fn text_only_query_skips_tool_round() {
    let (mut agent, _, trace) = scripted_agent(vec![ScriptedBehavior::text("hello")]);
    let result = agent.process_query("hi").await.unwrap();
    assert_eq!(result, vec!["hello"]);
    assert_eq!(
        names(&trace),
        vec![
            lifecycle::ON_QUERY_RECEIVED,
            lifecycle::ON_QUERY_ANALYZED,
            lifecycle::ON_QUERY_HANDLED,
        ]
    );
}

#[tokio::test]
async fn unknown_tool_informs_model_and_continues() {
    let (mut agent, provider, trace) = scripted_agent(vec![
        ScriptedBehavior::tool("nope", json!({})),
        ScriptedBehavior::text("sorry"),
    ]);
    let result = agent.process_query("use nope").await.unwrap();
    assert_eq!(result, vec!["sorry"]);

    let notice = agent
        .messages()
        .iter()
        .find(|m| m.role == Role::Tool && m.text() == "Tool 'nope' not found");
    assert!(notice.is_some());

    // The follow-up completion answers every requested call id.
    let requests = provider.requests().await;
    let follow_up = &requests[1].messages;
    let answered: Vec<_> = follow_up
        .iter()
        .filter(|m| m.role == Role::Tool)
        .filter_map(|m| m.tool_call_id.clone())
        .collect();
    let requested: Vec<_> = follow_up
        .iter()
        .flat_map(|m| m.tool_calls.iter().map(|c| c.id.clone()))
        .collect();
    assert_eq!(requested.len(), 1);
    assert_eq!(answered, requested);
    assert!(follow_up.iter().all(|m| m.role != Role::User || m.text() == "use nope"));
    assert!(!names(&trace).contains(&lifecycle::ON_ONE_TOOL_CALLED.to_string()));
    assert!(names(&trace).contains(&lifecycle::ON_ALL_TOOLS_CALLED.to_string()));
    assert!(agent.checkr().flags().active().is_empty());
}

#[tokio::test]
async fn multiple_tool_calls_in_one_round() {
    let (mut agent, _, trace) = scripted_agent(vec![
        ScriptedBehavior::MultiToolCall(vec![
            ("echo".into(), json!({"input": "a"})),
            ("add2".into(), json!({"val": 1})),
        ]),
        ScriptedBehavior::text("done"),
    ]);
    let result = agent.process_query("both").await.unwrap();
    assert_eq!(result.len(), 3);
    assert!(result[0].starts_with("Calling tool:echo"));
    assert!(result[1].starts_with("Calling tool:add2"));

    let called: Vec<_> = trace
        .lock()
        .iter()
        .filter_map(|(_, p)| p.as_tool_called().map(|t| (t.name.clone(), t.result.clone())))
        .collect();
    assert_eq!(
        called,
        vec![
            ("echo".to_string(), json!("Echoed Output is a")),
            ("add2".to_string(), json!(3)),
        ]
    );
    assert!(agent.checkr().verdicts().failures().is_empty());
}

// ===========================================================================
// Failures
// ===========================================================================

#[tokio::test]
async fn backend_failure_ends_query() {
    let (mut agent, _, trace) = scripted_agent(vec![ScriptedBehavior::Error("boom".into())]);
    let err = agent.process_query("hi").await.unwrap_err();
    assert!(matches!(err, Error::Backend { ref provider, .. } if provider == "scripted"));
    assert!(err.is_query_fatal());
    assert_eq!(names(&trace), vec![lifecycle::ON_QUERY_RECEIVED]);
    assert_eq!(agent.state(), ConversationState::Idle);
}

#[tokio::test]
async fn empty_response_is_backend_error() {
    let (mut agent, _, _) = scripted_agent(vec![ScriptedBehavior::Empty]);
    let err = agent.process_query("hi").await.unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
}

#[tokio::test]
async fn tool_failure_propagates() {
    let (mut agent, _, trace) = scripted_agent(vec![ScriptedBehavior::tool(
        "add2",
        json!({"val": "three"}),
    )]);
    let err = agent.process_query("add").await.unwrap_err();
    assert!(matches!(err, Error::ToolFailed { ref name, .. } if name == "add2"));
    assert!(agent.checkr().flags().active().is_empty());
    assert_eq!(agent.state(), ConversationState::Idle);
    assert!(!names(&trace).contains(&lifecycle::ON_ALL_TOOLS_CALLED.to_string()));
}

#[tokio::test]
async fn malformed_arguments_are_tool_failure() {
    let (mut agent, _, _) = scripted_agent(vec![ScriptedBehavior::RawArguments {
        name: "echo".into(),
        arguments: "{not json".into(),
    }]);
    let err = agent.process_query("echo").await.unwrap_err();
    assert!(matches!(err, Error::ToolFailed { .. }));
}

#[tokio::test]
async fn tool_rounds_are_bounded() {
    let config = AgentConfig {
        max_tool_rounds: 2,
        ..step_config()
    };
    let mut script = Vec::new();
    for _ in 0..5 {
        script.push(ScriptedBehavior::tool("echo", json!({"input": "again"})));
    }
    let (mut agent, provider, _) = scripted_agent_with(script, config);
    let err = agent.process_query("loop").await.unwrap_err();
    assert!(matches!(err, Error::Backend { .. }));
    assert_eq!(provider.call_count().await, 3);
}

#[tokio::test]
async fn agent_recovers_after_failure() {
    let (mut agent, _, _) = scripted_agent(vec![
        ScriptedBehavior::Error("boom".into()),
        ScriptedBehavior::text("fine"),
    ]);
    assert!(agent.process_query("first").await.is_err());
    assert_eq!(agent.process_query("second").await.unwrap(), vec!["fine"]);

    // The failed query never reached on_query_handled.
    let failures = agent.checkr().verdicts().failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].program, "query_liveness:mainfn");
}

// ===========================================================================
// Assertion binding
// ===========================================================================

#[tokio::test]
async fn tool_added_after_load_is_checked() {
    let (mut agent, _, _) = scripted_agent(vec![
        ScriptedBehavior::tool("secret1", json!({"input": "x"})),
        ScriptedBehavior::text("ok"),
    ]);
    agent
        .add_tool(checkr_tools::tools::secret::SecretTool::new("secret1", 2))
        .unwrap();
    agent.process_query("secret").await.unwrap();

    let discipline = agent
        .checkr()
        .verdicts()
        .for_program("tool_discipline:mainfn");
    assert_eq!(discipline.len(), 2);
    assert!(discipline.iter().all(|v| v.passed()));
}

#[tokio::test]
async fn agents_share_an_evaluator() {
    let shared = Evaluator::new().shared();
    let clock: Arc<dyn TimeSource> = Arc::new(StepClock::new(0.5));
    let config = step_config();

    let mut alpha = CheckrAgent::with_parts(
        &AgentConfig {
            name: "alpha".into(),
            ..config.clone()
        },
        Arc::new(ScriptedProvider::echo()),
        Checkr::with_evaluator(shared.clone()),
        clock.clone(),
    )
    .unwrap();
    let mut beta = CheckrAgent::with_parts(
        &AgentConfig {
            name: "beta".into(),
            ..config
        },
        Arc::new(ScriptedProvider::echo()),
        Checkr::with_evaluator(shared.clone()),
        clock.clone(),
    )
    .unwrap();

    assert_eq!(alpha.process_query("one").await.unwrap(), vec!["one"]);
    assert_eq!(beta.process_query("two").await.unwrap(), vec!["two"]);
    assert_eq!(alpha.process_query("three").await.unwrap(), vec!["three"]);

    // One construction post per agent, three per query.
    assert_eq!(shared.lock().now(), 5.5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn agents_on_one_wall_clock_never_regress() {
    let shared = Evaluator::new().shared();
    let clock: Arc<dyn TimeSource> = Arc::new(WallClock::new());

    let mut handles = Vec::new();
    for i in 0..4 {
        let mut agent = CheckrAgent::with_parts(
            &AgentConfig {
                name: format!("agent-{}", i),
                ..Default::default()
            },
            Arc::new(ScriptedProvider::echo()),
            Checkr::with_evaluator(shared.clone()),
            clock.clone(),
        )
        .unwrap();
        handles.push(tokio::spawn(async move {
            let mut failed = 0;
            for n in 0..300 {
                if agent.process_query(&format!("q{}", n)).await.is_err() {
                    failed += 1;
                }
            }
            failed
        }));
    }

    for handle in handles {
        assert_eq!(handle.await.unwrap(), 0);
    }
}

// ===========================================================================
// Config
// ===========================================================================

#[test]
fn config_defaults() {
    let config = AgentConfig::default();
    assert_eq!(config.name, "Pronda");
    assert_eq!(config.max_tool_rounds, 25);
    assert_eq!(config.clock.mode, ClockMode::Wall);
    assert_eq!(config.provider.timeout_secs, 120);
    assert!(config.assertions.is_empty());
}

#[test]
fn config_loads_partial_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("checkr.toml");
    std::fs::write(
        &path,
        r#"
model = "llama3.2"
assertions = ["assertion1:mainfn"]

[clock]
mode = "step"
step = 0.25

[provider]
base_url = "http://localhost:11434/v1"
"#,
    )
    .unwrap();

    let config = AgentConfig::load(&path);
    assert_eq!(config.model, "llama3.2");
    assert_eq!(config.name, "Pronda");
    assert_eq!(config.assertions, vec!["assertion1:mainfn"]);
    assert_eq!(config.clock.mode, ClockMode::Step);
    assert_eq!(config.clock.step, 0.25);
    assert_eq!(
        config.provider.base_url.as_deref(),
        Some("http://localhost:11434/v1")
    );
    assert_eq!(config.provider.timeout_secs, 120);

    let clock = config.time_source();
    assert_eq!(clock.now(), 0.25);
}

#[test]
fn config_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.toml");
    assert_eq!(AgentConfig::load(&missing), AgentConfig::default());
    assert!(matches!(AgentConfig::try_load(&missing), Err(Error::Io(_))));

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "max_tool_rounds = \"many\"").unwrap();
    assert_eq!(AgentConfig::load(&bad), AgentConfig::default());
    assert!(matches!(AgentConfig::try_load(&bad), Err(Error::Config(_))));
}

#[test]
fn config_toml_roundtrip() {
    let config = AgentConfig {
        instruction: Some("Be brief.".into()),
        ..step_config()
    };
    let back = AgentConfig::from_toml(&config.to_toml()).unwrap();
    assert_eq!(back, config);
}

// ===========================================================================
// Chat loop
// ===========================================================================

#[tokio::test]
async fn chat_loop_answers_until_quit() {
    let mut agent =
        CheckrAgent::new(&step_config(), Arc::new(ScriptedProvider::echo())).unwrap();
    let input: &[u8] = b"hello there\n\nQUIT\nnever sent\n";
    let mut output = Vec::new();
    agent.chat_loop_with(input, &mut output).await.unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.starts_with("Type your queries or 'quit' to exit.\n"));
    assert!(output.contains("\nhello there\n"));
    assert!(!output.contains("never sent"));
    assert_eq!(output.matches("Query: ").count(), 3);
}

#[tokio::test]
async fn chat_loop_reports_errors_and_continues() {
    let provider = ScriptedProvider::sequence(vec![
        ScriptedBehavior::Error("down".into()),
        ScriptedBehavior::text("back"),
    ]);
    let mut agent = CheckrAgent::new(&step_config(), Arc::new(provider)).unwrap();
    let input: &[u8] = b"one\ntwo\n";
    let mut output = Vec::new();
    agent.chat_loop_with(input, &mut output).await.unwrap();

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("\nError: backend error: scripted - request failed: down\n"));
    assert!(output.contains("\nback\n"));
}
