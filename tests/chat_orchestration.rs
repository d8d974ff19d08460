//! Integration tests for the conversation loop.
//!
//! These tests wire the orchestrator and executor against scripted
//! collaborators and verify:
//! 1. Tool results flow back into the transcript in request order
//! 2. Tool failures never abort the conversation
//! 3. The tool-round cap bounds both rounds and model invocations

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use tableau_assistant::application::{ChatOrchestrator, ToolExecutor, TRUNCATION_MESSAGE};
use tableau_assistant::domain::chat::{ChatMessage, MessageRole, ToolCall};
use tableau_assistant::domain::tools::{
    ToolRegistry, CHECK_DATASET, LIST_DATASETS, UPLOAD_DATASET,
};
use tableau_assistant::ports::{
    ChatModel, ChatModelError, ConversionReport, ConvertError, DatasetCheck, DatasetInfo,
    DatasetService, DatasetServiceError, ExtractConverter, FileResolver, ResolveError,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Chat model that replays a script and records every transcript it is sent.
struct MockChatModel {
    script: Vec<ChatMessage>,
    calls: AtomicUsize,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockChatModel {
    fn new(script: Vec<ChatMessage>) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The transcript the model saw on its `n`th invocation.
    fn transcript(&self, n: usize) -> Vec<ChatMessage> {
        self.transcripts.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(
        &self,
        _model: &str,
        messages: &[ChatMessage],
        _tools: &[serde_json::Value],
    ) -> Result<ChatMessage, ChatModelError> {
        self.transcripts.lock().unwrap().push(messages.to_vec());
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let index = n.min(self.script.len() - 1);
        Ok(self.script[index].clone())
    }

    async fn list_models(&self) -> Result<Vec<String>, ChatModelError> {
        Ok(vec!["test-model".to_string()])
    }
}

/// Dataset service that records calls and serves a fixed catalog.
#[derive(Default)]
struct MockDatasetService {
    uploads: Mutex<Vec<(PathBuf, String)>>,
    checks: Mutex<Vec<(String, String)>>,
    lists: Mutex<Vec<String>>,
    datasets: Vec<DatasetInfo>,
}

impl MockDatasetService {
    fn with_datasets(datasets: Vec<DatasetInfo>) -> Self {
        Self {
            datasets,
            ..Default::default()
        }
    }
}

#[async_trait]
impl DatasetService for MockDatasetService {
    async fn upload(
        &self,
        file: &Path,
        project: &str,
    ) -> Result<DatasetInfo, DatasetServiceError> {
        self.uploads
            .lock()
            .unwrap()
            .push((file.to_path_buf(), project.to_string()));
        Ok(DatasetInfo {
            name: file
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("dataset")
                .to_string(),
            id: "ds-1".to_string(),
            project_id: "proj-1".to_string(),
            file_path: Some(file.display().to_string()),
        })
    }

    async fn check(&self, name: &str, project: &str) -> Result<DatasetCheck, DatasetServiceError> {
        self.checks
            .lock()
            .unwrap()
            .push((name.to_string(), project.to_string()));
        Ok(match self.datasets.iter().find(|d| d.name == name) {
            Some(d) => DatasetCheck::found(&d.name, &d.id, &d.project_id),
            None => DatasetCheck::missing(name, project),
        })
    }

    async fn list(&self, project: &str) -> Result<Vec<DatasetInfo>, DatasetServiceError> {
        self.lists.lock().unwrap().push(project.to_string());
        Ok(self.datasets.clone())
    }
}

struct MockConverter;

#[async_trait]
impl ExtractConverter for MockConverter {
    async fn convert(
        &self,
        source: &Path,
        output: Option<&Path>,
    ) -> Result<ConversionReport, ConvertError> {
        Ok(ConversionReport {
            input_file: source.to_path_buf(),
            output_file: output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| source.with_extension("hyper")),
            rows: 42,
            columns: 2,
            column_names: vec!["region".into(), "revenue".into()],
        })
    }
}

struct MockResolver;

impl FileResolver for MockResolver {
    fn resolve(&self, name: &str) -> Result<PathBuf, ResolveError> {
        Ok(PathBuf::from("/data").join(name))
    }
}

struct Harness {
    model: Arc<MockChatModel>,
    datasets: Arc<MockDatasetService>,
    orchestrator: ChatOrchestrator,
}

fn harness(script: Vec<ChatMessage>, datasets: MockDatasetService) -> Harness {
    let model = Arc::new(MockChatModel::new(script));
    let datasets = Arc::new(datasets);
    let registry = Arc::new(ToolRegistry::standard());
    let tools = registry.to_ollama_tools();
    let executor = ToolExecutor::new(
        registry,
        datasets.clone(),
        Arc::new(MockConverter),
        Arc::new(MockResolver),
        "Default",
    )
    .unwrap();
    let orchestrator =
        ChatOrchestrator::new(model.clone(), Arc::new(executor), tools, "test-model");
    Harness {
        model,
        datasets,
        orchestrator,
    }
}

fn tool_request(name: &str, arguments: serde_json::Value) -> ChatMessage {
    ChatMessage::assistant_with_tool_calls("", vec![ToolCall::new(name, arguments)])
}

// =============================================================================
// Upload Flow
// =============================================================================

#[tokio::test]
async fn excel_upload_converts_then_publishes() {
    let h = harness(
        vec![
            tool_request(
                UPLOAD_DATASET,
                json!({"file_path": "sales.xlsx", "tableau_project": "Sales"}),
            ),
            ChatMessage::assistant("Uploaded sales to the Sales project."),
        ],
        MockDatasetService::default(),
    );

    let outcome = h
        .orchestrator
        .run(vec![ChatMessage::user("upload sales.xlsx to Sales")])
        .await
        .unwrap();

    assert_eq!(outcome.message, "Uploaded sales to the Sales project.");
    assert_eq!(outcome.iterations, 1);
    assert!(!outcome.truncated);

    // the published file is the converted extract
    let uploads = h.datasets.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, PathBuf::from("/data/sales.hyper"));
    assert_eq!(uploads[0].1, "Sales");
    drop(uploads);

    // the second model call saw the tool result in the transcript
    let transcript = h.model.transcript(1);
    let tool_message = transcript
        .iter()
        .find(|m| m.role == MessageRole::Tool)
        .expect("tool message missing from transcript");
    let payload: serde_json::Value = serde_json::from_str(&tool_message.content).unwrap();
    assert_eq!(payload["status"], "success");
    assert_eq!(payload["action"], UPLOAD_DATASET);
    assert_eq!(payload["result"]["conversion"]["converted_from"], "Excel");
    assert_eq!(payload["result"]["conversion"]["rows"], 42);
}

#[tokio::test]
async fn transcript_grows_in_role_order() {
    let h = harness(
        vec![
            tool_request(LIST_DATASETS, json!({})),
            ChatMessage::assistant("Nothing published yet."),
        ],
        MockDatasetService::default(),
    );

    h.orchestrator
        .run(vec![ChatMessage::user("what is on the server?")])
        .await
        .unwrap();

    let roles: Vec<MessageRole> = h.model.transcript(1).iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::User, MessageRole::Assistant, MessageRole::Tool]
    );
}

// =============================================================================
// Error Containment
// =============================================================================

#[tokio::test]
async fn unknown_tool_becomes_error_result_and_loop_continues() {
    let h = harness(
        vec![
            tool_request("reboot_server", json!({})),
            ChatMessage::assistant("That tool does not exist."),
        ],
        MockDatasetService::default(),
    );

    let outcome = h
        .orchestrator
        .run(vec![ChatMessage::user("reboot the server")])
        .await
        .unwrap();

    assert_eq!(outcome.message, "That tool does not exist.");
    assert_eq!(outcome.iterations, 1);

    let transcript = h.model.transcript(1);
    let tool_message = transcript.last().unwrap();
    let payload: serde_json::Value = serde_json::from_str(&tool_message.content).unwrap();
    assert_eq!(payload["status"], "error");
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .contains("Unknown tool: reboot_server"));
}

#[tokio::test]
async fn missing_required_argument_never_reaches_collaborators() {
    let h = harness(
        vec![
            tool_request(UPLOAD_DATASET, json!({"file_path": "sales.csv"})),
            ChatMessage::assistant("Which project should I upload to?"),
        ],
        MockDatasetService::default(),
    );

    let outcome = h
        .orchestrator
        .run(vec![ChatMessage::user("upload sales.csv")])
        .await
        .unwrap();

    assert_eq!(outcome.iterations, 1);
    assert!(h.datasets.uploads.lock().unwrap().is_empty());

    let transcript = h.model.transcript(1);
    let payload: serde_json::Value =
        serde_json::from_str(&transcript.last().unwrap().content).unwrap();
    assert_eq!(payload["status"], "error");
    assert!(payload["message"]
        .as_str()
        .unwrap()
        .contains("tableau_project"));
}

// =============================================================================
// Multiple Calls Per Round
// =============================================================================

#[tokio::test]
async fn tool_results_follow_request_order() {
    let h = harness(
        vec![
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![
                    ToolCall::new(CHECK_DATASET, json!({"dataset_name": "alpha"})),
                    ToolCall::new(LIST_DATASETS, json!({"tableau_project": "Finance"})),
                ],
            ),
            ChatMessage::assistant("alpha exists; Finance has one dataset."),
        ],
        MockDatasetService::with_datasets(vec![DatasetInfo {
            name: "alpha".to_string(),
            id: "ds-7".to_string(),
            project_id: "proj-2".to_string(),
            file_path: None,
        }]),
    );

    h.orchestrator
        .run(vec![ChatMessage::user("is alpha there, and what else?")])
        .await
        .unwrap();

    let transcript = h.model.transcript(1);
    let tool_messages: Vec<serde_json::Value> = transcript
        .iter()
        .filter(|m| m.role == MessageRole::Tool)
        .map(|m| serde_json::from_str(&m.content).unwrap())
        .collect();

    assert_eq!(tool_messages.len(), 2);
    assert_eq!(tool_messages[0]["action"], CHECK_DATASET);
    assert_eq!(tool_messages[0]["result"]["exists"], true);
    assert_eq!(tool_messages[1]["action"], LIST_DATASETS);
    assert_eq!(tool_messages[1]["result"]["count"], 1);

    // check used the default project, list used the explicit one
    assert_eq!(
        h.datasets.checks.lock().unwrap()[0],
        ("alpha".to_string(), "Default".to_string())
    );
    assert_eq!(h.datasets.lists.lock().unwrap()[0], "Finance");
}

// =============================================================================
// Round Bounding
// =============================================================================

#[tokio::test]
async fn greedy_model_stops_after_exactly_max_rounds() {
    let Harness {
        model,
        datasets,
        orchestrator,
    } = harness(
        vec![tool_request(LIST_DATASETS, json!({}))],
        MockDatasetService::default(),
    );
    let orchestrator = orchestrator.with_max_rounds(3);

    let outcome = orchestrator
        .run(vec![ChatMessage::user("keep going")])
        .await
        .unwrap();

    assert!(outcome.truncated);
    assert_eq!(outcome.iterations, 3);
    assert_eq!(outcome.message, TRUNCATION_MESSAGE);
    assert_eq!(model.call_count(), 3);
    assert_eq!(datasets.lists.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn default_cap_is_five_rounds() {
    let h = harness(
        vec![tool_request(LIST_DATASETS, json!({}))],
        MockDatasetService::default(),
    );

    let outcome = h
        .orchestrator
        .run(vec![ChatMessage::user("keep going")])
        .await
        .unwrap();

    assert!(outcome.truncated);
    assert_eq!(outcome.iterations, 5);
    assert_eq!(h.model.call_count(), 5);
}
