//! Conversation orchestrator - the bounded tool-calling loop.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::ToolExecutor;
use crate::domain::chat::ChatMessage;
use crate::ports::{ChatModel, ChatModelError};

/// Assistant reply substituted when the round cap is reached while the model
/// is still asking for tools.
pub const TRUNCATION_MESSAGE: &str = "I've executed several operations but \
stopped here to avoid an unbounded tool loop. The results of the tools I ran \
are listed above.";

/// Final state of one conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// Assistant text to show the user.
    pub message: String,
    /// Number of tool rounds executed for this turn.
    pub iterations: usize,
    /// Whether the round cap cut the loop short.
    pub truncated: bool,
}

/// Drives the model/tool loop for one user turn.
///
/// The loop alternates between asking the model for a response and executing
/// whatever tools it requested, and is hard-capped at `max_rounds` tool
/// rounds so a model that keeps asking for tools cannot spin forever.
pub struct ChatOrchestrator {
    model: Arc<dyn ChatModel>,
    executor: Arc<ToolExecutor>,
    tools: Vec<serde_json::Value>,
    model_name: String,
    max_rounds: usize,
}

impl ChatOrchestrator {
    pub const DEFAULT_MAX_ROUNDS: usize = 5;

    pub fn new(
        model: Arc<dyn ChatModel>,
        executor: Arc<ToolExecutor>,
        tools: Vec<serde_json::Value>,
        model_name: impl Into<String>,
    ) -> Self {
        Self {
            model,
            executor,
            tools,
            model_name: model_name.into(),
            max_rounds: Self::DEFAULT_MAX_ROUNDS,
        }
    }

    /// Overrides the tool-round cap. A cap of zero means tools are never
    /// executed: the first tool-requesting response truncates immediately.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Runs one user turn to completion with the default model.
    ///
    /// Tool failures are folded into the transcript as tool messages and the
    /// loop continues; only model transport failures surface as `Err`.
    pub async fn run(&self, messages: Vec<ChatMessage>) -> Result<ChatOutcome, ChatModelError> {
        self.run_with_model(messages, None).await
    }

    /// Runs one user turn, optionally overriding the model for this turn.
    pub async fn run_with_model(
        &self,
        mut messages: Vec<ChatMessage>,
        model: Option<&str>,
    ) -> Result<ChatOutcome, ChatModelError> {
        let model = model.unwrap_or(&self.model_name);
        let mut rounds = 0usize;

        let mut response = self.model.chat(model, &messages, &self.tools).await?;

        loop {
            if !response.has_tool_calls() {
                debug!(rounds, "Model produced a final answer");
                return Ok(ChatOutcome {
                    message: response.content,
                    iterations: rounds,
                    truncated: false,
                });
            }

            // With a cap of zero this fires on the first tool request; with
            // a positive cap the post-round check below fires first.
            if rounds >= self.max_rounds {
                return Ok(self.truncated(rounds));
            }

            rounds += 1;
            info!(
                round = rounds,
                tools = response.tool_calls.len(),
                "Model requested tool calls"
            );

            let calls = response.tool_calls.clone();
            messages.push(response);

            // One tool message per call, in the model's request order.
            for call in &calls {
                let result = self.executor.execute(call.name(), call.arguments()).await;
                messages.push(ChatMessage::tool(result.to_message_content()));
            }

            if rounds >= self.max_rounds {
                warn!(
                    rounds,
                    "Tool round cap reached before the model finished"
                );
                return Ok(self.truncated(rounds));
            }

            response = self.model.chat(model, &messages, &self.tools).await?;
        }
    }

    fn truncated(&self, rounds: usize) -> ChatOutcome {
        ChatOutcome {
            message: TRUNCATION_MESSAGE.to_string(),
            iterations: rounds,
            truncated: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::domain::chat::ToolCall;
    use crate::domain::tools::{ToolRegistry, LIST_DATASETS};
    use crate::ports::{
        ConversionReport, ConvertError, DatasetCheck, DatasetInfo, DatasetService,
        DatasetServiceError, ExtractConverter, FileResolver, ResolveError,
    };

    /// Model that answers from a fixed script, then keeps replaying the last
    /// entry. Counts invocations.
    struct ScriptedModel {
        script: Vec<ChatMessage>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(script: Vec<ChatMessage>) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
            }
        }

        fn always_requesting_tools() -> Self {
            Self::new(vec![ChatMessage::assistant_with_tool_calls(
                "",
                vec![ToolCall::new(LIST_DATASETS, serde_json::json!({}))],
            )])
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn chat(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: &[serde_json::Value],
        ) -> Result<ChatMessage, ChatModelError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            let index = n.min(self.script.len() - 1);
            Ok(self.script[index].clone())
        }

        async fn list_models(&self) -> Result<Vec<String>, ChatModelError> {
            Ok(vec!["test-model".to_string()])
        }
    }

    struct EmptyDatasets;

    #[async_trait]
    impl DatasetService for EmptyDatasets {
        async fn upload(
            &self,
            file: &Path,
            _project: &str,
        ) -> Result<DatasetInfo, DatasetServiceError> {
            Ok(DatasetInfo {
                name: file.display().to_string(),
                id: "d1".to_string(),
                project_id: "p1".to_string(),
                file_path: None,
            })
        }

        async fn check(
            &self,
            name: &str,
            project: &str,
        ) -> Result<DatasetCheck, DatasetServiceError> {
            Ok(DatasetCheck::missing(name, project))
        }

        async fn list(&self, _project: &str) -> Result<Vec<DatasetInfo>, DatasetServiceError> {
            Ok(Vec::new())
        }
    }

    struct NoopConverter;

    #[async_trait]
    impl ExtractConverter for NoopConverter {
        async fn convert(
            &self,
            source: &Path,
            _output: Option<&Path>,
        ) -> Result<ConversionReport, ConvertError> {
            Ok(ConversionReport {
                input_file: source.to_path_buf(),
                output_file: source.with_extension("hyper"),
                rows: 0,
                columns: 0,
                column_names: Vec::new(),
            })
        }
    }

    struct IdentityResolver;

    impl FileResolver for IdentityResolver {
        fn resolve(&self, name: &str) -> Result<PathBuf, ResolveError> {
            Ok(PathBuf::from(name))
        }
    }

    fn orchestrator_with(model: Arc<ScriptedModel>, max_rounds: usize) -> ChatOrchestrator {
        let registry = Arc::new(ToolRegistry::standard());
        let tools = registry.to_ollama_tools();
        let executor = ToolExecutor::new(
            registry,
            Arc::new(EmptyDatasets),
            Arc::new(NoopConverter),
            Arc::new(IdentityResolver),
            "Default",
        )
        .unwrap();
        ChatOrchestrator::new(model, Arc::new(executor), tools, "test-model")
            .with_max_rounds(max_rounds)
    }

    #[tokio::test]
    async fn plain_answer_takes_zero_rounds() {
        let model = Arc::new(ScriptedModel::new(vec![ChatMessage::assistant("Hello!")]));
        let orchestrator = orchestrator_with(model.clone(), 5);

        let outcome = orchestrator
            .run(vec![ChatMessage::user("hi")])
            .await
            .unwrap();

        assert_eq!(outcome.message, "Hello!");
        assert_eq!(outcome.iterations, 0);
        assert!(!outcome.truncated);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn one_tool_round_then_answer() {
        let model = Arc::new(ScriptedModel::new(vec![
            ChatMessage::assistant_with_tool_calls(
                "",
                vec![ToolCall::new(LIST_DATASETS, serde_json::json!({}))],
            ),
            ChatMessage::assistant("You have no datasets."),
        ]));
        let orchestrator = orchestrator_with(model.clone(), 5);

        let outcome = orchestrator
            .run(vec![ChatMessage::user("what do I have?")])
            .await
            .unwrap();

        assert_eq!(outcome.message, "You have no datasets.");
        assert_eq!(outcome.iterations, 1);
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn greedy_model_is_capped_at_exactly_max_rounds() {
        let model = Arc::new(ScriptedModel::always_requesting_tools());
        let orchestrator = orchestrator_with(model.clone(), 5);

        let outcome = orchestrator
            .run(vec![ChatMessage::user("loop forever")])
            .await
            .unwrap();

        assert!(outcome.truncated);
        assert_eq!(outcome.iterations, 5);
        assert_eq!(outcome.message, TRUNCATION_MESSAGE);
        // no extra invocation after the final tool round
        assert_eq!(model.call_count(), 5);
    }

    #[tokio::test]
    async fn zero_cap_never_executes_tools() {
        let model = Arc::new(ScriptedModel::always_requesting_tools());
        let orchestrator = orchestrator_with(model.clone(), 0);

        let outcome = orchestrator
            .run(vec![ChatMessage::user("loop forever")])
            .await
            .unwrap();

        assert!(outcome.truncated);
        assert_eq!(outcome.iterations, 0);
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn model_transport_errors_propagate() {
        struct DownModel;

        #[async_trait]
        impl ChatModel for DownModel {
            async fn chat(
                &self,
                _model: &str,
                _messages: &[ChatMessage],
                _tools: &[serde_json::Value],
            ) -> Result<ChatMessage, ChatModelError> {
                Err(ChatModelError::unavailable("connection refused"))
            }

            async fn list_models(&self) -> Result<Vec<String>, ChatModelError> {
                Err(ChatModelError::unavailable("connection refused"))
            }
        }

        let registry = Arc::new(ToolRegistry::standard());
        let tools = registry.to_ollama_tools();
        let executor = ToolExecutor::new(
            registry,
            Arc::new(EmptyDatasets),
            Arc::new(NoopConverter),
            Arc::new(IdentityResolver),
            "Default",
        )
        .unwrap();
        let orchestrator =
            ChatOrchestrator::new(Arc::new(DownModel), Arc::new(executor), tools, "test-model");

        let err = orchestrator
            .run(vec![ChatMessage::user("hi")])
            .await
            .unwrap_err();

        assert!(matches!(err, ChatModelError::Unavailable { .. }));
    }
}
