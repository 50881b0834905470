//! Script runtime behind the surface `evaluate` capability.

use boa_engine::Context;
use boa_engine::JsValue;
use boa_engine::Source;
use lm_core::EditorError;
use lm_core::EditorResult;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

mod bootstrap;
mod queue;

use bootstrap::BOOTSTRAP_ENV;
pub use queue::EvaluationQueue;
pub use queue::PendingEvaluation;

/// Runtime hardening knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRuntimeConfig {
    pub recursion_limit: usize,
    pub stack_size_limit: usize,
    pub loop_iteration_limit: u64,
    pub max_expression_bytes: usize,
    pub max_timer_runs: usize,
    pub evaluation_timeout: Duration,
}

impl Default for ScriptRuntimeConfig {
    fn default() -> Self {
        Self {
            recursion_limit: 64,
            stack_size_limit: 1024,
            loop_iteration_limit: 100_000,
            max_expression_bytes: 256 * 1024,
            max_timer_runs: 128,
            evaluation_timeout: Duration::from_secs(2),
        }
    }
}

impl ScriptRuntimeConfig {
    pub fn validate(&self) -> EditorResult<()> {
        if self.max_expression_bytes == 0 {
            return Err(EditorError::invalid_argument(
                "js.config.max_expression_bytes",
                "max_expression_bytes must be > 0",
            ));
        }
        if self.evaluation_timeout.is_zero() {
            return Err(EditorError::invalid_argument(
                "js.config.evaluation_timeout",
                "evaluation_timeout must be > 0",
            ));
        }
        Ok(())
    }
}

/// Result of an evaluated expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Json(serde_json::Value),
}

impl ScriptValue {
    /// Text form used by hosts that print results.
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_owned(),
            Self::Null => "null".to_owned(),
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => value.to_string(),
            Self::String(value) => value.clone(),
            Self::Json(value) => value.to_string(),
        }
    }
}

/// Message a script posted with `postToHost`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostMessage {
    pub channel: String,
    pub payload: serde_json::Value,
}

/// Document state exposed to scripts as the `editor` global.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorGlobals {
    pub html: String,
    pub text: String,
    pub selection_text: String,
}

/// Everything an evaluation produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutcome {
    pub value: ScriptValue,
    pub messages: Vec<HostMessage>,
    /// HTML passed to `editor.replaceHtml`, applied by the surface.
    pub replacement_html: Option<String>,
}

/// A script context with the editor bootstrap installed.
pub struct ScriptRuntime {
    config: ScriptRuntimeConfig,
    context: Context,
}

impl std::fmt::Debug for ScriptRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRuntime")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ScriptRuntime {
    pub fn new(config: ScriptRuntimeConfig) -> EditorResult<Self> {
        config.validate()?;
        let mut context = Context::default();
        context
            .runtime_limits_mut()
            .set_recursion_limit(config.recursion_limit);
        context
            .runtime_limits_mut()
            .set_stack_size_limit(config.stack_size_limit);
        context
            .runtime_limits_mut()
            .set_loop_iteration_limit(config.loop_iteration_limit);
        context
            .eval(Source::from_bytes(BOOTSTRAP_ENV.as_bytes()))
            .map_err(|error| {
                EditorError::script("js.bootstrap_failed", format!("bootstrap: {error}"))
            })?;
        Ok(Self { config, context })
    }

    pub fn evaluate(&mut self, expression: &str, globals: &EditorGlobals) -> EditorResult<ScriptOutcome> {
        if expression.len() > self.config.max_expression_bytes {
            return Err(EditorError::script(
                "js.expression_too_large",
                format!(
                    "expression is {} bytes, limit is {}",
                    expression.len(),
                    self.config.max_expression_bytes
                ),
            ));
        }

        let state = serde_json::to_string(globals).map_err(|error| {
            EditorError::script("js.globals_encoding", format!("editor globals: {error}"))
        })?;
        self.eval_internal(&format!("__lm_set_editor({state});"))?;

        let value = match self.context.eval(Source::from_bytes(expression.as_bytes())) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(expression, %error, "script evaluation failed");
                // Drop anything the failed script queued.
                let _ = self.eval_internal("__lm_drain_outbox(); __lm_take_replacement();");
                return Err(EditorError::script(
                    "js.evaluation_failed",
                    error.to_string(),
                ));
            }
        };
        let value = self.convert(&value)?;

        self.eval_internal(&format!("__lm_flush_timers({});", self.config.max_timer_runs))?;
        let messages = self.drain_messages()?;
        let replacement_html = match self.eval_internal("__lm_take_replacement()")? {
            ScriptValue::String(html) => Some(html),
            _ => None,
        };

        Ok(ScriptOutcome {
            value,
            messages,
            replacement_html,
        })
    }

    fn eval_internal(&mut self, source: &str) -> EditorResult<ScriptValue> {
        let value = self
            .context
            .eval(Source::from_bytes(source.as_bytes()))
            .map_err(|error| EditorError::script("js.evaluation_failed", error.to_string()))?;
        self.convert(&value)
    }

    fn drain_messages(&mut self) -> EditorResult<Vec<HostMessage>> {
        let ScriptValue::String(raw) = self.eval_internal("__lm_drain_outbox()")? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|error| {
            EditorError::script("js.outbox_decoding", format!("postToHost payload: {error}"))
        })
    }

    fn convert(&mut self, value: &JsValue) -> EditorResult<ScriptValue> {
        if value.is_undefined() {
            return Ok(ScriptValue::Undefined);
        }
        if value.is_null() {
            return Ok(ScriptValue::Null);
        }
        if let Some(flag) = value.as_boolean() {
            return Ok(ScriptValue::Bool(flag));
        }
        if let Some(number) = value.as_number() {
            return Ok(ScriptValue::Number(number));
        }
        if let Some(text) = value.as_string() {
            return Ok(ScriptValue::String(text.to_std_string_escaped()));
        }
        if value.is_callable() || value.is_symbol() {
            return Ok(ScriptValue::Undefined);
        }
        value
            .to_json(&mut self.context)
            .map(ScriptValue::Json)
            .map_err(|error| EditorError::script("js.result_not_serializable", error.to_string()))
    }
}
