use crate::EditorGlobals;
use crate::ScriptOutcome;
use crate::ScriptRuntime;
use crate::ScriptRuntimeConfig;
use lm_core::EditorError;
use lm_core::EditorResult;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

struct EvaluationJob {
    expression: String,
    globals: EditorGlobals,
    reply: mpsc::Sender<EditorResult<ScriptOutcome>>,
}

/// Evaluation submitted to the queue but not yet collected.
#[derive(Debug)]
pub struct PendingEvaluation {
    reply: mpsc::Receiver<EditorResult<ScriptOutcome>>,
}

impl PendingEvaluation {
    pub fn wait(self, timeout: Duration) -> EditorResult<ScriptOutcome> {
        match self.reply.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(EditorError::script(
                "js.timeout",
                format!("evaluation did not finish within {} ms", timeout.as_millis()),
            )),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(EditorError::script(
                "js.worker_gone",
                "script worker stopped before replying",
            )),
        }
    }
}

/// Serializes evaluations onto one worker thread that owns the script
/// context. Jobs run strictly in submission order.
#[derive(Debug)]
pub struct EvaluationQueue {
    jobs: mpsc::Sender<EvaluationJob>,
    timeout: Duration,
}

impl EvaluationQueue {
    pub fn spawn(config: ScriptRuntimeConfig) -> EditorResult<Self> {
        config.validate()?;
        let timeout = config.evaluation_timeout;
        let (jobs, inbox) = mpsc::channel::<EvaluationJob>();
        thread::Builder::new()
            .name("lm-script".to_owned())
            .spawn(move || run_worker(config, &inbox))
            .map_err(|error| {
                EditorError::script(
                    "js.worker_spawn_failed",
                    format!("could not start script worker: {error}"),
                )
            })?;
        Ok(Self { jobs, timeout })
    }

    pub fn submit(&self, expression: &str, globals: EditorGlobals) -> EditorResult<PendingEvaluation> {
        let (reply, receiver) = mpsc::channel();
        self.jobs
            .send(EvaluationJob {
                expression: expression.to_owned(),
                globals,
                reply,
            })
            .map_err(|_| EditorError::script("js.worker_gone", "script worker is not running"))?;
        Ok(PendingEvaluation { reply: receiver })
    }

    /// Submits and waits for the configured evaluation timeout.
    pub fn evaluate(&self, expression: &str, globals: EditorGlobals) -> EditorResult<ScriptOutcome> {
        self.submit(expression, globals)?.wait(self.timeout)
    }
}

fn run_worker(config: ScriptRuntimeConfig, inbox: &mpsc::Receiver<EvaluationJob>) {
    let mut runtime = ScriptRuntime::new(config);
    while let Ok(job) = inbox.recv() {
        let outcome = match runtime.as_mut() {
            Ok(runtime) => runtime.evaluate(&job.expression, &job.globals),
            Err(error) => Err(error.clone()),
        };
        let _ = job.reply.send(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::EvaluationQueue;
    use crate::EditorGlobals;
    use crate::ScriptRuntimeConfig;
    use crate::ScriptValue;

    #[test]
    fn evaluations_run_in_submission_order() {
        let Ok(queue) = EvaluationQueue::spawn(ScriptRuntimeConfig::default()) else {
            unreachable!("worker should start");
        };
        let first = queue.submit("globalThis.counter = 1; counter", EditorGlobals::default());
        let second = queue.submit("counter + 1", EditorGlobals::default());
        let (Ok(first), Ok(second)) = (first, second) else {
            unreachable!("worker should accept jobs");
        };
        let timeout = std::time::Duration::from_secs(5);
        assert_eq!(
            first.wait(timeout).map(|outcome| outcome.value),
            Ok(ScriptValue::Number(1.0))
        );
        assert_eq!(
            second.wait(timeout).map(|outcome| outcome.value),
            Ok(ScriptValue::Number(2.0))
        );
    }
}
