use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use assetpipe::engine::{RuntimeEvent, ScheduledRun};
use assetpipe::errors::Result;
use assetpipe::exec::ExecutorBackend;

/// A fake executor that:
/// - records which runs were started and which tasks were cancelled
/// - when `auto_complete` is set, immediately reports a successful
///   `TaskFinished` for each started run.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    started: Arc<Mutex<Vec<ScheduledRun>>>,
    cancelled: Arc<Mutex<Vec<String>>>,
    auto_complete: bool,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, started: Arc<Mutex<Vec<ScheduledRun>>>) -> Self {
        Self {
            runtime_tx,
            started,
            cancelled: Arc::new(Mutex::new(Vec::new())),
            auto_complete: true,
        }
    }

    /// Leave runs in flight; the test sends `TaskFinished` itself.
    pub fn manual(mut self) -> Self {
        self.auto_complete = false;
        self
    }

    pub fn with_cancel_log(mut self, cancelled: Arc<Mutex<Vec<String>>>) -> Self {
        self.cancelled = cancelled;
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn start_run(
        &mut self,
        run: ScheduledRun,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let started = Arc::clone(&self.started);
        let auto_complete = self.auto_complete;

        Box::pin(async move {
            started.lock().unwrap().push(run.clone());

            if auto_complete {
                tx.send(RuntimeEvent::TaskFinished {
                    task: run.task.clone(),
                    run_id: run.run_id,
                    success: true,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }

    fn cancel_run(&mut self, task: &str) {
        self.cancelled.lock().unwrap().push(task.to_string());
    }
}
