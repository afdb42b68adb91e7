// tests/runtime_fake_executor.rs

mod common;
use crate::common::fake_executor::FakeExecutor;
use crate::common::init_tracing;

use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

use assetpipe::engine::{
    CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions, ScheduledRun, TriggerReason,
    TriggerWhileRunningBehaviour,
};

type TestResult = Result<(), Box<dyn Error>>;

fn trigger(task: &str) -> RuntimeEvent {
    RuntimeEvent::TaskTriggered {
        task: task.to_string(),
        reason: TriggerReason::FileWatch,
    }
}

fn run(task: &str, run_id: u64) -> ScheduledRun {
    ScheduledRun {
        task: task.to_string(),
        run_id,
    }
}

#[tokio::test]
async fn burst_of_triggers_runs_the_task_twice() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let started = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), started.clone());

    rt_tx.send(trigger("styles")).await?;
    rt_tx.send(trigger("styles")).await?;

    let core = CoreRuntime::new(
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    let runtime = Runtime::new(core, rt_rx, executor);

    match timeout(Duration::from_secs(3), runtime.run()).await {
        Ok(result) => result?,
        Err(_) => panic!("runtime did not finish within 3 seconds"),
    }

    let runs = started.lock().unwrap().clone();
    assert_eq!(runs, vec![run("styles", 1), run("styles", 2)]);
    Ok(())
}

#[tokio::test]
async fn cancel_mode_aborts_and_ignores_the_stale_completion() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let started = Arc::new(Mutex::new(Vec::new()));
    let cancelled = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), started.clone())
        .manual()
        .with_cancel_log(cancelled.clone());

    rt_tx.send(trigger("copy")).await?;
    rt_tx.send(trigger("copy")).await?;
    rt_tx
        .send(RuntimeEvent::TaskFinished {
            task: "copy".to_string(),
            run_id: 1,
            success: true,
        })
        .await?;
    rt_tx
        .send(RuntimeEvent::TaskFinished {
            task: "copy".to_string(),
            run_id: 2,
            success: false,
        })
        .await?;

    let core = CoreRuntime::new(
        TriggerWhileRunningBehaviour::Cancel,
        1,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );

    match timeout(Duration::from_secs(3), Runtime::new(core, rt_rx, executor).run()).await {
        Ok(result) => result?,
        Err(_) => panic!("runtime did not finish within 3 seconds"),
    }

    assert_eq!(*started.lock().unwrap(), vec![run("copy", 1), run("copy", 2)]);
    assert_eq!(*cancelled.lock().unwrap(), vec!["copy".to_string()]);
    Ok(())
}

#[tokio::test]
async fn shutdown_stops_an_idle_watch_loop() -> TestResult {
    init_tracing();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let started = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), started.clone());

    rt_tx.send(trigger("scripts")).await?;
    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;

    let core = CoreRuntime::new(
        TriggerWhileRunningBehaviour::Queue,
        1,
        RuntimeOptions::default(),
    );

    match timeout(Duration::from_secs(3), Runtime::new(core, rt_rx, executor).run()).await {
        Ok(result) => result?,
        Err(_) => panic!("runtime did not stop on shutdown"),
    }

    assert_eq!(started.lock().unwrap().len(), 1);
    Ok(())
}
