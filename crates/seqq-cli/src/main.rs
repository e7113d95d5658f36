mod settings;
mod telemetry;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use seqq_core::{BoxError, QueueBuilder, QueueEvent, SeqQueue, Task};
use tokio::sync::broadcast::{Receiver, error::RecvError};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::settings::Settings;

/// Push a demo workload through a sequential task queue.
#[derive(Debug, Parser)]
#[command(name = "seqq", version)]
struct Args {
    /// Settings file (toml, yaml, json).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Queue default timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Number of tasks to enqueue.
    #[arg(long)]
    tasks: Option<usize>,

    /// Work time of a well-behaved task in milliseconds.
    #[arg(long)]
    work_ms: Option<u64>,

    /// Every n-th task overruns its timeout (0 disables).
    #[arg(long)]
    stall_every: Option<usize>,

    /// Every n-th task fails (0 disables).
    #[arg(long)]
    fail_every: Option<usize>,

    /// Force-close after this many milliseconds instead of draining gracefully.
    #[arg(long)]
    force_after_ms: Option<u64>,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(ms) = self.timeout_ms {
            settings.queue.default_timeout_ms = ms;
        }
        let demo = &mut settings.demo;
        if let Some(n) = self.tasks {
            demo.tasks = n;
        }
        if let Some(ms) = self.work_ms {
            demo.work_ms = ms;
        }
        if let Some(n) = self.stall_every {
            demo.stall_every = n;
        }
        if let Some(n) = self.fail_every {
            demo.fail_every = n;
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    timeouts: usize,
    errors: usize,
}

/// Log events until the queue drains.
async fn watch_events(mut events: Receiver<QueueEvent>) -> Tally {
    let mut tally = Tally::default();
    loop {
        match events.recv().await {
            Ok(QueueEvent::Timeout(task)) => {
                tally.timeouts += 1;
                info!(%task, "event: timeout");
            }
            Ok(QueueEvent::Error { error, task }) => {
                tally.errors += 1;
                info!(%task, %error, "event: error");
            }
            Ok(QueueEvent::Closed) => info!("event: closed"),
            Ok(QueueEvent::Drained) => {
                info!("event: drained");
                return tally;
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event watcher lagged"),
            Err(RecvError::Closed) => return tally,
        }
    }
}

fn is_nth(i: usize, every: usize) -> bool {
    every > 0 && (i + 1) % every == 0
}

fn demo_task(i: usize, settings: &Settings, timeout: Duration) -> Task {
    let label = format!("job-{i}");
    let demo = &settings.demo;

    if is_nth(i, demo.fail_every) {
        return Task::new(move |_done| Err(format!("job-{i} refused to run").into()))
            .with_label(label);
    }

    if is_nth(i, demo.stall_every) {
        // Finishes long after its timeout; the queue has moved on by then.
        return Task::new(move |done| {
            tokio::spawn(async move {
                sleep(timeout * 2).await;
                let accepted = done.done();
                info!(task = %done.task(), accepted, "stalled task finished");
            });
            Ok(())
        })
        .with_label(label)
        .on_timeout(move || warn!(job = i, "gave up waiting"));
    }

    let work = Duration::from_millis(demo.work_ms);
    Task::from_future(move || async move {
        sleep(work).await;
        info!(job = i, "work done");
        Ok::<(), BoxError>(())
    })
    .with_label(label)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_telemetry();

    let args = Args::parse();
    let mut settings = Settings::load(args.config.as_deref()).context("loading settings")?;
    args.apply(&mut settings);
    info!(?settings, "starting demo");

    // (A) Queue + event watcher
    let queue: SeqQueue = QueueBuilder::from_config(&settings.queue)
        .build()
        .context("building queue")?;
    let watcher = tokio::spawn(watch_events(queue.subscribe()));

    // (B) Workload
    let timeout = queue.default_timeout();
    for i in 0..settings.demo.tasks {
        queue.enqueue(demo_task(i, &settings, timeout));
    }

    // (C) Shutdown
    match args.force_after_ms {
        Some(ms) => {
            sleep(Duration::from_millis(ms)).await;
            info!(pending = queue.pending_len(), "forcing close");
            queue.close(true);
        }
        None => queue.close(false),
    }

    // (D) Wait for drain and report
    let tally = watcher.await.context("event watcher failed")?;
    info!(timeouts = tally.timeouts, errors = tally.errors, "queue drained");
    println!("{}", serde_json::to_string_pretty(&queue.snapshot())?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nth_selection() {
        assert!(!is_nth(0, 0));
        assert!(!is_nth(0, 3));
        assert!(is_nth(2, 3));
        assert!(is_nth(5, 3));
        assert!(is_nth(0, 1));
    }

    #[test]
    fn args_override_settings() {
        let args = Args::parse_from(["seqq", "--timeout-ms", "40", "--tasks", "3", "--stall-every", "0"]);
        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(settings.queue.default_timeout_ms, 40);
        assert_eq!(settings.demo.tasks, 3);
        assert_eq!(settings.demo.stall_every, 0);
        assert_eq!(settings.demo.work_ms, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn demo_workload_drains() {
        let mut settings = Settings::default();
        settings.queue.default_timeout_ms = 50;
        let queue = QueueBuilder::from_config(&settings.queue).build().unwrap();
        let watcher = tokio::spawn(watch_events(queue.subscribe()));

        for i in 0..settings.demo.tasks {
            queue.enqueue(demo_task(i, &settings, queue.default_timeout()));
        }
        queue.close(false);

        let tally = watcher.await.unwrap();
        assert_eq!(tally.timeouts, 2);
        assert_eq!(tally.errors, 1);
        assert_eq!(queue.status(), seqq_core::QueueStatus::Drained);
    }
}
