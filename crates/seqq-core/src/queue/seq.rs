//! Sequential queue state machine.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, trace, warn};

use super::{Completion, QueueBuilder};
use crate::domain::task::{Action, TimeoutCallback, millis};
use crate::domain::{QueueEvent, QueueStatus, Task, TaskId, TaskInfo};
use crate::error::{BoxError, QueueError, TaskError};
use crate::observability::QueueSnapshot;
use crate::ports::{Scheduler, TimerHandle};

/// Runs tasks one at a time, in submission order, each bounded by a timeout.
///
/// Cloning yields another handle to the same queue.
///
/// ```ignore
/// let queue = SeqQueue::create(Duration::from_millis(500))?;
/// let mut events = queue.subscribe();
///
/// queue.enqueue(Task::new(|done| {
///     tokio::spawn(async move {
///         flush().await;
///         done.done();
///     });
///     Ok(())
/// }));
/// queue.close(false);
/// ```
#[derive(Clone)]
pub struct SeqQueue {
    inner: Arc<Inner>,
}

/// Shared queue internals. Continuations hold it weakly.
pub(crate) struct Inner {
    state: Mutex<QueueState>,
    default_timeout: Duration,
    scheduler: Arc<dyn Scheduler>,
    events: broadcast::Sender<QueueEvent>,
}

struct QueueState {
    status: QueueStatus,
    pending: VecDeque<Task>,
    /// Generation of the in-flight attempt; also the last id handed out.
    current_id: TaskId,
    timer: Option<TimerHandle>,
    /// Set while some caller is invoking actions; nested advances hand off to it.
    driving: bool,
    /// Dequeued attempts waiting for the driving caller to invoke them.
    ready: VecDeque<(Action, TaskInfo)>,
}

/// Result of one locked advance step. User code runs after the lock is released.
enum Step {
    Stale,
    Idle,
    Drained,
    Run { action: Action, info: TaskInfo },
}

impl SeqQueue {
    pub fn builder() -> QueueBuilder {
        QueueBuilder::new()
    }

    /// Idle queue on the current tokio runtime.
    pub fn create(default_timeout: Duration) -> Result<Self, QueueError> {
        QueueBuilder::new().default_timeout(default_timeout).build()
    }

    pub(crate) fn from_parts(
        default_timeout: Duration,
        event_capacity: usize,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        let (events, _) = broadcast::channel(event_capacity);
        let state = QueueState {
            status: QueueStatus::Idle,
            pending: VecDeque::new(),
            current_id: TaskId::INITIAL,
            timer: None,
            driving: false,
            ready: VecDeque::new(),
        };
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                default_timeout,
                scheduler,
                events,
            }),
        }
    }

    /// Add a task. Returns `false` (and drops the task) once the queue is closed.
    pub fn enqueue(&self, task: Task) -> bool {
        match self.try_enqueue(task) {
            Ok(()) => true,
            Err(err) => {
                debug!(error = %err, "enqueue rejected");
                false
            }
        }
    }

    /// Like `enqueue`, reporting the status that rejected the task.
    pub fn try_enqueue(&self, task: Task) -> Result<(), QueueError> {
        let first = {
            let mut state = self.inner.lock();
            if !state.status.is_accepting() {
                return Err(QueueError::NotAccepting(state.status));
            }
            state.pending.push_back(task);
            if state.status == QueueStatus::Idle {
                state.status = QueueStatus::Busy;
                Some(state.current_id)
            } else {
                None
            }
        };

        // Leaving Idle: start the head task on a later turn, never inline.
        if let Some(last_id) = first {
            self.inner.defer_advance(last_id);
        }
        Ok(())
    }

    /// Enqueue async work; the queue completes the attempt when the future resolves.
    pub fn enqueue_async<F, Fut>(&self, make: F) -> bool
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.enqueue(Task::from_future(make))
    }

    /// Stop accepting tasks.
    ///
    /// Graceful (`force = false`) keeps executing what is pending and emits
    /// `Closed`, later `Drained`. Forced cancels the timer, discards pending
    /// tasks and emits `Drained`. No-op unless the queue is Idle or Busy.
    pub fn close(&self, force: bool) {
        let (event, discarded, abandoned, drain_from) = {
            let mut state = self.inner.lock();
            if !state.status.is_accepting() {
                debug!(status = %state.status, "close ignored");
                return;
            }
            if force {
                state.status = QueueStatus::Drained;
                // The abandoned attempt's handle must read as stale.
                state.current_id = state.current_id.next();
                if let Some(timer) = state.timer.take() {
                    timer.cancel();
                }
                (
                    QueueEvent::Drained,
                    mem::take(&mut state.pending),
                    mem::take(&mut state.ready),
                    None,
                )
            } else {
                // An idle queue has no in-flight task whose completion would drain it.
                let drain_from =
                    (state.status == QueueStatus::Idle).then_some(state.current_id);
                state.status = QueueStatus::Closed;
                (QueueEvent::Closed, VecDeque::new(), VecDeque::new(), drain_from)
            }
        };

        info!(
            force,
            discarded = discarded.len() + abandoned.len(),
            "queue closed"
        );
        drop(discarded);
        drop(abandoned);
        self.inner.emit(event);

        if let Some(last_id) = drain_from {
            self.inner.defer_advance(last_id);
        }
    }

    /// Receive every event emitted after this call.
    ///
    /// The channel holds `event_capacity` events. A receiver that falls further
    /// behind gets `RecvError::Lagged` and misses the oldest ones, `Timeout` and
    /// `Error` included, so size the capacity for the slowest subscriber.
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.inner.events.subscribe()
    }

    pub fn status(&self) -> QueueStatus {
        self.inner.lock().status
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn current_id(&self) -> TaskId {
        self.inner.lock().current_id
    }

    pub fn default_timeout(&self) -> Duration {
        self.inner.default_timeout
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        let state = self.inner.lock();
        QueueSnapshot {
            status: state.status,
            pending: state.pending.len(),
            current_id: state.current_id,
            in_flight: state.timer.is_some(),
            default_timeout_ms: millis(self.inner.default_timeout),
        }
    }
}

impl fmt::Debug for SeqQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SeqQueue").field(&self.snapshot()).finish()
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: QueueEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    pub(crate) fn is_current(&self, id: TaskId) -> bool {
        self.lock().current_id == id
    }

    pub(crate) fn report_failure(&self, error: TaskError, task: TaskInfo) {
        warn!(task = %task, error = %error, "task failed");
        self.emit(QueueEvent::Error {
            error: Arc::new(error),
            task,
        });
    }

    fn defer_advance(self: &Arc<Self>, last_id: TaskId) {
        let queue = Arc::downgrade(self);
        self.scheduler.defer(Box::new(move || {
            if let Some(queue) = queue.upgrade() {
                queue.advance(last_id);
            }
        }));
    }

    /// Run the next task, go idle, or drain. Only `last_id == current_id` may
    /// advance; returns whether it did.
    pub(crate) fn advance(self: &Arc<Self>, last_id: TaskId) -> bool {
        self.advance_after(last_id, None)
    }

    /// Like `advance`, reporting `failure` only if the attempt was still current.
    pub(crate) fn advance_after(
        self: &Arc<Self>,
        last_id: TaskId,
        failure: Option<(TaskError, TaskInfo)>,
    ) -> bool {
        let (run, drained) = {
            let mut state = self.lock();
            match self.step(&mut state, last_id) {
                Step::Stale => return false,
                Step::Idle => (None, false),
                Step::Drained => (None, true),
                Step::Run { action, info } if state.driving => {
                    // A caller further up is invoking actions and picks this one up.
                    trace!(task = %info, "handing off to driving caller");
                    state.ready.push_back((action, info));
                    (None, false)
                }
                Step::Run { action, info } => {
                    state.driving = true;
                    (Some((action, info)), false)
                }
            }
        };

        if let Some((error, task)) = failure {
            self.report_failure(error, task);
        }
        if drained {
            info!("queue drained");
            self.emit(QueueEvent::Drained);
        }
        if let Some((action, info)) = run {
            self.drive(action, info);
        }
        true
    }

    /// Invoke `action`, then every attempt handed off while it ran.
    ///
    /// Completions that happen inside an action never start the next action on
    /// the same stack, so synchronous completers run in a flat loop.
    fn drive(self: &Arc<Self>, action: Action, info: TaskInfo) {
        let mut next = Some((action, info));
        while let Some((action, info)) = next {
            if let Err(error) = self.invoke(action, &info) {
                let id = info.id;
                self.report_failure(error, info);
                self.advance(id);
            }
            next = {
                let mut state = self.lock();
                let next = state.ready.pop_front();
                if next.is_none() {
                    state.driving = false;
                }
                next
            };
        }
    }

    fn step(self: &Arc<Self>, state: &mut QueueState, last_id: TaskId) -> Step {
        if last_id != state.current_id || !state.status.is_running() {
            trace!(%last_id, current_id = %state.current_id, status = %state.status, "stale advance");
            return Step::Stale;
        }

        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }

        let Some(task) = state.pending.pop_front() else {
            return if state.status == QueueStatus::Busy {
                state.status = QueueStatus::Idle;
                // Invalidates any straggling handle or timer of the attempt that just ended.
                state.current_id = state.current_id.next();
                debug!("queue idle");
                Step::Idle
            } else {
                state.status = QueueStatus::Drained;
                state.current_id = state.current_id.next();
                Step::Drained
            };
        };

        let id = state.current_id.next();
        state.current_id = id;
        let timeout = task.effective_timeout(self.default_timeout);
        let Task {
            action,
            on_timeout,
            label,
            ..
        } = task;
        let info = TaskInfo::start(id, timeout, label);

        let queue = Arc::downgrade(self);
        let fired = info.clone();
        state.timer = Some(self.scheduler.schedule(
            timeout,
            Box::new(move || {
                if let Some(queue) = queue.upgrade() {
                    queue.on_timer_fired(fired, on_timeout);
                }
            }),
        ));

        debug!(task = %info, timeout_ms = millis(timeout), "starting task");
        Step::Run { action, info }
    }

    fn invoke(self: &Arc<Self>, action: Action, info: &TaskInfo) -> Result<(), TaskError> {
        let completion = Completion::new(Arc::downgrade(self), info.clone());
        match panic::catch_unwind(AssertUnwindSafe(move || action(completion))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(TaskError::Failed(source)),
            Err(payload) => Err(TaskError::from_panic(payload)),
        }
    }

    /// Timeout path: schedule the advance, then notify immediately.
    ///
    /// Observers therefore see `Timeout` before the queue has moved on.
    fn on_timer_fired(self: &Arc<Self>, task: TaskInfo, on_timeout: Option<TimeoutCallback>) {
        {
            let state = self.lock();
            if state.current_id != task.id || !state.status.is_running() {
                trace!(task = %task, "stale timer");
                return;
            }
        }

        self.defer_advance(task.id);

        warn!(task = %task, timeout_ms = millis(task.timeout), "task timed out");
        self.emit(QueueEvent::Timeout(task));

        if let Some(callback) = on_timeout
            && panic::catch_unwind(AssertUnwindSafe(callback)).is_err()
        {
            warn!("on_timeout callback panicked");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(timer) = state.timer.take() {
            timer.cancel();
        }
    }
}
