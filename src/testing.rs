//! Test doubles shared by the unit tests: a ping event, recording listeners,
//! a scriptable module and a journal of hook calls.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Barrier;

use crate::error::{DispatchError, HookError};
use crate::events::{
    Args, Event, EventKey, FromArgs, ModuleFaulted, PhaseCompleted, Priority, ShutdownRequested,
};
use crate::listeners::EventListener;
use crate::modules::{Module, ModuleContext, ModuleKind, ModuleState, Phase};

/// `test.ping`, args `[u32]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ping(pub(crate) u32);

impl Event for Ping {
    fn key(&self) -> EventKey {
        Self::KEY
    }
}

impl FromArgs for Ping {
    const KEY: EventKey = EventKey::new("test.ping");

    fn from_args(args: &Args) -> Result<Self, DispatchError> {
        Ok(Self(args.cloned(Self::KEY, 0)?))
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

/// Records pings and priorities; can be told to panic, hang or wait on a barrier.
pub(crate) struct RecordingListener {
    name: &'static str,
    pings: Mutex<Vec<u32>>,
    priorities: Mutex<Vec<Priority>>,
    received: AtomicUsize,
    panics: bool,
    hangs: bool,
    gate: Option<Barrier>,
}

impl RecordingListener {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            pings: Mutex::new(Vec::new()),
            priorities: Mutex::new(Vec::new()),
            received: AtomicUsize::new(0),
            panics: false,
            hangs: false,
            gate: None,
        }
    }

    pub(crate) fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }

    pub(crate) fn hanging(mut self) -> Self {
        self.hangs = true;
        self
    }

    /// Every delivery waits until `n` deliveries are in flight at once.
    pub(crate) fn gated(mut self, n: usize) -> Self {
        self.gate = Some(Barrier::new(n));
        self
    }

    pub(crate) fn pings(&self) -> Vec<u32> {
        lock(&self.pings).clone()
    }

    pub(crate) fn priorities(&self) -> Vec<Priority> {
        lock(&self.priorities).clone()
    }

    pub(crate) fn received(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventListener for RecordingListener {
    async fn on_event(&self, event: &dyn Event, priority: Priority) {
        self.received.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if self.hangs {
            std::future::pending::<()>().await;
        }
        if self.panics {
            panic!("listener {} exploded", self.name);
        }
        if let Some(ping) = event.downcast_ref::<Ping>() {
            lock(&self.pings).push(ping.0);
        }
        lock(&self.priorities).push(priority);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// A second listener type for dedicated dispatch.
#[derive(Default)]
pub(crate) struct OtherListener {
    received: AtomicUsize,
}

impl OtherListener {
    pub(crate) fn received(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventListener for OtherListener {
    async fn on_event(&self, _event: &dyn Event, _priority: Priority) {
        self.received.fetch_add(1, Ordering::SeqCst);
    }

    fn name(&self) -> &'static str {
        "other"
    }
}

/// Records lifecycle events; optionally fails `prepare`.
#[derive(Default)]
pub(crate) struct LifecycleRecorder {
    phases: Mutex<Vec<Phase>>,
    faults: Mutex<Vec<ModuleFaulted>>,
    shutdowns: Mutex<Vec<Arc<str>>>,
    prepared: AtomicUsize,
    fail_prepare: bool,
    journal: Option<Journal>,
}

impl LifecycleRecorder {
    /// Records `prepare` into `journal` under the name `recorder`.
    pub(crate) fn journaled(journal: &Journal) -> Self {
        Self {
            journal: Some(journal.clone()),
            ..Self::default()
        }
    }

    pub(crate) fn failing_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    pub(crate) fn prepared(&self) -> usize {
        self.prepared.load(Ordering::SeqCst)
    }

    pub(crate) fn phases(&self) -> Vec<Phase> {
        lock(&self.phases).clone()
    }

    pub(crate) fn faults(&self) -> Vec<ModuleFaulted> {
        lock(&self.faults).clone()
    }

    pub(crate) fn shutdowns(&self) -> Vec<Arc<str>> {
        lock(&self.shutdowns).clone()
    }
}

#[async_trait]
impl EventListener for LifecycleRecorder {
    async fn on_event(&self, event: &dyn Event, _priority: Priority) {
        if let Some(e) = event.downcast_ref::<PhaseCompleted>() {
            lock(&self.phases).push(e.phase);
        } else if let Some(e) = event.downcast_ref::<ModuleFaulted>() {
            lock(&self.faults).push(e.clone());
        } else if let Some(e) = event.downcast_ref::<ShutdownRequested>() {
            lock(&self.shutdowns).push(Arc::clone(&e.reason));
        }
    }

    fn name(&self) -> &'static str {
        "recorder"
    }

    async fn prepare(&self) -> Result<(), HookError> {
        self.prepared.fetch_add(1, Ordering::SeqCst);
        if let Some(journal) = &self.journal {
            journal.record("recorder", Phase::Assert);
        }
        if self.fail_prepare {
            return Err(HookError::fail("recorder not ready"));
        }
        Ok(())
    }
}

/// Ordered log of `(module, phase)` hook invocations across modules.
///
/// `prepare` of a [`LifecycleRecorder`] is logged as `("recorder", Phase::Assert)`.
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<(&'static str, Phase)>>>);

impl Journal {
    pub(crate) fn record(&self, module: &'static str, phase: Phase) {
        lock(&self.0).push((module, phase));
    }

    pub(crate) fn entries(&self) -> Vec<(&'static str, Phase)> {
        lock(&self.0).clone()
    }

    /// Modules that ran `phase`, in call order.
    pub(crate) fn ran(&self, phase: Phase) -> Vec<&'static str> {
        lock(&self.0)
            .iter()
            .filter(|(_, p)| *p == phase)
            .map(|(m, _)| *m)
            .collect()
    }

    /// Phases `module` ran, in call order.
    pub(crate) fn phases_of(&self, module: &str) -> Vec<Phase> {
        lock(&self.0)
            .iter()
            .filter(|(m, _)| *m == module)
            .map(|(_, p)| *p)
            .collect()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Worker {
    /// Exits on cancellation.
    Cooperative,
    /// Never exits.
    Stuck,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Script {
    Fail,
    Panic,
    Hang,
}

/// A module whose hooks log to a [`Journal`] and misbehave on request.
pub(crate) struct ScriptedModule {
    name: &'static str,
    kind: ModuleKind,
    state: ModuleState,
    journal: Journal,
    script: Vec<(Phase, Script)>,
    worker: Option<Worker>,
    request_shutdown: bool,
    pings: Mutex<Vec<u32>>,
}

impl ScriptedModule {
    pub(crate) fn new(name: &'static str, kind: ModuleKind, journal: &Journal) -> Self {
        Self {
            name,
            kind,
            state: ModuleState::new(),
            journal: journal.clone(),
            script: Vec::new(),
            worker: None,
            request_shutdown: false,
            pings: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing(mut self, phase: Phase) -> Self {
        self.script.push((phase, Script::Fail));
        self
    }

    pub(crate) fn panicking(mut self, phase: Phase) -> Self {
        self.script.push((phase, Script::Panic));
        self
    }

    pub(crate) fn hanging(mut self, phase: Phase) -> Self {
        self.script.push((phase, Script::Hang));
        self
    }

    /// Spawns a `<name>/loop` worker in `launch` that exits on cancellation.
    pub(crate) fn with_worker(mut self) -> Self {
        self.worker = Some(Worker::Cooperative);
        self
    }

    /// Spawns a `<name>/stuck` worker in `launch` that never exits.
    pub(crate) fn with_stuck_worker(mut self) -> Self {
        self.worker = Some(Worker::Stuck);
        self
    }

    /// Calls `request_shutdown` from `post_launch`.
    pub(crate) fn requesting_shutdown(mut self) -> Self {
        self.request_shutdown = true;
        self
    }

    pub(crate) fn pings(&self) -> Vec<u32> {
        lock(&self.pings).clone()
    }

    fn script_for(&self, phase: Phase) -> Option<Script> {
        self.script
            .iter()
            .find(|(p, _)| *p == phase)
            .map(|(_, s)| *s)
    }

    async fn step(&self, phase: Phase) -> Result<(), HookError> {
        self.journal.record(self.name, phase);
        match self.script_for(phase) {
            None => Ok(()),
            Some(Script::Fail) => Err(HookError::fail(format!("{} refused {phase}", self.name))),
            Some(Script::Panic) => panic!("{} panicked in {phase}", self.name),
            Some(Script::Hang) => std::future::pending().await,
        }
    }
}

#[async_trait]
impl EventListener for ScriptedModule {
    async fn on_event(&self, event: &dyn Event, _priority: Priority) {
        if let Some(ping) = event.downcast_ref::<Ping>() {
            lock(&self.pings).push(ping.0);
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

#[async_trait]
impl Module for ScriptedModule {
    fn kind(&self) -> ModuleKind {
        self.kind
    }

    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn assert(&self) -> Result<(), HookError> {
        self.journal.record(self.name, Phase::Assert);
        match self.script_for(Phase::Assert) {
            Some(Script::Panic) => panic!("{} panicked in assert", self.name),
            Some(_) => Err(HookError::precondition(format!("{} environment missing", self.name))),
            None => Ok(()),
        }
    }

    async fn init(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        self.step(Phase::Init).await
    }

    async fn pre_launch(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        self.step(Phase::PreLaunch).await
    }

    async fn launch(&self, ctx: &ModuleContext) -> Result<(), HookError> {
        self.step(Phase::Launch).await?;
        match self.worker {
            Some(Worker::Cooperative) => {
                ctx.spawn_worker("loop", |token| async move { token.cancelled().await });
            }
            Some(Worker::Stuck) => ctx.spawn_worker("stuck", |_token| std::future::pending()),
            None => {}
        }
        self.state.set_running(true);
        Ok(())
    }

    async fn post_launch(&self, ctx: &ModuleContext) -> Result<(), HookError> {
        self.step(Phase::PostLaunch).await?;
        if self.request_shutdown {
            ctx.request_shutdown();
        }
        Ok(())
    }

    async fn shutdown(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        self.state.set_running(false);
        self.step(Phase::Shutdown).await
    }
}
