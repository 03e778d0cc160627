//! # Example: assembly
//!
//! Assembles a small process out of four modules and runs it until Ctrl-C or
//! until `quit` is typed on stdin.
//!
//! Shows how to:
//! - Implement [`Module`] for credentials, console, database and gateway modules.
//! - Register custom events in an [`EventRegistry`] and dispatch them by key.
//! - Hand credentials only to the modules that need them with dedicated dispatch.
//! - Spawn tracked workers from `launch` and stop them through the context token.
//!
//! ## Flow
//! ```text
//! Orchestrator::run_until_signal()
//!     ├─► assert / init / pre-launch / launch / post-launch (all modules, phase by phase)
//!     │     ├─ Credentials.launch ─► emit_dedicated(CredentialsLoaded) ─► Database, Gateway
//!     │     ├─ Console.launch     ─► worker "console/stdin"    ─► dispatch("console.line", [line])
//!     │     └─ Gateway.launch     ─► worker "gateway/heartbeat" ─► emit(Heartbeat)
//!     ├─► SIGINT / "quit" ─► ShutdownRequested
//!     └─► shutdown_all() ─► cancel tokens ─► wait for workers
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=info,modvisor=debug cargo run --example assembly --features logging
//! ```

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use modvisor::{
    Args, BusConfig, DispatchError, Event, EventBus, EventKey, EventListener, EventRegistry,
    FromArgs, HookError, ListenerTargets, LogListener, Module, ModuleContext, ModuleKind,
    ModuleState, Orchestrator, OrchestratorConfig, Priority, ShutdownOrder, args,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ---- Events ----

#[derive(Debug, Clone)]
struct CredentialsLoaded {
    service: &'static str,
    token: String,
}

impl Event for CredentialsLoaded {
    fn key(&self) -> EventKey {
        EventKey::new("credentials.loaded")
    }
    fn priority(&self) -> Priority {
        Priority::High
    }
}

#[derive(Debug)]
struct ConsoleLine {
    line: String,
}

impl Event for ConsoleLine {
    fn key(&self) -> EventKey {
        Self::KEY
    }
}

impl FromArgs for ConsoleLine {
    const KEY: EventKey = EventKey::new("console.line");

    fn from_args(args: &Args) -> Result<Self, DispatchError> {
        Ok(Self {
            line: args.cloned(Self::KEY, 0)?,
        })
    }
}

#[derive(Debug)]
struct Heartbeat {
    beat: u64,
}

impl Event for Heartbeat {
    fn key(&self) -> EventKey {
        EventKey::new("gateway.heartbeat")
    }
    fn priority(&self) -> Priority {
        Priority::Low
    }
}

// ---- Modules ----

#[derive(Default)]
struct Credentials {
    state: ModuleState,
}

#[async_trait]
impl EventListener for Credentials {
    async fn on_event(&self, _event: &dyn Event, _priority: Priority) {}
    fn name(&self) -> &'static str {
        "credentials"
    }
}

#[async_trait]
impl Module for Credentials {
    fn kind(&self) -> ModuleKind {
        ModuleKind::CREDENTIALS
    }
    fn state(&self) -> &ModuleState {
        &self.state
    }

    fn assert(&self) -> Result<(), HookError> {
        if std::env::var_os("MODVISOR_DEMO_DENY").is_some() {
            return Err(HookError::precondition("MODVISOR_DEMO_DENY is set"));
        }
        Ok(())
    }

    async fn init(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        Ok(())
    }

    async fn launch(&self, ctx: &ModuleContext) -> Result<(), HookError> {
        let token = std::env::var("MODVISOR_DEMO_TOKEN").unwrap_or_else(|_| "demo-token".into());
        let targets = ListenerTargets::of::<Database>().and::<Gateway>();
        for service in ["database", "gateway"] {
            ctx.bus()
                .emit_dedicated(
                    CredentialsLoaded {
                        service,
                        token: token.clone(),
                    },
                    &targets,
                )
                .await;
        }
        self.state.set_running(true);
        Ok(())
    }

    async fn shutdown(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        self.state.set_running(false);
        Ok(())
    }
}

#[derive(Default)]
struct Console {
    state: ModuleState,
}

#[async_trait]
impl EventListener for Console {
    async fn on_event(&self, _event: &dyn Event, _priority: Priority) {}
    fn name(&self) -> &'static str {
        "console"
    }
}

#[async_trait]
impl Module for Console {
    fn kind(&self) -> ModuleKind {
        ModuleKind::CONSOLE
    }
    fn state(&self) -> &ModuleState {
        &self.state
    }

    async fn init(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        Ok(())
    }

    async fn launch(&self, ctx: &ModuleContext) -> Result<(), HookError> {
        let worker_ctx = ctx.clone();
        ctx.spawn_worker("stdin", move |token| async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = tokio::select! {
                    _ = token.cancelled() => break,
                    line = lines.next_line() => line,
                };
                match line {
                    Ok(Some(line)) if line.trim() == "quit" => {
                        worker_ctx.request_shutdown();
                        break;
                    }
                    Ok(Some(line)) => {
                        let dispatched = worker_ctx.bus().dispatch(ConsoleLine::KEY, args![line]);
                        if let Err(e) = dispatched.await {
                            warn!("console line dropped: {e}");
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("stdin closed: {e}");
                        break;
                    }
                }
            }
        });
        self.state.set_running(true);
        Ok(())
    }

    async fn post_launch(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        info!("type a line to broadcast it, `quit` to stop");
        Ok(())
    }

    async fn shutdown(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        self.state.set_running(false);
        Ok(())
    }
}

#[derive(Default)]
struct Database {
    state: ModuleState,
    token: Mutex<Option<String>>,
}

#[async_trait]
impl EventListener for Database {
    async fn on_event(&self, event: &dyn Event, _priority: Priority) {
        if let Some(creds) = event.downcast_ref::<CredentialsLoaded>() {
            if creds.service == "database" {
                if let Ok(mut token) = self.token.lock() {
                    *token = Some(creds.token.clone());
                }
            }
        }
    }
    fn name(&self) -> &'static str {
        "database"
    }
}

#[async_trait]
impl Module for Database {
    fn kind(&self) -> ModuleKind {
        ModuleKind::DATABASE
    }
    fn state(&self) -> &ModuleState {
        &self.state
    }

    async fn init(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        Ok(())
    }

    async fn launch(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        Ok(())
    }

    async fn post_launch(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        // Credentials arrive during launch; an optional module only logs when they are missing.
        let connected = self.token.lock().map(|t| t.is_some()).unwrap_or(false);
        if !connected {
            self.state.set_healthy(false);
            return Err(HookError::fail("no database credentials"));
        }
        self.state.set_running(true);
        info!("database connected");
        Ok(())
    }

    async fn shutdown(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        self.state.set_running(false);
        Ok(())
    }
}

#[derive(Default)]
struct Gateway {
    state: ModuleState,
}

#[async_trait]
impl EventListener for Gateway {
    async fn on_event(&self, event: &dyn Event, _priority: Priority) {
        if let Some(line) = event.downcast_ref::<ConsoleLine>() {
            info!(line = %line.line, "gateway relaying console line");
        } else if let Some(creds) = event.downcast_ref::<CredentialsLoaded>() {
            if creds.service == "gateway" {
                info!("gateway authenticated");
            }
        }
    }
    fn name(&self) -> &'static str {
        "gateway"
    }
}

#[async_trait]
impl Module for Gateway {
    fn kind(&self) -> ModuleKind {
        ModuleKind::GATEWAY
    }
    fn state(&self) -> &ModuleState {
        &self.state
    }

    async fn init(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        Ok(())
    }

    async fn launch(&self, ctx: &ModuleContext) -> Result<(), HookError> {
        let bus = Arc::clone(ctx.bus());
        ctx.spawn_worker("heartbeat", move |token| async move {
            let mut tick = tokio::time::interval(Duration::from_secs(5));
            let mut beat = 0u64;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tick.tick() => {
                        beat += 1;
                        bus.emit(Heartbeat { beat }).await;
                    }
                }
            }
        });
        self.state.set_running(true);
        Ok(())
    }

    async fn shutdown(&self, _ctx: &ModuleContext) -> Result<(), HookError> {
        self.state.set_running(false);
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut registry = EventRegistry::with_lifecycle();
    registry.register_event::<ConsoleLine>()?;
    let bus = Arc::new(EventBus::new(
        registry,
        BusConfig {
            listener_timeout: Duration::from_secs(2),
        },
    ));

    let cfg = OrchestratorConfig {
        hook_timeout: Duration::from_secs(10),
        grace: Duration::from_secs(3),
        shutdown_order: ShutdownOrder::Reverse,
    };
    let mut orchestrator = Orchestrator::builder(cfg)
        .with_listener(Arc::new(LogListener))
        .with_module(Arc::new(Gateway::default()))
        .with_module(Arc::new(Database::default()))
        .with_module(Arc::new(Console::default()))
        .with_module(Arc::new(Credentials::default()))
        .build(bus)
        .await?;
    info!(order = ?orchestrator.startup_order(), "modules assembled");

    let report = orchestrator.run_until_signal().await?;
    for module in orchestrator.snapshot() {
        info!(module = module.name, stage = %module.stage, healthy = module.healthy, "final state");
    }
    if !report.stuck_workers.is_empty() {
        warn!(stuck = ?report.stuck_workers, "some workers did not stop in time");
    }
    Ok(())
}
