//! Cooperative runtime: the periodic loops and the command channel.
//!
//! Runs on a single thread using `edge-executor` for cooperative
//! multi-task scheduling and `async-io-mini` for reactor-driven timers
//! (no busy-spinning).  Four concurrent futures:
//!
//! 1. **Safety**: `safety_tick` every `safety_loop_interval_ms`
//! 2. **Water**: `water_tick` every `control_loop_interval_ms`
//! 3. **Telemetry**: telemetry event every `telemetry_interval_secs`
//! 4. **Commands**: truly async via `commands.receive().await`
//!    (wakes as soon as a [`ShowerHandle`] sends)
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────┐
//!  │  futures_lite::block_on                                  │
//!  │  ┌────────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                      │  │
//!  │  │                                                    │  │
//!  │  │  ┌────────┐ ┌────────┐ ┌───────────┐ ┌──────────┐  │  │
//!  │  │  │ Safety │ │ Water  │ │ Telemetry │ │ Commands │  │  │
//!  │  │  │ 100ms ⏱│ │ 100ms ⏱│ │  60s ⏱    │ │ on recv  │  │  │
//!  │  │  └────────┘ └────────┘ └───────────┘ └──────────┘  │  │
//!  │  └────────────────────────────────────────────────────┘  │
//!  └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Shared state lives in `RefCell`s that are only borrowed inside a
//! synchronous closure, never across an `.await`.  Each tick (read →
//! evaluate → drain) therefore finishes before any other loop runs.

use core::cell::{Cell, RefCell};
use core::future::Future;
use core::time::Duration;
use std::rc::Rc;

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use log::{info, warn};

use crate::app::commands::{CommandReply, ShowerCommand};
use crate::app::ports::{ActuatorPort, AudioPort, EventSink, SensorPort};
use crate::app::service::ShowerService;
use crate::error::Result;

/// Channel depth for command (inbound) messages.
const CMD_DEPTH: usize = 8;

/// Channel depth for response (outbound) messages.
const RESP_DEPTH: usize = 8;

// ── Channel messages ─────────────────────────────────────────

/// Inbound command, delivered to the command loop.
pub struct CommandMsg {
    /// Correlates the reply with the request.
    pub id: u32,
    pub command: ShowerCommand,
}

/// Outbound reply, delivered back to the requesting handle.
pub struct ResponseMsg {
    pub id: u32,
    pub result: Result<CommandReply>,
}

struct Mailbox {
    commands: Channel<NoopRawMutex, CommandMsg, CMD_DEPTH>,
    responses: Channel<NoopRawMutex, ResponseMsg, RESP_DEPTH>,
    /// One request/response exchange at a time.
    turn: Mutex<NoopRawMutex, ()>,
    next_id: Cell<u32>,
}

// ── Handle ───────────────────────────────────────────────────

/// Cheap, clonable entry point for command surfaces running on the same
/// executor.
#[derive(Clone)]
pub struct ShowerHandle {
    mailbox: Rc<Mailbox>,
}

impl ShowerHandle {
    /// Send a command and wait for the coordinator's reply.
    pub async fn request(&self, command: ShowerCommand) -> Result<CommandReply> {
        let _turn = self.mailbox.turn.lock().await;
        let id = self.mailbox.next_id.get().wrapping_add(1);
        self.mailbox.next_id.set(id);
        self.mailbox.commands.send(CommandMsg { id, command }).await;
        loop {
            let resp = self.mailbox.responses.receive().await;
            if resp.id == id {
                return resp.result;
            }
            warn!("RUNTIME: dropping stale reply {}", resp.id);
        }
    }
}

// ── Shared state ─────────────────────────────────────────────

struct Shared<H, A, S> {
    service: RefCell<ShowerService>,
    hw: RefCell<H>,
    audio: RefCell<A>,
    sink: RefCell<S>,
    safety_interval: Duration,
    water_interval: Duration,
    telemetry_interval: Duration,
}

impl<H, A, S> Shared<H, A, S>
where
    H: SensorPort + ActuatorPort,
    A: AudioPort,
    S: EventSink,
{
    /// Borrow everything for one synchronous step.
    fn with_parts<R>(&self, f: impl FnOnce(&mut ShowerService, &mut H, &mut A, &mut S) -> R) -> R {
        let mut service = self.service.borrow_mut();
        let mut hw = self.hw.borrow_mut();
        let mut audio = self.audio.borrow_mut();
        let mut sink = self.sink.borrow_mut();
        f(&mut service, &mut hw, &mut audio, &mut sink)
    }
}

// ── Async loops ──────────────────────────────────────────────

async fn safety_loop<H, A, S>(shared: Rc<Shared<H, A, S>>)
where
    H: SensorPort + ActuatorPort,
    A: AudioPort,
    S: EventSink,
{
    loop {
        shared.with_parts(|svc, hw, audio, sink| svc.safety_tick(hw, audio, sink));
        async_io_mini::Timer::after(shared.safety_interval).await;
    }
}

async fn water_loop<H, A, S>(shared: Rc<Shared<H, A, S>>)
where
    H: SensorPort + ActuatorPort,
    A: AudioPort,
    S: EventSink,
{
    loop {
        shared.with_parts(|svc, hw, audio, sink| svc.water_tick(hw, audio, sink));
        async_io_mini::Timer::after(shared.water_interval).await;
    }
}

async fn telemetry_loop<H, A, S>(shared: Rc<Shared<H, A, S>>)
where
    H: SensorPort + ActuatorPort,
    A: AudioPort,
    S: EventSink,
{
    loop {
        async_io_mini::Timer::after(shared.telemetry_interval).await;
        shared.with_parts(|svc, _hw, _audio, sink| svc.emit_telemetry(sink));
    }
}

/// Truly async: wakes as soon as a handle sends.  No polling.
async fn command_loop<H, A, S>(shared: Rc<Shared<H, A, S>>, mailbox: Rc<Mailbox>)
where
    H: SensorPort + ActuatorPort,
    A: AudioPort,
    S: EventSink,
{
    loop {
        let msg = mailbox.commands.receive().await;
        let result = shared.with_parts(|svc, hw, audio, sink| {
            svc.handle_command(msg.command, hw, audio, sink)
        });
        if let Err(e) = &result {
            info!("RUNTIME: command {} rejected: {}", msg.id, e);
        }
        mailbox.responses.send(ResponseMsg { id: msg.id, result }).await;
    }
}

// ── Runtime ──────────────────────────────────────────────────

pub struct Runtime<H, A, S> {
    shared: Rc<Shared<H, A, S>>,
    mailbox: Rc<Mailbox>,
}

impl<H, A, S> Runtime<H, A, S>
where
    H: SensorPort + ActuatorPort + 'static,
    A: AudioPort + 'static,
    S: EventSink + 'static,
{
    pub fn new(service: ShowerService, hw: H, audio: A, sink: S) -> Self {
        let config = service.config();
        let safety_interval = Duration::from_millis(u64::from(config.safety_loop_interval_ms));
        let water_interval = Duration::from_millis(u64::from(config.control_loop_interval_ms));
        let telemetry_interval = Duration::from_secs(u64::from(config.telemetry_interval_secs));
        Self {
            shared: Rc::new(Shared {
                service: RefCell::new(service),
                hw: RefCell::new(hw),
                audio: RefCell::new(audio),
                sink: RefCell::new(sink),
                safety_interval,
                water_interval,
                telemetry_interval,
            }),
            mailbox: Rc::new(Mailbox {
                commands: Channel::new(),
                responses: Channel::new(),
                turn: Mutex::new(()),
                next_id: Cell::new(0),
            }),
        }
    }

    pub fn handle(&self) -> ShowerHandle {
        ShowerHandle {
            mailbox: self.mailbox.clone(),
        }
    }

    /// Touch the hardware adapter between ticks (simulation, tests).
    pub fn with_hardware<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.shared.hw.borrow_mut())
    }

    /// Read-only access to the coordinator between ticks.
    pub fn with_service<R>(&self, f: impl FnOnce(&ShowerService) -> R) -> R {
        f(&self.shared.service.borrow())
    }

    /// Spawn the loops and drive them until `until` completes.
    pub fn run_until<F: Future>(&self, until: F) -> F::Output {
        let executor: edge_executor::LocalExecutor<'_, 8> = edge_executor::LocalExecutor::new();

        executor.spawn(safety_loop(self.shared.clone())).detach();
        executor.spawn(water_loop(self.shared.clone())).detach();
        executor.spawn(telemetry_loop(self.shared.clone())).detach();
        executor
            .spawn(command_loop(self.shared.clone(), self.mailbox.clone()))
            .detach();

        info!(
            "Runtime started (safety {:?}, water {:?}, telemetry {:?})",
            self.shared.safety_interval, self.shared.water_interval, self.shared.telemetry_interval
        );

        futures_lite::future::block_on(executor.run(until))
    }
}
