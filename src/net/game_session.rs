//! Game session - owns the game loop, runs the ticker and broadcasts state
//!
//! The session task is the only writer of simulation state. Joins and
//! disconnects arrive as commands on an mpsc channel and are handled between
//! ticks; inputs bypass the channel through the lock-free input buffer.

use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::constants::net::COMMAND_BUFFER_SIZE;
use crate::game::constants::tick::{STATUS_LOG_INTERVAL, TICK_DURATION_US, TICK_RATE};
use crate::game::game_loop::{GameLoop, JoinError, Joined, TickError, TickOutput};
use crate::game::input_buffer::InputSender;
use crate::game::state::{EntityId, Millis};
use crate::net::protocol::{encode, GameEvent, InputState, ServerMessage};

/// Encoded frame shared by every subscriber
pub type Frame = Arc<[u8]>;

/// Commands handled by the session task between ticks
#[derive(Debug)]
pub enum SessionCommand {
    Join {
        name: String,
        reply: oneshot::Sender<Result<Joined, JoinError>>,
    },
    Disconnect {
        entity_id: EntityId,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Join(#[from] JoinError),
    #[error("game session has stopped")]
    Closed,
}

/// Clonable handle used by connection tasks
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    inputs: InputSender,
    frames: broadcast::Sender<Frame>,
    started: Instant,
}

impl SessionHandle {
    pub async fn join(&self, name: String) -> Result<Joined, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(SessionCommand::Join { name, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        Ok(rx.await.map_err(|_| SessionError::Closed)??)
    }

    pub async fn disconnect(&self, entity_id: EntityId) {
        if self.commands.send(SessionCommand::Disconnect { entity_id }).await.is_err() {
            debug!("Disconnect for {} after session stopped", entity_id);
        }
    }

    /// Queue input for the next tick. Returns false under backpressure.
    pub fn submit_input(&self, entity_id: EntityId, input: InputState) -> bool {
        self.inputs.try_send(entity_id, input).is_ok()
    }

    /// Receive every broadcast frame from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.frames.subscribe()
    }

    /// Milliseconds since the session started
    pub fn now(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }
}

pub struct GameSession {
    game_loop: GameLoop,
    commands: mpsc::Receiver<SessionCommand>,
    frames: broadcast::Sender<Frame>,
    started: Instant,
    ticks: u64,
    tick_faults: u64,
}

impl GameSession {
    pub fn new(game_loop: GameLoop, broadcast_buffer: usize) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER_SIZE);
        let (frames, _) = broadcast::channel(broadcast_buffer.max(1));
        let started = Instant::now();

        let handle = SessionHandle {
            commands: command_tx,
            inputs: game_loop.input_sender(),
            frames: frames.clone(),
            started,
        };

        let session = Self {
            game_loop,
            commands: command_rx,
            frames,
            started,
            ticks: 0,
            tick_faults: 0,
        };

        (session, handle)
    }

    pub fn game_loop(&self) -> &GameLoop {
        &self.game_loop
    }

    pub fn tick_faults(&self) -> u64 {
        self.tick_faults
    }

    fn now(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }

    /// Run until `shutdown` resolves or every handle is dropped
    pub async fn run<F: Future<Output = ()>>(mut self, shutdown: F) {
        let now = self.now();
        let events = self.game_loop.populate(now);
        info!(
            "Game loop started at {} Hz with {} bots",
            TICK_RATE,
            self.game_loop.bot_count()
        );
        self.broadcast_events(events);

        let mut ticker = interval(Duration::from_micros(TICK_DURATION_US));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.run_tick(),
                command = self.commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = &mut shutdown => break,
            }
        }

        info!("Game loop stopped after {} ticks ({} faults)", self.ticks, self.tick_faults);
    }

    /// Handle one join or disconnect inside the handler fault boundary
    pub fn handle_command(&mut self, command: SessionCommand) {
        let now = self.now();
        match command {
            SessionCommand::Join { name, reply } => {
                let result = catch_unwind(AssertUnwindSafe(|| self.game_loop.join(&name, now)));
                match result {
                    Ok(Ok(joined)) => {
                        self.broadcast_events(joined.events.clone());
                        if reply.send(Ok(joined)).is_err() {
                            debug!("Join reply dropped, connection already gone");
                        }
                    }
                    Ok(Err(e)) => {
                        info!("Join from {:?} rejected: {}", name, e);
                        let _ = reply.send(Err(e));
                    }
                    Err(panic) => warn!("Join handler fault: {}", panic_message(panic)),
                }
            }
            SessionCommand::Disconnect { entity_id } => {
                let result = catch_unwind(AssertUnwindSafe(|| self.game_loop.disconnect(entity_id, now)));
                match result {
                    Ok(events) => self.broadcast_events(events),
                    Err(panic) => warn!("Disconnect handler fault: {}", panic_message(panic)),
                }
            }
        }
    }

    /// Sanitise, tick inside the fault boundary, broadcast the results
    pub fn run_tick(&mut self) {
        let now = self.now();
        self.ticks += 1;

        let fixed = self.game_loop.sanitize();
        if fixed > 0 {
            warn!("Sanitized {} entities before tick {}", fixed, self.ticks);
        }

        let result = contain(|| self.game_loop.tick(now));
        self.finish_tick(result);
    }

    /// Broadcast a tick's output, or count and log its fault
    ///
    /// A fault skips this tick's broadcast only; the next tick runs normally.
    fn finish_tick(&mut self, result: Result<TickOutput, TickError>) {
        match result {
            Ok(output) => {
                self.broadcast_events(output.events);
                self.broadcast(&ServerMessage::Snapshot(output.snapshot));
            }
            Err(e) => {
                self.tick_faults += 1;
                warn!("Tick {} aborted: {}", self.ticks, e);
            }
        }

        if self.ticks % STATUS_LOG_INTERVAL == 0 {
            info!(
                "Game: {}s, tick {}, {} humans + {} bots, {} tick faults",
                self.started.elapsed().as_secs(),
                self.game_loop.world().tick,
                self.game_loop.human_count(),
                self.game_loop.bot_count(),
                self.tick_faults
            );
        }
    }

    fn broadcast_events(&self, events: Vec<GameEvent>) {
        for event in events {
            if let GameEvent::Hit { shooter_id, target_id, killed: true, .. } = &event {
                debug!("{} killed {}", shooter_id, target_id);
            }
            self.broadcast(&ServerMessage::Event(event));
        }
    }

    fn broadcast(&self, message: &ServerMessage) {
        match encode(message) {
            // No subscribers is not an error
            Ok(bytes) => {
                let _ = self.frames.send(Frame::from(bytes));
            }
            Err(e) => warn!("Failed to encode message for broadcast: {}", e),
        }
    }
}

/// Run one tick step inside the fault boundary, turning a panic into `TickError::Panicked`
fn contain<T>(step: impl FnOnce() -> Result<T, TickError>) -> Result<T, TickError> {
    catch_unwind(AssertUnwindSafe(step)).unwrap_or_else(|panic| Err(TickError::Panicked(panic_message(panic))))
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
