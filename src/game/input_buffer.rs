//! Lock-free input buffer between connection handlers and the simulation
//!
//! Uses crossbeam-channel so connection tasks can submit inputs without
//! awaiting the session task; the tick drains everything at its start.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::game::constants::net::INPUT_BUFFER_SIZE;
use crate::game::state::EntityId;
use crate::net::protocol::InputState;

/// Input message from a connection
#[derive(Debug, Clone)]
pub struct InputMessage {
    pub entity_id: EntityId,
    pub input: InputState,
}

/// Bounded input buffer
///
/// Inputs are drained in arrival order, so applying them in sequence gives
/// last-write-wins per entity.
pub struct InputBuffer {
    sender: Sender<InputMessage>,
    receiver: Receiver<InputMessage>,
}

impl InputBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Create a new sender handle for a connection
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Drain all pending inputs for this tick
    pub fn drain(&self) -> Vec<InputMessage> {
        self.receiver.try_iter().collect()
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new(INPUT_BUFFER_SIZE)
    }
}

/// Clonable sender handle for connection handlers
#[derive(Clone)]
pub struct InputSender {
    sender: Sender<InputMessage>,
}

impl InputSender {
    /// Submit an input (non-blocking)
    #[inline]
    pub fn try_send(&self, entity_id: EntityId, input: InputState) -> Result<(), InputBufferError> {
        self.sender
            .try_send(InputMessage { entity_id, input })
            .map_err(|e| match e {
                TrySendError::Full(_) => InputBufferError::Full,
                TrySendError::Disconnected(_) => InputBufferError::Disconnected,
            })
    }
}

/// Input buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InputBufferError {
    /// Buffer is full (backpressure)
    #[error("input buffer full")]
    Full,
    /// Session task has stopped
    #[error("input buffer disconnected")]
    Disconnected,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn create_test_input(aim_angle: f32) -> InputState {
        InputState {
            right: true,
            aim_angle,
            ..Default::default()
        }
    }

    #[test]
    fn test_input_buffer_submit_and_drain() {
        let buffer = InputBuffer::new(10);
        let sender = buffer.sender();
        let entity_id = Uuid::new_v4();

        for aim in [1.0, 2.0, 3.0] {
            assert!(sender.try_send(entity_id, create_test_input(aim)).is_ok());
        }

        let inputs = buffer.drain();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0].input.aim_angle, 1.0);
        assert_eq!(inputs[2].input.aim_angle, 3.0);
        assert!(buffer.drain().is_empty());
    }

    #[test]
    fn test_input_buffer_backpressure() {
        let buffer = InputBuffer::new(2);
        let sender = buffer.sender();
        let entity_id = Uuid::new_v4();

        assert!(sender.try_send(entity_id, create_test_input(1.0)).is_ok());
        assert!(sender.try_send(entity_id, create_test_input(2.0)).is_ok());
        assert_eq!(sender.try_send(entity_id, create_test_input(3.0)), Err(InputBufferError::Full));

        buffer.drain();
        assert!(sender.try_send(entity_id, create_test_input(3.0)).is_ok());
    }

    #[test]
    fn test_input_sender_clone() {
        let buffer = InputBuffer::new(10);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let sender1 = buffer.sender();
        let sender2 = sender1.clone();
        assert!(sender1.try_send(a, create_test_input(1.0)).is_ok());
        assert!(sender2.try_send(b, create_test_input(2.0)).is_ok());

        let inputs = buffer.drain();
        assert_eq!(inputs[0].entity_id, a);
        assert_eq!(inputs[1].entity_id, b);
    }

    #[test]
    fn test_sender_outliving_buffer_reports_disconnect() {
        let sender = InputBuffer::default().sender();
        assert_eq!(
            sender.try_send(Uuid::new_v4(), create_test_input(0.0)),
            Err(InputBufferError::Disconnected)
        );
    }
}
