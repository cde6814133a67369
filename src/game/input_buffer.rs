//! Lock-free input intake for the game loop
//!
//! Connection handlers submit headings through a bounded crossbeam channel
//! without blocking; the game loop drains everything at the start of each
//! tick and coalesces to the latest input per player. Older inputs from the
//! same window are discarded silently.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use hashbrown::HashMap;

use crate::game::state::PlayerId;
use crate::net::protocol::PlayerInput;

/// Input message from a player connection
#[derive(Debug, Clone)]
pub struct InputMessage {
    pub player_id: PlayerId,
    pub input: PlayerInput,
}

/// Bounded MPSC intake shared by all of a room's connections
pub struct InputBuffer {
    sender: Sender<InputMessage>,
    receiver: Receiver<InputMessage>,
    capacity: usize,
}

impl InputBuffer {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    /// Create a sender handle for a connection
    pub fn sender(&self) -> InputSender {
        InputSender {
            sender: self.sender.clone(),
        }
    }

    /// Try to submit an input (non-blocking); false when the buffer is full
    #[inline]
    pub fn try_submit(&self, player_id: PlayerId, input: PlayerInput) -> bool {
        self.sender
            .try_send(InputMessage { player_id, input })
            .is_ok()
    }

    /// Drain all pending inputs, keeping only the latest per player
    pub fn drain_latest(&self) -> HashMap<PlayerId, PlayerInput> {
        let mut latest = HashMap::new();
        for message in self.receiver.try_iter() {
            latest.insert(message.player_id, message.input);
        }
        latest
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        // Enough headroom for every player sending at client frame rate
        // between two server ticks
        Self::new(1024)
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
    pub fn try_send(&self, player_id: PlayerId, input: PlayerInput) -> Result<(), InputBufferError> {
        self.sender
            .try_send(InputMessage { player_id, input })
            .map_err(|e| match e {
                TrySendError::Full(_) => InputBufferError::Full,
                TrySendError::Disconnected(_) => InputBufferError::Disconnected,
            })
    }
}

/// Input buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputBufferError {
    /// Buffer is full (backpressure)
    Full,
    /// Channel disconnected (game loop stopped)
    Disconnected,
}
