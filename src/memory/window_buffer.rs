use std::{collections::VecDeque, sync::Arc};

use tokio::sync::RwLock;

use crate::schemas::Message;

use super::Memory;

const DEFAULT_WINDOW_SIZE: usize = 10;

/// Keeps only the most recent `window_size` messages.
#[derive(Debug, Clone)]
pub struct WindowBufferMemory {
    window_size: usize,
    messages: VecDeque<Message>,
}

impl WindowBufferMemory {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size,
            messages: VecDeque::with_capacity(window_size),
        }
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}

impl Default for WindowBufferMemory {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_SIZE)
    }
}

impl From<WindowBufferMemory> for Arc<RwLock<dyn Memory>> {
    fn from(val: WindowBufferMemory) -> Self {
        Arc::new(RwLock::new(val))
    }
}

impl Memory for WindowBufferMemory {
    fn messages(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    fn add_message(&mut self, message: Message) {
        if self.window_size == 0 {
            return;
        }
        if self.messages.len() >= self.window_size {
            self.messages.pop_front();
        }
        self.messages.push_back(message);
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}
