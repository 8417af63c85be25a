use std::sync::Arc;

use tokio::sync::RwLock;

use crate::schemas::Message;

use super::Memory;

/// Unbounded in-process history.
#[derive(Debug, Default, Clone)]
pub struct SimpleMemory {
    messages: Vec<Message>,
}

impl SimpleMemory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<SimpleMemory> for Arc<RwLock<dyn Memory>> {
    fn from(val: SimpleMemory) -> Self {
        Arc::new(RwLock::new(val))
    }
}

impl Memory for SimpleMemory {
    fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    fn add_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_exchange_and_history() {
        let mut memory = SimpleMemory::new();
        memory.save_exchange("what is 2+2?", "4");
        memory.save_exchange("and times 3?", "12");

        assert_eq!(memory.messages().len(), 4);
        assert_eq!(
            memory.history("Human", "AI"),
            "Human: what is 2+2?\nAI: 4\nHuman: and times 3?\nAI: 12"
        );

        memory.clear();
        assert!(memory.messages().is_empty());
        assert_eq!(memory.history("Human", "AI"), "");
    }
}
