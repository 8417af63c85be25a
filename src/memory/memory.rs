use crate::schemas::Message;

/// Conversation history shared across agent runs.
///
/// The executor renders it into the `chat_history` prompt variable before a run and
/// records the exchange once the run finishes.
pub trait Memory: Send + Sync {
    fn messages(&self) -> Vec<Message>;

    fn add_message(&mut self, message: Message);

    fn clear(&mut self);

    fn history(&self, human_prefix: &str, ai_prefix: &str) -> String {
        Message::render_history(&self.messages(), human_prefix, ai_prefix)
    }

    fn save_exchange(&mut self, input: &str, output: &str) {
        self.add_human_message(input);
        self.add_ai_message(output);
    }

    fn add_human_message(&mut self, content: &str) {
        self.add_message(Message::new_human_message(content))
    }

    fn add_ai_message(&mut self, content: &str) {
        self.add_message(Message::new_ai_message(content))
    }
}

impl<M> From<M> for Box<dyn Memory>
where
    M: Memory + 'static,
{
    fn from(memory: M) -> Self {
        Box::new(memory)
    }
}
