//! Per-turn conversation state.

use mnemos_protocol::Message;

/// State carried through the turn graph; owned by a single turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationState {
    /// Thread history followed by the messages of this turn.
    pub messages: Vec<Message>,
    /// Core facts loaded at turn start.
    pub core_memories: Vec<String>,
    /// Recall snippets loaded at turn start.
    pub recall_memories: Vec<String>,
    /// Agent node executions so far.
    pub iterations: usize,
    /// Index of the first message appended by this turn.
    turn_start: usize,
}

impl ConversationState {
    /// Start a turn on top of prior thread history.
    pub fn new(history: Vec<Message>, user_message: Message) -> Self {
        let turn_start = history.len();
        let mut messages = history;
        messages.push(user_message);
        Self {
            messages,
            turn_start,
            ..Self::default()
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Messages appended during this turn, starting with the user message.
    pub fn transcript(&self) -> &[Message] {
        &self.messages[self.turn_start..]
    }
}
