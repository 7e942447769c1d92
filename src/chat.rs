use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Bot => "Bot",
        }
    }
}

/// One chat turn. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    text: String,
    sender: Sender,
    timestamp: DateTime<Local>,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, sender: Sender) -> Self {
        Self {
            text: text.into(),
            sender,
            timestamp: Local::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, Sender::User)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(text, Sender::Bot)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }
}

/// Append-only, ordered list of chat turns.
#[derive(Debug, Default, Clone)]
pub struct MessageFeed {
    messages: Vec<ChatMessage>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_keeps_insertion_order() {
        let mut feed = MessageFeed::new();
        assert!(feed.is_empty());

        feed.push(ChatMessage::user("Hi"));
        feed.push(ChatMessage::bot("Hello from Bot!"));
        feed.push(ChatMessage::user("How are rates?"));

        let turns: Vec<(Sender, &str)> = feed.iter().map(|m| (m.sender(), m.text())).collect();
        assert_eq!(
            turns,
            vec![
                (Sender::User, "Hi"),
                (Sender::Bot, "Hello from Bot!"),
                (Sender::User, "How are rates?"),
            ]
        );
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.last().map(|m| m.text()), Some("How are rates?"));
    }

    #[test]
    fn test_sender_labels() {
        assert_eq!(Sender::User.label(), "You");
        assert_eq!(Sender::Bot.label(), "Bot");
    }
}
