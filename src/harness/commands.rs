//! Single-key operator commands

/// Operator command bound to a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Connect,
    Disconnect,
    Subscribe,
    Publish,
    Quit,
}

impl KeyCommand {
    /// Parse operator input; surrounding whitespace (including the newline) is ignored
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "c" => Some(KeyCommand::Connect),
            "d" => Some(KeyCommand::Disconnect),
            "s" => Some(KeyCommand::Subscribe),
            "p" => Some(KeyCommand::Publish),
            "q" => Some(KeyCommand::Quit),
            _ => None,
        }
    }
}

pub const INVALID_KEY: &str = r#"Invalid key. Please press "c", "d", "s", "p", or "q"."#;

/// Usage text printed when the session starts
pub fn usage_banner(endpoint: &str, subscribe_topics: &[String], publish_topic: &str) -> String {
    format!(
        "
    ==== Usage ====
    Press 'c' to connect to AWS IoT broker {endpoint}.
    Press 'd' to disconnect.
    Press 's' to subscribe to topics {}.
    Press 'p' to publish a message to topic {publish_topic}.
    Press 'q' to exit the application.
",
        subscribe_topics.join(",")
    )
}
