use quran_core::CoreError;
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Info,
    Success,
    Warning,
    Error,
}

impl MessageType {
    fn label(self) -> &'static str {
        match self {
            MessageType::Info => "info",
            MessageType::Success => "ok",
            MessageType::Warning => "warning",
            MessageType::Error => "error",
        }
    }

    fn default_duration(self) -> Duration {
        match self {
            MessageType::Info => Duration::from_secs(3),
            MessageType::Success => Duration::from_secs(2),
            MessageType::Warning => Duration::from_secs(5),
            MessageType::Error => Duration::from_secs(7),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub content: String,
    pub message_type: MessageType,
    pub created_at: Instant,
    pub auto_clear_duration: Option<Duration>,
}

impl StatusMessage {
    pub fn new(content: String, message_type: MessageType) -> Self {
        Self {
            content,
            message_type,
            created_at: Instant::now(),
            auto_clear_duration: Some(message_type.default_duration()),
        }
    }

    pub fn with_duration(content: String, message_type: MessageType, duration: Duration) -> Self {
        Self {
            content,
            message_type,
            created_at: Instant::now(),
            auto_clear_duration: Some(duration),
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.auto_clear_duration {
            Some(duration) => self.created_at.elapsed() > duration,
            None => false,
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.message_type.label(), self.content)
    }
}

/// Notices for the user. Each new notice replaces the previous one; the
/// prompt shows the current notice until it expires.
#[derive(Clone, Default)]
pub struct StatusManager {
    pub current_message: Option<StatusMessage>,
    pub location: String,
}

impl StatusManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_info(&mut self, message: String) {
        self.set(message, MessageType::Info);
    }

    pub fn set_success(&mut self, message: String) {
        self.set(message, MessageType::Success);
    }

    pub fn set_warning(&mut self, message: String) {
        self.set(message, MessageType::Warning);
    }

    pub fn set_error(&mut self, message: String) {
        self.set(message, MessageType::Error);
    }

    /// Storage and missing-data failures are warnings; anything else is an
    /// error.
    pub fn report(&mut self, error: &CoreError) {
        if error.is_recoverable_io() {
            self.set_warning(error.to_string());
        } else {
            self.set_error(error.to_string());
        }
    }

    pub fn set_location(&mut self, location: String) {
        self.location = location;
    }

    pub fn clear(&mut self) {
        self.current_message = None;
    }

    pub fn update(&mut self) {
        if self.current_message.as_ref().is_some_and(StatusMessage::is_expired) {
            self.current_message = None;
        }
    }

    pub fn get_current_message(&self) -> Option<&StatusMessage> {
        self.current_message.as_ref()
    }

    pub fn has_message(&self) -> bool {
        self.current_message.is_some()
    }

    /// The prompt line: location, then the live notice if any.
    pub fn prompt(&self) -> String {
        match self.current_message {
            Some(ref message) => format!("{} {} > ", self.location, message),
            None => format!("{} > ", self.location),
        }
    }

    fn set(&mut self, message: String, message_type: MessageType) {
        self.current_message = Some(StatusMessage::new(message, message_type));
    }
}
