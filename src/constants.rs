// UI Constants
pub const WIDGET_TITLE: &str = "Financial Chatbot";
pub const INPUT_PLACEHOLDER: &str = "Type a message...";
pub const TYPING_TEXT: &str = "Bot is typing...";
pub const SEND_LABEL: &str = " Send ";
pub const SPINNER_FRAMES: [&str; 4] = ["◐", "◓", "◑", "◒"];
pub const TICK_RATE_MS: u64 = 120;

// Session Constants
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";
pub const DEFAULT_USERNAME: &str = "testuser";
pub const TOKEN_PATH: &str = "token";
pub const CHAT_PATH: &str = "chat";
pub const TOKEN_QUERY_KEY: &str = "token";
pub const USERNAME_QUERY_KEY: &str = "username";
pub const RECONNECT_DELAY_MS: u64 = 2000;
pub const REVEAL_DELAY_MS: u64 = 1200;
pub const TOKEN_TIMEOUT_MS: u64 = 10_000;
