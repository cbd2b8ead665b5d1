// Page wiring for the web frontend.

// Element removed after a successful start
pub const UNSUPPORTED_NOTICE_ID: &str = "unsupported";

// Console log level
pub const LOG_LEVEL: log::Level = log::Level::Info;
