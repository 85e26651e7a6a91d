//! Texts sent back to senders and administrators.

use crate::attachment::{ALLOWED_EXTENSIONS, max_size_mib};

pub const NOT_CONFIGURED: &str = "im not configured yet. please ask the administrator to beat me.";
pub const SERVER_NOT_FOUND: &str = "target server not found";
pub const CHANNEL_NOT_FOUND: &str = "target channel not found";
pub const MISSING_PERMISSION: &str = "i don't have permission to send messages in target channel. please ask the administrator to beat me.";
pub const RELAYED: &str = "your message has been relayed.";
pub const TARGET_SET: &str = "i exist to serve";

pub fn invalid_attachment(filename: &str) -> String {
    format!(
        "Invalid file: {filename}. Allowed types: {}. Max size: {} MB.",
        ALLOWED_EXTENSIONS.join(", "),
        max_size_mib()
    )
}

pub fn download_failed(filename: &str) -> String {
    format!("I encountered an error downloading {filename}")
}

pub fn relay_error(detail: &str) -> String {
    format!("error relaying message: {detail}")
}
