//! Message formatting utilities for client display.

use relaycast_shared::time::timestamp_to_rfc3339;

const RULE: &str = "------------------------------------------------------------";

/// Message formatter for client display
pub struct MessageFormatter;

impl MessageFormatter {
    /// Format the banner shown once the channel is open
    ///
    /// # Arguments
    ///
    /// * `url` - Relay endpoint the client connected to
    /// * `role` - Role name of this participant
    pub fn format_connected(url: &str, role: &str) -> String {
        format!(
            "\n============================================================\n\
             Connected to {} as {}\n\
             Type a message to chat, or /help for commands.\n\
             ============================================================\n",
            url, role
        )
    }

    /// Format a chat message echoed by the relay
    ///
    /// # Arguments
    ///
    /// * `text` - The message text
    /// * `received_at` - Unix timestamp when the message arrived (milliseconds)
    pub fn format_chat_message(text: &str, received_at: i64) -> String {
        format!(
            "\n\n{}\n{}\nreceived at {}\n{}\n",
            RULE,
            text,
            timestamp_to_rfc3339(received_at),
            RULE
        )
    }

    /// Format the open-connection counter
    pub fn format_viewer_count(count: usize) -> String {
        let noun = if count == 1 { "connection" } else { "connections" };
        format!("\n# {} {} open\n", count, noun)
    }

    /// Format a session status line
    pub fn format_status(text: &str) -> String {
        format!("\n* {}\n", text)
    }

    pub fn format_help() -> String {
        [
            "",
            "Commands:",
            "  /camera [name]  switch to the named camera, or to the next one",
            "  /screen         share the screen instead of the camera",
            "  /stop-share     end the screen share as if from the system UI",
            "  /status         show the session state",
            "  /quit           leave",
            "Anything else is sent as a chat message.",
            "",
        ]
        .join("\n")
    }

    /// Format a binary message notification
    pub fn format_binary_message(byte_count: usize) -> String {
        format!("\n← Received {} bytes of binary data\n", byte_count)
    }

    /// Format a raw text message (when parsing fails)
    pub fn format_raw_message(text: &str) -> String {
        format!("\n← Received: {}\n", text)
    }
}
