//! Utility functions shared by the command operations.

/// Percent-encodes an alert condition for use as a URL path segment.
pub fn encode_condition(condition: &str) -> String {
    urlencoding::encode(condition).into_owned()
}

/// Joins alert recipients into the comma-separated form the service expects.
pub fn join_recipients(who: &[&str]) -> String {
    who.join(",")
}
