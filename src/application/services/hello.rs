//! Greeting

/// Greeting line for `name`. The router guarantees `name` is not blank.
pub fn greet(name: &str) -> String {
    format!("Hello, {}!", name.trim())
}
