//! Scenario tests driving the whole panel through its messages.
