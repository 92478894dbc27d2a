//! Observability subsystem
//!
//! - Structured logging (JSON lines)
//! - Counter metrics
//! - Lifecycle event tracing
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on teardown decisions
//! 3. Logging failure is never fatal
//!
//! # Usage
//!
//! ```ignore
//! use aerocluster::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::StateMessageEnqueued, &[("collection", "logs")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_messages_enqueued();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

/// Log a lifecycle event at WARN level, for conditions that are recorded but tolerated.
pub fn warn_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(Severity::Warn, event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event() {
        log_event_with_fields(Event::PhaseChanged, &[("from", "CheckingAlias"), ("to", "CheckingExistence")]);
    }

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::AliasConflict, &[("alias", "all_logs")]);
        warn_event(Event::CleanupInterrupted, &[("collection", "logs")]);
    }
}
