//! Fixture events.
//!
//! `Critical` extends `Alert`, which extends `Ping`. `Job` carries an `i64`
//! priority. `Tick` has neither ancestors nor priority.

use std::any::Any;

use herald_events::Event;

/// Root of the fixture hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ping {
    /// Caller-chosen sequence number.
    pub seq: u32,
}

impl Event for Ping {}

/// A `Ping` with a severity level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Parent view.
    pub ping: Ping,
    /// Severity.
    pub level: u8,
}

impl Event for Alert {
    fn parent(&self) -> Option<&dyn Event> {
        Some(&self.ping)
    }
}

/// An `Alert` with an incident code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Critical {
    /// Parent view.
    pub alert: Alert,
    /// Incident code.
    pub code: String,
}

impl Event for Critical {
    fn parent(&self) -> Option<&dyn Event> {
        Some(&self.alert)
    }
}

/// Event ordered by an `i64` priority key (lower first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Label used in assertions.
    pub name: String,
    /// Priority key.
    pub priority: i64,
}

impl Event for Job {
    fn priority(&self) -> Option<&dyn Any> {
        Some(&self.priority)
    }
}

/// Plain event unrelated to the other fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

impl Event for Tick {}

/// Create a test ping.
#[must_use]
pub fn test_ping(seq: u32) -> Ping {
    Ping { seq }
}

/// Create a test alert.
#[must_use]
pub fn test_alert(seq: u32, level: u8) -> Alert {
    Alert {
        ping: test_ping(seq),
        level,
    }
}

/// Create a test critical alert at level 9.
#[must_use]
pub fn test_critical(seq: u32, code: impl Into<String>) -> Critical {
    Critical {
        alert: test_alert(seq, 9),
        code: code.into(),
    }
}

/// Create a test job.
#[must_use]
pub fn test_job(name: impl Into<String>, priority: i64) -> Job {
    Job {
        name: name.into(),
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_ancestry() {
        let critical = test_critical(4, "disk");
        let event: &dyn Event = &critical;
        let chain: Vec<&dyn Event> = event.ancestry().collect();

        assert_eq!(chain.len(), 3);
        assert!(chain[0].is::<Critical>());
        assert_eq!(chain[1].downcast_ref::<Alert>().map(|a| a.level), Some(9));
        assert_eq!(chain[2].downcast_ref::<Ping>().map(|p| p.seq), Some(4));
    }

    #[test]
    fn test_job_priority() {
        let job = test_job("a", -3);
        let key = (&job as &dyn Event)
            .priority()
            .and_then(|key| key.downcast_ref::<i64>())
            .copied();
        assert_eq!(key, Some(-3));
        assert!((&Tick as &dyn Event).priority().is_none());
    }
}
