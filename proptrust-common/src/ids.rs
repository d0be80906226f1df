//! Identifier generation capability
//!
//! Property, verification and tamper-check identifiers are opaque strings
//! with a short human-readable prefix. Generation is injected so tests can
//! produce stable sequences.

use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

/// Generates the opaque identifiers used across the engine.
pub trait IdGenerator: Send + Sync {
    fn property_id(&self) -> String;
    fn verification_id(&self) -> String;
    fn tamper_check_id(&self) -> String;
}

/// UUIDv4-backed generator used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn property_id(&self) -> String {
        format!("PRT-{}", Uuid::new_v4())
    }

    fn verification_id(&self) -> String {
        format!("VER-{}", Uuid::new_v4())
    }

    fn tamper_check_id(&self) -> String {
        format!("TMP-{}", Uuid::new_v4())
    }
}

/// Deterministic counter-based generator for tests.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn property_id(&self) -> String {
        format!("PRT-{:06}", self.next())
    }

    fn verification_id(&self) -> String {
        format!("VER-{:06}", self.next())
    }

    fn tamper_check_id(&self) -> String {
        format!("TMP-{:06}", self.next())
    }
}
