//! Canonical migration definitions, applied in order at startup.

/// A named migration: `(name, sql)`.
pub type Migration = (&'static str, &'static str);

pub const MIGRATIONS: &[Migration] = &[
    (
        "0001_schema",
        include_str!("../../migrations/0001_schema.sql"),
    ),
    (
        "0002_pitch_send_claim",
        include_str!("../../migrations/0002_pitch_send_claim.sql"),
    ),
];
