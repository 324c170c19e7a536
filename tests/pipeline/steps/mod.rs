//! Cucumber step definitions for pipeline tests.

pub mod archival;
pub mod seeding;
