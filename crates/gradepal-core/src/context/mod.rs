//! Per-turn academic context.
//!
//! Builds the bounded, role-shaped [`AcademicSnapshot`] that the prompt
//! builder turns into natural language.
//!
//! [`AcademicSnapshot`]: gradepal_types::snapshot::AcademicSnapshot

pub mod aggregator;
pub mod gpa;
pub mod lines;
pub mod truncate;
