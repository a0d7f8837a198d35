//! Read access to academic records and the grade write path.
//!
//! The records themselves are managed elsewhere; this module defines the
//! port used to query them and the small service that records a grade and
//! announces it on the notification bus.

pub mod repository;
pub mod service;
