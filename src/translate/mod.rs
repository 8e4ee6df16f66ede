//! Translate module — maps process outcomes to the caller-facing result.
//!
//! - `OperationResult`, `Failure` and `FailureKind` (`result`)
//! - Regex field extraction for labeled text output (`pattern`)
//! - `translate` and `ExpectedShape` (`translator`)

pub mod pattern;
pub mod result;
pub mod translator;

pub use pattern::{Capture, FieldRule, TextRule};
pub use result::{Failure, FailureKind, OperationResult};
pub use translator::{translate, ExpectedShape};
