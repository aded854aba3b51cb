//! Privacy rules for captured content.
//!
//! Only form submissions echo field values into an event, and they go
//! through [`FieldFilter`] first:
//!
//! - **Redaction**: fields whose name matches a sensitive pattern
//!   (`password`, `token` by default, case-insensitive) are replaced by a
//!   fixed marker.
//!
//! - **Truncation**: every other value is cut to a maximum length.
//!
//! Input changes never record values at all, only their length.
//!
//! # Example
//!
//! ```
//! use clicktrail::privacy::{FieldFilter, FieldOutcome};
//!
//! let filter = FieldFilter::new();
//!
//! match filter.filter_field("Password", "hunter2") {
//!     FieldOutcome::Redacted(marker) => assert_eq!(marker, "[REDACTED]"),
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

mod filter;

pub use filter::{FieldFilter, FieldOutcome};
