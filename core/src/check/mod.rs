//! Response checking.
//!
//! # Design
//! [`CheckBodyStream`] is a two-state machine (`Collecting` → `Checked`):
//! configuration happens before the first chunk, chunks accumulate until the
//! body ends, and `finish` yields the single [`CheckResult`]. Status and
//! header expectations are checked by the client, which merges its entries
//! into the stream's result when that result is produced.

mod compare;
mod result;
mod stream;

pub use compare::compare;
pub use result::CheckResult;
pub use stream::{check_body, CheckBodyStream, CheckState};
