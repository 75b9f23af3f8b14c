//! Individual value generators for the measured fields of a record.

pub mod numeric;
pub mod timestamp;
