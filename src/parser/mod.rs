//! Text extraction for civic notices
//!
//! Three extractors, each with a defined degradation path instead of hard
//! failure where the upstream text is free-form:
//!
//! - [`datetime`] - ROC dates, day-part time ranges, power working periods
//! - [`location`] - address decomposition with a "location unknown" sentinel
//! - [`bulletin`] - the power utility's HTML notice table

pub mod bulletin;
pub mod datetime;
pub mod location;

pub use bulletin::{parse_bulletin, BulletinRow};
pub use datetime::{parse_power_period, parse_time_range, roc_to_date};
pub use location::{parse_address, parse_outage_cause, AddressParts};
