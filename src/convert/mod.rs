//! Field-shape conversion between DB rows and API records.

pub mod case;
pub mod processors;
pub mod record;

pub use case::{to_camel, to_snake};
pub use record::{ConvertOptions, to_api_record, to_api_records, to_db_record};
