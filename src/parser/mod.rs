pub mod blurb;
pub mod dates;
pub mod listing;

pub use blurb::extract_blurb;
pub use dates::DateNormalizer;
pub use listing::{extract_records, parse_result_page};
