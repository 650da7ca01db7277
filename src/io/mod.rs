//! I/O module
//!
//! Handles CSV and JSON input and every output format.
//!
//! # Components
//!
//! - `csv_format` - CSV row conversion and output serialization
//! - `json_format` - JSON envelopes and API error bodies
//! - `sync_reader` - Synchronous CSV reader with iterator interface
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod json_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_csv_row, write_kpis_csv, write_projection_csv, write_records_csv, write_rows_csv,
    write_summary_csv,
};
pub use json_format::{
    decode_list_response, parse_error_body, parse_list_envelope, parse_single_envelope,
    write_list_envelope,
};
pub use sync_reader::{read_collection, SyncReader};
