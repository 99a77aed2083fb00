//! CSV upload parsing and result export around the WQI engine.

pub mod batch;
pub mod csv;
pub mod error;
pub mod export;

pub use batch::{parse_cell, BatchInput, LOCATION_COLUMN};
pub use csv::{parse_csv, write_csv_record, CsvTable};
pub use error::TableError;
pub use export::{export_batch, export_single, format_cell, CLASS_COLUMN, WQI_COLUMN};
