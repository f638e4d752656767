// SQLite module - the bundled driver
//
// - config: connection options and the fluent builder
// - params: parameter conversion between RowValues and SQLite values
// - query: value extraction and row buffering
// - driver: the Driver implementation on a rusqlite handle

pub mod config;
pub mod driver;
pub mod params;
pub mod query;

pub use config::SqliteOptionsBuilder;
pub use driver::SqliteDriver;
pub use params::{Params, row_value_to_sqlite_value};
pub use query::{read_rows, sqlite_extract_value};
