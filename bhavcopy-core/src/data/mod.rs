//! Exception-list sources and polars date-column helpers.

pub mod columns;
pub mod provider;
pub mod remote;

pub use columns::{column_dates, date_column, read_date_column};
pub use provider::{DataError, ExceptionListProvider, StaticExceptionLists};
pub use remote::RemoteParquetLists;
