//! Query construction and batched fetching.
//!
//! The builder turns pipeline settings into SQL text; the fetcher runs that
//! SQL through a `DatabaseClient` under a `FetchErrorPolicy`.

pub mod builder;
pub mod fetcher;

pub use builder::{
    build_select, build_table_check, build_table_scan, BuiltQuery, ColumnSpec, QueryKind,
};
pub use fetcher::BatchFetcher;
