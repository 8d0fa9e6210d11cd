pub mod api;
pub mod args;
pub mod columns;
pub mod dashboard;
pub mod derive;
pub mod error;
pub mod record;
pub mod render;
pub mod stats;
pub mod store;
pub mod table;
pub mod utils;

pub use args::Args;
pub use columns::{Column, ColumnVisibility};
pub use dashboard::Dashboard;
pub use derive::{derive_canonical, CanonicalRecord};
pub use record::DomainRecord;
pub use table::{
    filter_records, sort_records, ServiceKind, ServiceUsage, SortDirection, SortState, TableView,
};

#[cfg(test)]
mod tests;
