mod error;
mod schema;
mod store;

pub use error::DbError;
pub use store::{
    AppStore, OwnerStatistics, RecentScan, ScanWithSite, SeverityCounts, TypeCount,
    UserCredentials,
};
