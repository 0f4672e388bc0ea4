pub mod log;
pub mod scan;
pub mod site;
pub mod user;

pub use log::{LogEntry, LogLevel};
pub use scan::{Scan, Severity, Vulnerability};
pub use site::Site;
pub use user::User;
