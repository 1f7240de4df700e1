pub mod analyze;
pub mod config;
pub mod corpus;
pub mod error;
pub mod input;
pub mod models;
pub mod output;
pub mod unpack;

pub use analyze::{PackageScanner, PermissionCatalog};
pub use config::Config;
pub use corpus::{CorpusReport, CorpusSummary};
pub use error::ErrorKind;
pub use models::*;
