pub mod catalog;
pub mod inference;
pub mod javascript;
pub mod lexical;
pub mod manifest;
pub mod patterns;
mod scanner;

pub use catalog::{CatalogConfig, PermissionCatalog, ReversePatternIndex};
pub use inference::infer;
pub use javascript::{AliasTable, FileScan, ScanStrategy, scan_source};
pub use manifest::resolve_manifest;
pub use scanner::PackageScanner;
