pub mod terminal;

pub use terminal::{print_corpus_report, print_package_result};
