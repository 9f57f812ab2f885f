pub mod combiner;
pub mod file_selector;
pub mod history;
pub mod selection;
pub mod session;
