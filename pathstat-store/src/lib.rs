pub mod error;
pub mod export;
pub mod source;
pub mod text;

pub use error::StoreError;
pub use export::ExportSource;
pub use source::{LogPage, LogQuery, LogSource};
pub use text::TextSource;
