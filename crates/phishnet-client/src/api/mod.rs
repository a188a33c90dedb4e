//! API endpoint modules.

mod analyses;
mod files;

pub use analyses::AnalysesApi;
pub use files::FilesApi;
