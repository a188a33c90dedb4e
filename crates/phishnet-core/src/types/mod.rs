mod analysis;
mod email;
mod outcome;
mod report;

pub use analysis::*;
pub use email::*;
pub use outcome::*;
pub use report::*;
