mod analysis;
mod descriptor;
mod error;

pub use analysis::*;
pub use descriptor::*;
pub use error::*;
