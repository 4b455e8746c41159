pub mod completions;
pub mod dr;
pub mod model;
pub mod ph;
pub mod util;
