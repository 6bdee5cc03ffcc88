mod control;
mod ps;

pub use control::{run_lifecycle, run_logs};
pub use ps::run_ps;
