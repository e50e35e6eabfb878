pub mod fs;
pub mod logging;

pub use fs::write_atomic;
pub use logging::truncate_text;
