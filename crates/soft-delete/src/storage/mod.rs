pub mod filesystem;
pub mod quarantine_dir;

pub use filesystem::{format_size, move_path, remove_path};
pub use quarantine_dir::{allocate, Allocation, QuarantineDirectory};
