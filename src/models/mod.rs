pub mod generation;
pub mod history;

pub use generation::*;
pub use history::*;
