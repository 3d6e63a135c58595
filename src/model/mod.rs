pub mod column;
pub mod config;
pub mod month;
pub mod table;
pub mod tracker;

pub use column::*;
pub use config::*;
pub use month::*;
pub use table::*;
pub use tracker::*;
