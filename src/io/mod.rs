pub mod config_io;
pub mod lock;
pub mod paths;
pub mod recovery;
pub mod table_io;
pub mod tracker_io;
