pub mod commands;
pub mod handlers;
pub mod menu;
pub mod output;
