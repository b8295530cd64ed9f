pub mod arena;
pub mod config;
pub mod match_loop;
pub mod presenter;
pub mod registry;
pub mod session;
