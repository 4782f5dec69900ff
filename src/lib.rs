pub mod api;
pub mod config;
pub mod gate;
pub mod media;
pub mod observability;
pub mod worker;
