pub mod cli;
pub mod data;
pub mod optimizer;
pub mod server;
