pub mod config;
pub mod output;
pub mod roster;
pub mod scores;
pub mod transport;
