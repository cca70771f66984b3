pub mod migration;
pub mod spotify;
