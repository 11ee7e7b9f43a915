pub mod cluster;
pub mod default;
