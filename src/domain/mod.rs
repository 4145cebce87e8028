pub mod access;
pub mod delivery;
pub mod errors;
pub mod ports;
