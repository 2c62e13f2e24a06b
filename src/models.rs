pub mod access;
pub mod building;
