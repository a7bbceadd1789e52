pub mod archive;
pub mod error;
pub mod extract;
pub mod load;
pub mod provider;
