pub mod indices;
pub mod smooth;
pub mod solar;
