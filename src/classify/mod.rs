pub mod hardiness;
pub mod koppen;
