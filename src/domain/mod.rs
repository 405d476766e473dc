pub mod clean;
pub mod error;
pub mod normalize;
pub mod raw;
pub mod sale;
pub mod summary;
