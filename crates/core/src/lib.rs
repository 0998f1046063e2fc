pub mod annotation;
pub mod detection;
pub mod display;
pub mod pipeline;
pub mod shared;
pub mod video;
