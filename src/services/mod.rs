pub mod classifier;
pub mod kling;
pub mod relay;
pub mod storage;
pub mod tryon;
