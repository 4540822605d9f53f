pub mod background;
pub mod color_mask;
pub mod color_profile;
pub mod conversion;
pub mod fusion;
pub mod morphology;
pub mod motion_mask;
pub mod session;
pub mod utils;
