pub mod slide;
pub mod submissions;
pub mod upload;
