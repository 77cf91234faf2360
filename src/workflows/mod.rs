pub mod portfolio;
pub mod quality;
