pub mod config;
pub mod export;
pub mod measure;
pub mod pose;
pub mod render;
