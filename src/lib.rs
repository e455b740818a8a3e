pub mod app;
pub mod attendance;
pub mod camera;
pub mod capture;
pub mod core;
pub mod decoder;
pub mod scanner;
pub mod visitor;
