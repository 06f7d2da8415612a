pub mod app;
pub mod archive;
pub mod config;
pub mod coords;
pub mod domain;
pub mod error;
pub mod export;
pub mod loader;
pub mod mapper;
pub mod output;
pub mod store;
pub mod xml;
