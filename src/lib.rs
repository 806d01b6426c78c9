pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod rails;
pub mod repository;
pub mod service;
