// Library for tests to access modules

pub mod cache;
pub mod config;
pub mod models;
pub mod poller;
pub mod routes;
pub mod solus_repo;
pub mod version;
