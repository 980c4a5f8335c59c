// Library for tests to access modules

pub mod config;
pub mod cumulative;
pub mod dashboard;
pub mod models;
pub mod readings_repo;
pub mod rollup_worker;
pub mod routes;
pub mod site_repo;
pub mod version;
