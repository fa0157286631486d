pub mod check_config;
pub mod routes;
pub mod serve;
pub mod token;
