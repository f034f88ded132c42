pub mod backend_json;
pub mod checkout;
pub mod config;
pub mod venue_repository;
pub mod yaml;
