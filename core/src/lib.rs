pub mod db;
pub mod events;
pub mod local_store;
pub mod mapping;
pub mod migration;
pub mod models;
pub mod remote;
pub mod service;
pub mod state;
