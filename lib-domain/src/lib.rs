pub mod datastore;
pub mod dto;
pub mod service;
