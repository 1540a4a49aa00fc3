pub mod cascade;
pub mod catalog;
pub mod config;
pub mod country;
pub mod epg;
pub mod error;
pub mod logo;
pub mod logo_cache;
pub mod models;
pub mod normalize;
pub mod resolver;
pub mod script;
pub mod similarity;
pub mod stats;
pub mod tables;
