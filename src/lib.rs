// Library for tests to access modules

pub mod config;
pub mod discovery;
pub mod error;
pub mod ethtool;
pub mod models;
pub mod render;
pub mod sample_store;
pub mod worker;
