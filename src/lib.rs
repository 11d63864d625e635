pub mod banner;
pub mod cache;
pub mod commands;
pub mod config;
pub mod consts;
pub mod dashboard;
pub mod data;
pub mod model;
pub mod present;
pub mod ranking;
pub mod spinner;
pub mod trigger;
