pub mod action;
pub mod ports;
pub mod services;
