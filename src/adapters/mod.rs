// Adapters layer: concrete implementations of the domain ports (http, control-plane API, login, report).

pub mod cloud_controller;
pub mod http;
pub mod login;
pub mod report;
