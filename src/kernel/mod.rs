pub mod cancel;
pub mod config;
pub mod controller;
pub mod direction;
pub mod event;
pub mod telemetry;
pub mod time;
