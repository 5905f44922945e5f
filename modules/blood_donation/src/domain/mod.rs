pub mod cooldown;
pub mod credentials;
pub mod error;
pub mod events;
pub mod matching;
pub mod notifications;
pub mod ports;
pub mod repo;
pub mod service;
pub mod session;
pub mod validation;
