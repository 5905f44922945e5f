pub mod events;
pub mod notify;
pub mod session;
pub mod storage;
