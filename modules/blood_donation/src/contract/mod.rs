pub mod client;
pub mod error;
pub mod model;

pub use client::BloodDonationApi;
pub use error::BloodDonationError;
pub use model::*;
