pub mod balance;
pub mod browser;
pub mod config;
pub mod duration;
pub mod keypad;
pub mod models;
pub mod ocr;
pub mod poll;
pub mod portal;

pub use models::{AccountRequest, Balance, Currency};
pub use portal::{CaisseEpargne, PortalError};
