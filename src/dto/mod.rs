pub mod auth;
pub mod basket;
pub mod contacts;
pub mod orders;
pub mod partner;
