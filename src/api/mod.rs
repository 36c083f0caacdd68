pub mod admin;
pub mod auth;
pub mod client;
pub mod envelope;
pub mod offers;
pub mod profile;

pub use auth::{AssociationRegistration, LoginResponse, Registration, UserRegistration};
pub use client::ApiClient;
pub use profile::{AssociationProfileUpdate, UserProfileUpdate};
