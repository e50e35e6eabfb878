pub mod brain_api;
pub mod brain_client;

pub use brain_api::{ApiResponse, BrainApi};
pub use brain_client::{BrainClient, Credentials};
