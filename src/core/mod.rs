pub mod cheapest;
pub mod gateway;
pub mod offers;
pub mod retry;
pub mod token;

pub use crate::domain::model::{AccessToken, CheapestResult, Offer, OfferQuery};
pub use crate::domain::ports::CacheStore;
pub use crate::utils::error::Result;
