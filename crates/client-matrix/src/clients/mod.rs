//! Clients positioned on a matrix, and the pipeline that scores them.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Client, ClientDetail, ClientFilter, ClientId, ClientScore, ClientUpdate, NewClient, ScoreInput,
};
pub use repository::{ClientRepository, ScoreEvaluator};
pub use router::client_router;
pub use service::{ClientService, ClientServiceError};
