//! Tableau Server adapter.

mod rest_client;

pub use rest_client::TableauRestClient;
