pub mod metadata;
pub mod routes;
pub mod server;
pub mod subscriptions;
pub mod topics;

pub use server::start_server as start_broker;
