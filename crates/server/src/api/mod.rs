pub mod handlers;
pub mod ledger;
pub mod middleware;
pub mod routes;
pub mod upload;
pub mod videos;

pub use routes::create_router;
