//! Demo quote microservice: random quotes over HTTP plus a websocket
//! stream that pushes a fresh quote to every subscriber once per second.

pub mod openapi;
pub mod protocol;
pub mod quotes;
pub mod server;
