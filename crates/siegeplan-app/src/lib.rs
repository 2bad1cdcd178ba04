// Interactive front end for siegeplan: the session event loop, the client
// for the local proxy, and plain-text rendering.

pub mod command;
pub mod protocol;
pub mod proxy;
pub mod render;
pub mod session;
