pub mod graph;
pub mod rooms;
pub mod session;
