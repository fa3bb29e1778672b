//! Core types of the hard-disk relaxation engine: vector and body values,
//! contact-time solving, and the damped event-driven simulation itself.

pub mod body;
pub mod contact;
pub mod sim;
pub mod vec2;

pub use body::{Body, RADIUS};
pub use contact::{Contact, ContactKind};
pub use sim::{layout_is_valid, Outcome, Simulation, Status, EPS};
pub use vec2::Vec2;
