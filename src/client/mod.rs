mod bootstrap;
mod communicator;

pub use communicator::{Communicator, DynChannel};
