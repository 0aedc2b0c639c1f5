//! Background polling and the shared read-side view.

mod view;
mod worker;

pub use view::SessionView;
pub use worker::Worker;
