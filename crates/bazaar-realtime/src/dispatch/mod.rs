//! Chat delivery: persist, push or fall back, acknowledge.

pub mod dispatcher;
pub mod status;

pub use dispatcher::ChatDispatcher;
pub use status::DeliveryStatus;
