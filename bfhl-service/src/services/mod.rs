pub mod dispatcher;
pub mod math;
pub mod metrics;
pub mod providers;

pub use dispatcher::{DispatchError, OperationDispatcher};
pub use metrics::{get_metrics, init_metrics};
