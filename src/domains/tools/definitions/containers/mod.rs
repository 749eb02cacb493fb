pub mod list;
pub mod query;

pub use list::{ListContainersParams, ListContainersTool};
pub use query::{QueryContainerParams, QueryContainerTool};
