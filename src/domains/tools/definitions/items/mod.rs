pub mod get;
pub mod put;
pub mod sample;
pub mod update;

pub use get::{GetItemParams, GetItemTool};
pub use put::{PutItemParams, PutItemTool};
pub use sample::{SampleItemParams, SampleItemTool};
pub use update::{UpdateItemParams, UpdateItemTool};
