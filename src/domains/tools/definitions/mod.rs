//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod common;
pub mod containers;
pub mod items;

pub use containers::{
    ListContainersParams, ListContainersTool, QueryContainerParams, QueryContainerTool,
};
pub use items::{
    GetItemParams, GetItemTool, PutItemParams, PutItemTool, SampleItemParams, SampleItemTool,
    UpdateItemParams, UpdateItemTool,
};
