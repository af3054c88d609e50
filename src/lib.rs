//! Deploys the stack, asks its function for chart values and rolls the chart
//! out with them.

pub mod command;
pub mod config;
pub mod error;
pub mod function;
pub mod helm;
pub mod invoke;
pub mod kubeconfig;
pub mod outputs;
pub mod pipeline;
#[cfg(test)]
mod testing;
pub mod values;
