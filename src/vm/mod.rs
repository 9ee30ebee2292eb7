//! Stack-based virtual machine with reference-counted values and chained
//! scopes.

pub mod config;
pub mod env;
pub mod heap;
pub mod value;
#[allow(clippy::module_inception)]
pub mod vm;

pub use config::VmConfig;
pub use env::{EnvId, Environments};
pub use heap::Heap;
pub use value::{Object, StringObject, Value};
pub use vm::{Execution, Vm};
