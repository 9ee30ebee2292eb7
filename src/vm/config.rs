//! VM capacities.

/// Capacities and output options for a [`crate::vm::Vm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmConfig {
    /// Maximum operand stack depth.
    pub stack_size: usize,
    /// Maximum number of pending `CALL` return addresses.
    pub call_depth: usize,
    /// Maximum number of names bound in one environment.
    pub max_bindings: usize,
    /// Maximum number of properties on one object.
    pub max_properties: usize,
    /// Also write each printed line to stdout.
    pub echo: bool,
}

impl VmConfig {
    pub const DEFAULT_STACK_SIZE: usize = 64;
    pub const DEFAULT_CALL_DEPTH: usize = 16;
    pub const DEFAULT_MAX_BINDINGS: usize = 32;
    pub const DEFAULT_MAX_PROPERTIES: usize = 64;
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_size: Self::DEFAULT_STACK_SIZE,
            call_depth: Self::DEFAULT_CALL_DEPTH,
            max_bindings: Self::DEFAULT_MAX_BINDINGS,
            max_properties: Self::DEFAULT_MAX_PROPERTIES,
            echo: false,
        }
    }
}
