//! Firmware call (SMC) interception seam.

use thiserror::Error;

/// Argument bundle of an intercepted firmware call: the function id in `x0`
/// and the argument registers `x1..=x6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmcCall {
    pub function: u64,
    pub args: [u64; 6],
}

/// Result registers (`x0..=x3`) returned to the guest for a forwarded call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmcReturn {
    pub regs: [u64; 4],
}

#[derive(Debug, Error)]
pub enum SmcError {
    #[error("a SiP handler is already registered")]
    HandlerAlreadyRegistered,

    #[error("firmware call table rejected the handler: {0}")]
    Rejected(&'static str),
}

/// Forwards one intercepted SiP-range firmware call to host firmware and
/// returns the result the guest should observe.
pub trait SipForward {
    fn forward(&mut self, call: SmcCall) -> SmcReturn;
}

/// Dispatch table for intercepted firmware calls.
///
/// The monitor registers exactly one SiP-range handler at startup, before the
/// guest runs; the guest can issue a firmware call from its very first
/// instruction.
pub trait FirmwareCallRouter {
    fn register_sip_handler(&mut self, handler: Box<dyn SipForward>) -> Result<(), SmcError>;
}
