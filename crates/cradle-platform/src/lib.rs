#![forbid(unsafe_code)]

//! Collaborator interfaces for the cradle guest monitor.
//!
//! The monitor core (`cradle-vmm`) drives four subsystems it does not
//! implement itself: the boot image loader, the virtual interrupt
//! controller, the firmware-call (SMC) router, and the fault decoder. This
//! crate defines those seams as traits, along with the kernel-facing
//! capabilities (`VcpuControl`, `ChannelAck`) and the message vocabulary
//! that crosses them.
//!
//! All of these calls are synchronous and non-blocking: each returns a
//! definite success or failure before the monitor touches the next event.

pub mod fault;
pub mod intc;
pub mod kernel;
pub mod loader;
pub mod smc;

/// Kernel notification channel id.
pub type ChannelId = u32;

/// Virtual interrupt number, as presented to the guest.
pub type VirtIrq = u32;

/// Guest vCPU id.
pub type VcpuId = usize;

pub use fault::{DecodeOutcome, FaultDecoder, FaultOutcome, FaultReply, TrapPayload};
pub use intc::{VgicError, VirqAckHandler, VirtIrqController};
pub use kernel::{ChannelAck, VcpuControl};
pub use loader::{ImageError, ImageLoader, StageRequest};
pub use smc::{FirmwareCallRouter, SipForward, SmcCall, SmcError, SmcReturn};
