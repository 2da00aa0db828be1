//! Virtual interrupt controller seam.

use thiserror::Error;

use crate::{VcpuId, VirtIrq};

#[derive(Debug, Error)]
pub enum VgicError {
    #[error("virtual interrupt controller is not ready")]
    NotReady,

    #[error("virtual IRQ {0} is already registered")]
    AlreadyRegistered(VirtIrq),

    #[error("virtual IRQ {0} is not registered")]
    UnknownIrq(VirtIrq),

    #[error("no list register space to deliver virtual IRQ {0}")]
    QueueFull(VirtIrq),
}

/// Invoked by the virtual interrupt controller once the guest has finished
/// handling a delivered virtual IRQ.
///
/// This is the point at which the physical source may be acknowledged: the
/// controller defers the callback until guest-visible delivery has actually
/// completed, so a level-triggered source does not immediately re-fire.
pub trait VirqAckHandler {
    fn virq_acked(&self, vcpu: VcpuId, irq: VirtIrq);
}

/// Per-vCPU virtual interrupt state: registration of interrupt sources and
/// injection of pending interrupts into the guest.
///
/// Registrations are static; there is no unregister. `inject` reports
/// backpressure through `Err` and must not block waiting for space.
pub trait VirtIrqController {
    fn init(&mut self, vcpu: VcpuId) -> Result<(), VgicError>;

    fn register(
        &mut self,
        vcpu: VcpuId,
        irq: VirtIrq,
        ack: Box<dyn VirqAckHandler>,
    ) -> Result<(), VgicError>;

    fn inject(&mut self, vcpu: VcpuId, irq: VirtIrq) -> Result<(), VgicError>;
}
