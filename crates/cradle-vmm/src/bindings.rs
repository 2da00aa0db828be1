//! Static interrupt source bindings and the channel route table.

use std::rc::Rc;

use cradle_platform::{ChannelAck, ChannelId, VcpuId, VirqAckHandler, VirtIrq};

use crate::error::ConfigError;

/// One physical interrupt source this guest depends on: the kernel channel
/// it arrives on, the virtual IRQ number it is presented to the guest as,
/// and the acknowledgement handler handed to the virtual interrupt
/// controller at registration time.
pub struct IrqBinding {
    pub channel: ChannelId,
    pub irq: VirtIrq,
    pub ack: Box<dyn VirqAckHandler>,
}

impl IrqBinding {
    /// Binds `channel` to `irq` with the stock handler that acknowledges the
    /// physical channel once the guest has handled the virtual IRQ.
    pub fn with_channel_ack(channel: ChannelId, irq: VirtIrq, ack: Rc<dyn ChannelAck>) -> Self {
        Self {
            channel,
            irq,
            ack: Box::new(ChannelAckHandler { channel, ack }),
        }
    }
}

/// Acknowledges the bound physical channel when the guest completes the
/// virtual IRQ. Simply re-arming the source has been sufficient for every
/// device this monitor fronts so far.
pub struct ChannelAckHandler {
    channel: ChannelId,
    ack: Rc<dyn ChannelAck>,
}

impl VirqAckHandler for ChannelAckHandler {
    fn virq_acked(&self, _vcpu: VcpuId, _irq: VirtIrq) {
        self.ack.ack(self.channel);
    }
}

/// Channel ids and virtual IRQ numbers must each be unique across the
/// binding set; a duplicate is a configuration error.
pub(crate) fn check_unique(bindings: &[IrqBinding]) -> Result<(), ConfigError> {
    for (i, binding) in bindings.iter().enumerate() {
        for earlier in &bindings[..i] {
            if earlier.channel == binding.channel {
                return Err(ConfigError::DuplicateChannel(binding.channel));
            }
            if earlier.irq == binding.irq {
                return Err(ConfigError::DuplicateIrq(binding.irq));
            }
        }
    }
    Ok(())
}

/// The immutable channel → virtual IRQ table consulted on every
/// notification.
///
/// Built once during startup from the bindings that actually registered with
/// the virtual interrupt controller; never mutated afterwards. The set is a
/// handful of entries, so lookup is a linear scan.
#[derive(Debug, Clone, Default)]
pub struct ChannelRoutes {
    routes: Vec<(ChannelId, VirtIrq)>,
}

impl ChannelRoutes {
    pub(crate) fn insert(&mut self, channel: ChannelId, irq: VirtIrq) {
        self.routes.push((channel, irq));
    }

    pub fn virq_for_channel(&self, channel: ChannelId) -> Option<VirtIrq> {
        self.routes
            .iter()
            .find(|(ch, _)| *ch == channel)
            .map(|&(_, irq)| irq)
    }

    pub fn channels(&self) -> impl Iterator<Item = ChannelId> + '_ {
        self.routes.iter().map(|&(ch, _)| ch)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
