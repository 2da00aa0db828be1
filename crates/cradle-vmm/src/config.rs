//! Monitor configuration.

use std::rc::Rc;

use cradle_platform::{ChannelAck, VcpuId};

use crate::bindings::IrqBinding;

/// The guest's boot images, embedded at build time by the deployment and
/// handed to the monitor as-is. Sizes are whatever the blobs are.
#[derive(Debug, Clone, Default)]
pub struct BootImages {
    pub kernel: Vec<u8>,
    pub dtb: Vec<u8>,
    pub initrd: Vec<u8>,
}

/// How a virtual-IRQ registration failure during startup is treated.
///
/// Failures of the other startup steps are always fatal; device interrupt
/// bindings are the one place where a degraded boot can be useful (a guest
/// without its MMC interrupt still boots from initrd).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BindingPolicy {
    /// A failed registration is logged and skipped; the guest boots without
    /// that interrupt source. Its channel is never routed.
    #[default]
    BestEffort,
    /// Any failed registration aborts the boot.
    Required,
}

/// Static configuration of one guest, fixed at build/deploy time.
///
/// There is no runtime configuration surface; a deployment constructs this
/// value in code, typically from `cradle-board` constants.
pub struct VmmConfig {
    /// Name used in boot progress logging.
    pub name: String,
    /// Id of the guest's single vCPU.
    pub vcpu: VcpuId,
    /// Guest-physical base of guest RAM.
    pub ram_base: u64,
    /// Guest RAM size in bytes.
    pub ram_size: u64,
    /// Guest-physical address the DTB is loaded at.
    pub dtb_gpa: u64,
    /// Guest-physical address the initrd is loaded at.
    pub initrd_gpa: u64,
    /// The boot images to stage.
    pub images: BootImages,
    /// The physical interrupt sources this guest depends on.
    pub bindings: Vec<IrqBinding>,
    /// Policy for binding registration failures.
    pub binding_policy: BindingPolicy,
}

impl VmmConfig {
    /// Configuration for the reference board: the serial, ethernet and MMC
    /// sources, each acknowledging its own physical channel once the guest
    /// has handled the interrupt.
    pub fn board_defaults(images: BootImages, ack: Rc<dyn ChannelAck>) -> Self {
        let bindings = vec![
            IrqBinding::with_channel_ack(
                cradle_board::SERIAL_CH,
                cradle_board::SERIAL_IRQ,
                ack.clone(),
            ),
            IrqBinding::with_channel_ack(
                cradle_board::ETHERNET_CH,
                cradle_board::ETHERNET_IRQ,
                ack.clone(),
            ),
            IrqBinding::with_channel_ack(cradle_board::MMC_CH, cradle_board::MMC_IRQ, ack),
        ];

        Self {
            name: "cradle".to_string(),
            vcpu: cradle_board::GUEST_VCPU_ID,
            ram_base: cradle_board::GUEST_RAM_BASE,
            ram_size: cradle_board::GUEST_RAM_SIZE,
            dtb_gpa: cradle_board::GUEST_DTB_GPA,
            initrd_gpa: cradle_board::GUEST_INITRD_GPA,
            images,
            bindings,
            binding_policy: BindingPolicy::default(),
        }
    }
}
