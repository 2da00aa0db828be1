//! The dispatch orchestrator.

use std::rc::Rc;

use cradle_platform::{
    ChannelAck, ChannelId, DecodeOutcome, FaultDecoder, FaultOutcome, FaultReply,
    FirmwareCallRouter, ImageLoader, SipForward, StageRequest, TrapPayload, VcpuControl, VcpuId,
    VirtIrqController,
};
use tracing::{error, info, warn};

use crate::bindings::{check_unique, ChannelRoutes, IrqBinding};
use crate::config::{BindingPolicy, BootImages, VmmConfig};
use crate::error::InitError;
use crate::stats::DispatchStats;
use crate::vcpu::VcpuState;

/// The collaborator implementations the monitor drives.
///
/// Everything the guest can call into (interrupt acknowledgement, firmware
/// calls) must be supplied here and is wired up before the vCPU starts.
pub struct Platform {
    pub loader: Box<dyn ImageLoader>,
    pub intc: Box<dyn VirtIrqController>,
    pub firmware: Box<dyn FirmwareCallRouter>,
    pub decoder: Box<dyn FaultDecoder>,
    pub vcpu: Box<dyn VcpuControl>,
    /// Kernel capability to acknowledge physical interrupt channels; shared
    /// with the per-binding acknowledgement handlers.
    pub chan_ack: Rc<dyn ChannelAck>,
    /// The firmware-call forwarding handler registered at startup.
    pub sip_forward: Box<dyn SipForward>,
}

/// Boot state consumed by the one permitted [`Vmm::init`] call.
struct PendingBoot {
    images: BootImages,
    bindings: Vec<IrqBinding>,
    sip_forward: Box<dyn SipForward>,
}

/// The monitor: owns the guest for the whole process lifetime.
///
/// Single-threaded by contract. The kernel delivers at most one outstanding
/// fault per vCPU and serializes all notification and fault deliveries to
/// one monitor instance, so dispatch state is only ever touched from within
/// a single entry-point call and no locking exists here.
pub struct Vmm {
    name: String,
    vcpu_id: VcpuId,
    ram_base: u64,
    ram_size: u64,
    dtb_gpa: u64,
    initrd_gpa: u64,
    binding_policy: BindingPolicy,
    pending: Option<PendingBoot>,
    routes: ChannelRoutes,
    state: VcpuState,
    stats: DispatchStats,
    loader: Box<dyn ImageLoader>,
    intc: Box<dyn VirtIrqController>,
    firmware: Box<dyn FirmwareCallRouter>,
    decoder: Box<dyn FaultDecoder>,
    vcpu: Box<dyn VcpuControl>,
    chan_ack: Rc<dyn ChannelAck>,
}

impl Vmm {
    pub fn new(config: VmmConfig, platform: Platform) -> Self {
        Self {
            name: config.name,
            vcpu_id: config.vcpu,
            ram_base: config.ram_base,
            ram_size: config.ram_size,
            dtb_gpa: config.dtb_gpa,
            initrd_gpa: config.initrd_gpa,
            binding_policy: config.binding_policy,
            pending: Some(PendingBoot {
                images: config.images,
                bindings: config.bindings,
                sip_forward: platform.sip_forward,
            }),
            routes: ChannelRoutes::default(),
            state: VcpuState::default(),
            stats: DispatchStats::default(),
            loader: platform.loader,
            intc: platform.intc,
            firmware: platform.firmware,
            decoder: platform.decoder,
            vcpu: platform.vcpu,
            chan_ack: platform.chan_ack,
        }
    }

    /// Establishes the runnable guest, exactly once.
    ///
    /// Order: stage images, initialise the virtual interrupt controller,
    /// register the firmware handler, register the interrupt bindings, drain
    /// already-latched channels, start the vCPU. The guest must never become
    /// runnable before every service it can immediately call into is ready,
    /// so the vCPU start is last.
    ///
    /// Any error leaves the guest unstarted, with no retry: boot failures
    /// are configuration-time defects. A second call fails with
    /// [`InitError::AlreadyStarted`] without touching any collaborator.
    pub fn init(&mut self) -> Result<(), InitError> {
        let pending = self.pending.take().ok_or(InitError::AlreadyStarted)?;
        info!(
            ram_base = self.ram_base,
            ram_size = self.ram_size,
            "starting guest monitor \"{}\"",
            self.name
        );

        check_unique(&pending.bindings)?;

        let entry_pc = self
            .loader
            .stage(StageRequest {
                ram_base: self.ram_base,
                kernel: &pending.images.kernel,
                dtb: &pending.images.dtb,
                dtb_gpa: self.dtb_gpa,
                initrd: &pending.images.initrd,
                initrd_gpa: self.initrd_gpa,
            })
            .map_err(InitError::ImageLoad)?;

        self.intc.init(self.vcpu_id).map_err(InitError::IntcInit)?;

        self.firmware
            .register_sip_handler(pending.sip_forward)
            .map_err(InitError::Firmware)?;

        for binding in pending.bindings {
            let IrqBinding { channel, irq, ack } = binding;
            match self.intc.register(self.vcpu_id, irq, ack) {
                Ok(()) => self.routes.insert(channel, irq),
                Err(source) => match self.binding_policy {
                    BindingPolicy::Required => {
                        return Err(InitError::BindingRegistration {
                            channel,
                            irq,
                            source,
                        });
                    }
                    BindingPolicy::BestEffort => {
                        warn!(channel, irq, "skipping unregistrable interrupt source: {source}");
                    }
                },
            }
        }

        // An interrupt may have latched on any of these channels before the
        // guest existed; ack each one so the first real edge is not lost.
        for channel in self.routes.channels() {
            self.chan_ack.ack(channel);
        }

        self.vcpu
            .start(self.vcpu_id, entry_pc, self.dtb_gpa, self.initrd_gpa);
        self.state = VcpuState::Running;
        info!(vcpu = self.vcpu_id, "guest started, entry pc {entry_pc:#x}");

        Ok(())
    }

    /// Kernel-facing wrapper around [`Vmm::init`]: a failed boot is logged
    /// and the monitor is left inert, with the guest unstarted.
    pub fn boot(&mut self) {
        if let Err(err) = self.init() {
            error!("guest boot failed: {err}");
        }
    }

    /// Maps an inbound channel notification to exactly one virtual interrupt
    /// injection.
    ///
    /// Injection backpressure drops the interrupt (at-most-once delivery; no
    /// retry, no requeue). A channel with no binding is logged and ignored.
    /// The physical channel is not acknowledged here; that happens through
    /// the binding's handler once the guest has handled the virtual IRQ.
    pub fn handle_notification(&mut self, channel: ChannelId) {
        let Some(irq) = self.routes.virq_for_channel(channel) else {
            self.stats.unexpected_channels += 1;
            warn!(channel, "notification on unexpected channel");
            return;
        };

        match self.intc.inject(self.vcpu_id, irq) {
            Ok(()) => self.stats.irqs_injected += 1,
            Err(err) => {
                self.stats.irqs_dropped += 1;
                warn!(
                    channel,
                    irq,
                    vcpu = self.vcpu_id,
                    "dropped virtual IRQ: {err}"
                );
            }
        }
    }

    /// Synchronously resolves one guest trap.
    ///
    /// A resolved trap yields the empty reply that resumes the vCPU at the
    /// (possibly decoder-adjusted) program counter. An unresolved trap
    /// yields no reply and the vCPU stays suspended; there is no teardown
    /// and no retry.
    pub fn handle_fault(&mut self, vcpu: VcpuId, trap: TrapPayload) -> FaultOutcome {
        self.state = VcpuState::Trapped;

        match self.decoder.decode_and_emulate(vcpu, trap) {
            DecodeOutcome::Resolved => {
                self.stats.faults_resolved += 1;
                self.state = VcpuState::Running;
                FaultOutcome::Resolved(FaultReply::empty())
            }
            DecodeOutcome::Unresolved => {
                self.stats.faults_unresolved += 1;
                error!(
                    vcpu,
                    label = trap.label(),
                    "unresolvable guest fault, vCPU suspended"
                );
                FaultOutcome::Unresolved
            }
        }
    }

    /// The channel → virtual IRQ routes in effect (empty before `init`).
    pub fn routes(&self) -> &ChannelRoutes {
        &self.routes
    }

    pub fn vcpu_state(&self) -> VcpuState {
        self.state
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}
