//! Hand-rolled fake collaborators recording every call the monitor makes,
//! so ordering and exactly-once properties can be asserted directly.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use cradle_platform::{
    ChannelAck, ChannelId, DecodeOutcome, FaultDecoder, FirmwareCallRouter, ImageError,
    ImageLoader, SipForward, SmcCall, SmcError, SmcReturn, StageRequest, TrapPayload, VcpuControl,
    VcpuId, VgicError, VirqAckHandler, VirtIrq, VirtIrqController,
};
use cradle_vmm::{BootImages, Platform, Vmm, VmmConfig};

/// One observed collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Stage {
        ram_base: u64,
        kernel_len: usize,
        dtb_len: usize,
        dtb_gpa: u64,
        initrd_len: usize,
        initrd_gpa: u64,
    },
    VgicInit {
        vcpu: VcpuId,
    },
    Register {
        vcpu: VcpuId,
        irq: VirtIrq,
    },
    Inject {
        vcpu: VcpuId,
        irq: VirtIrq,
    },
    RegisterSipHandler,
    Decode {
        vcpu: VcpuId,
        label: u64,
    },
    ChannelAcked {
        channel: ChannelId,
    },
    Start {
        vcpu: VcpuId,
        entry_pc: u64,
        dtb_gpa: u64,
        initrd_gpa: u64,
    },
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;
type HandlerStore = Rc<RefCell<Vec<(VirtIrq, Box<dyn VirqAckHandler>)>>>;

/// Test-side handles into the fake platform.
pub struct Harness {
    log: CallLog,
    handlers: HandlerStore,
    pub chan_ack: Rc<dyn ChannelAck>,
}

impl Harness {
    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn calls_of<F: Fn(&Call) -> bool>(&self, pred: F) -> Vec<Call> {
        self.log.borrow().iter().filter(|c| pred(c)).cloned().collect()
    }

    /// Simulates the virtual interrupt controller reporting that the guest
    /// has finished handling `irq`, firing the registered handler.
    pub fn complete_virq(&self, vcpu: VcpuId, irq: VirtIrq) {
        let handlers = self.handlers.borrow();
        let (_, handler) = handlers
            .iter()
            .find(|(registered, _)| *registered == irq)
            .expect("no handler registered for virq");
        handler.virq_acked(vcpu, irq);
    }

    pub fn registered_virqs(&self) -> Vec<VirtIrq> {
        self.handlers.borrow().iter().map(|(irq, _)| *irq).collect()
    }
}

struct FakeLoader {
    log: CallLog,
    entry_pc: Option<u64>,
}

impl ImageLoader for FakeLoader {
    fn stage(&mut self, req: StageRequest<'_>) -> Result<u64, ImageError> {
        self.log.borrow_mut().push(Call::Stage {
            ram_base: req.ram_base,
            kernel_len: req.kernel.len(),
            dtb_len: req.dtb.len(),
            dtb_gpa: req.dtb_gpa,
            initrd_len: req.initrd.len(),
            initrd_gpa: req.initrd_gpa,
        });
        self.entry_pc.ok_or(ImageError::NullEntryPoint)
    }
}

struct FakeVgic {
    log: CallLog,
    handlers: HandlerStore,
    fail_init: bool,
    fail_register: Vec<VirtIrq>,
    fail_inject: Vec<VirtIrq>,
}

impl VirtIrqController for FakeVgic {
    fn init(&mut self, vcpu: VcpuId) -> Result<(), VgicError> {
        self.log.borrow_mut().push(Call::VgicInit { vcpu });
        if self.fail_init {
            return Err(VgicError::NotReady);
        }
        Ok(())
    }

    fn register(
        &mut self,
        vcpu: VcpuId,
        irq: VirtIrq,
        ack: Box<dyn VirqAckHandler>,
    ) -> Result<(), VgicError> {
        self.log.borrow_mut().push(Call::Register { vcpu, irq });
        if self.fail_register.contains(&irq) {
            return Err(VgicError::AlreadyRegistered(irq));
        }
        self.handlers.borrow_mut().push((irq, ack));
        Ok(())
    }

    fn inject(&mut self, vcpu: VcpuId, irq: VirtIrq) -> Result<(), VgicError> {
        self.log.borrow_mut().push(Call::Inject { vcpu, irq });
        if self.fail_inject.contains(&irq) {
            return Err(VgicError::QueueFull(irq));
        }
        Ok(())
    }
}

struct FakeFirmware {
    log: CallLog,
    fail: bool,
}

impl FirmwareCallRouter for FakeFirmware {
    fn register_sip_handler(&mut self, _handler: Box<dyn SipForward>) -> Result<(), SmcError> {
        self.log.borrow_mut().push(Call::RegisterSipHandler);
        if self.fail {
            return Err(SmcError::Rejected("handler refused"));
        }
        Ok(())
    }
}

struct FakeDecoder {
    log: CallLog,
    unresolved_labels: Vec<u64>,
}

impl FaultDecoder for FakeDecoder {
    fn decode_and_emulate(&mut self, vcpu: VcpuId, trap: TrapPayload) -> DecodeOutcome {
        self.log.borrow_mut().push(Call::Decode {
            vcpu,
            label: trap.label(),
        });
        if self.unresolved_labels.contains(&trap.label()) {
            DecodeOutcome::Unresolved
        } else {
            DecodeOutcome::Resolved
        }
    }
}

struct FakeVcpu {
    log: CallLog,
}

impl VcpuControl for FakeVcpu {
    fn start(&mut self, vcpu: VcpuId, entry_pc: u64, dtb_gpa: u64, initrd_gpa: u64) {
        self.log.borrow_mut().push(Call::Start {
            vcpu,
            entry_pc,
            dtb_gpa,
            initrd_gpa,
        });
    }
}

struct RecordingAck {
    log: CallLog,
}

impl ChannelAck for RecordingAck {
    fn ack(&self, ch: ChannelId) {
        self.log.borrow_mut().push(Call::ChannelAcked { channel: ch });
    }
}

struct NullSipForward;

impl SipForward for NullSipForward {
    fn forward(&mut self, _call: SmcCall) -> SmcReturn {
        SmcReturn::default()
    }
}

/// Entry point the fake loader reports unless a test overrides it.
pub const TEST_ENTRY_PC: u64 = 0x4000_0000;

pub struct PlatformBuilder {
    entry_pc: Option<u64>,
    fail_vgic_init: bool,
    fail_register: Vec<VirtIrq>,
    fail_inject: Vec<VirtIrq>,
    fail_firmware: bool,
    unresolved_labels: Vec<u64>,
}

impl PlatformBuilder {
    pub fn new() -> Self {
        Self {
            entry_pc: Some(TEST_ENTRY_PC),
            fail_vgic_init: false,
            fail_register: Vec::new(),
            fail_inject: Vec::new(),
            fail_firmware: false,
            unresolved_labels: Vec::new(),
        }
    }

    pub fn loader_fails(mut self) -> Self {
        self.entry_pc = None;
        self
    }

    pub fn vgic_init_fails(mut self) -> Self {
        self.fail_vgic_init = true;
        self
    }

    pub fn register_fails(mut self, irq: VirtIrq) -> Self {
        self.fail_register.push(irq);
        self
    }

    pub fn inject_fails(mut self, irq: VirtIrq) -> Self {
        self.fail_inject.push(irq);
        self
    }

    pub fn firmware_fails(mut self) -> Self {
        self.fail_firmware = true;
        self
    }

    pub fn unresolved_label(mut self, label: u64) -> Self {
        self.unresolved_labels.push(label);
        self
    }

    pub fn build(self) -> (Platform, Harness) {
        let log: CallLog = Rc::new(RefCell::new(Vec::new()));
        let handlers: HandlerStore = Rc::new(RefCell::new(Vec::new()));
        let chan_ack: Rc<dyn ChannelAck> = Rc::new(RecordingAck { log: log.clone() });

        let platform = Platform {
            loader: Box::new(FakeLoader {
                log: log.clone(),
                entry_pc: self.entry_pc,
            }),
            intc: Box::new(FakeVgic {
                log: log.clone(),
                handlers: handlers.clone(),
                fail_init: self.fail_vgic_init,
                fail_register: self.fail_register,
                fail_inject: self.fail_inject,
            }),
            firmware: Box::new(FakeFirmware {
                log: log.clone(),
                fail: self.fail_firmware,
            }),
            decoder: Box::new(FakeDecoder {
                log: log.clone(),
                unresolved_labels: self.unresolved_labels,
            }),
            vcpu: Box::new(FakeVcpu { log: log.clone() }),
            chan_ack: chan_ack.clone(),
            sip_forward: Box::new(NullSipForward),
        };

        (
            platform,
            Harness {
                log,
                handlers,
                chan_ack,
            },
        )
    }
}

/// Boot images with distinct, recognizable sizes.
pub fn test_images() -> BootImages {
    BootImages {
        kernel: vec![0u8; 4096],
        dtb: vec![0u8; 512],
        initrd: vec![0u8; 8192],
    }
}

/// A monitor booted with the reference board configuration, ready for
/// dispatch tests. The call log is cleared of the boot traffic.
pub fn booted_vmm(builder: PlatformBuilder) -> (Vmm, Harness) {
    let (platform, harness) = builder.build();
    let config = VmmConfig::board_defaults(test_images(), harness.chan_ack.clone());
    let mut vmm = Vmm::new(config, platform);
    vmm.init().expect("boot failed");
    harness.clear_calls();
    (vmm, harness)
}
