//! Guest trap vocabulary and the fault decoder seam.

use crate::VcpuId;

/// Opaque trap message as delivered by the kernel: a label identifying the
/// trap class and the raw message words.
///
/// The monitor core never interprets the contents; only the fault decoder
/// does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrapPayload {
    label: u64,
    words: [u64; 4],
}

impl TrapPayload {
    pub const fn new(label: u64, words: [u64; 4]) -> Self {
        Self { label, words }
    }

    pub const fn label(&self) -> u64 {
        self.label
    }

    pub const fn words(&self) -> &[u64; 4] {
        &self.words
    }
}

/// Reply message sent to the kernel to resume a trapped vCPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultReply {
    label: u64,
    len: usize,
}

impl FaultReply {
    /// The zero-length acknowledgement used for every resolved fault.
    pub const fn empty() -> Self {
        Self { label: 0, len: 0 }
    }

    pub const fn label(&self) -> u64 {
        self.label
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// What the fault decoder made of one trap.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeOutcome {
    /// The trap was fully emulated; the vCPU may resume.
    Resolved,
    /// The trap could not be emulated.
    Unresolved,
}

/// The monitor's answer to one fault delivery.
///
/// Every accepted fault produces exactly one of these. `Resolved` carries the
/// reply that resumes the vCPU; `Unresolved` means no reply is sent and the
/// vCPU stays suspended.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOutcome {
    Resolved(FaultReply),
    Unresolved,
}

impl FaultOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, FaultOutcome::Resolved(_))
    }

    /// The reply to send, if any.
    pub fn into_reply(self) -> Option<FaultReply> {
        match self {
            FaultOutcome::Resolved(reply) => Some(reply),
            FaultOutcome::Unresolved => None,
        }
    }
}

/// Classifies a trap and performs the matching emulation (MMIO access,
/// instruction skip, privileged register access).
///
/// Decoding must be deterministic: presented with the same vCPU and payload
/// twice, the decoder must produce the same outcome both times.
pub trait FaultDecoder {
    fn decode_and_emulate(&mut self, vcpu: VcpuId, trap: TrapPayload) -> DecodeOutcome;
}
