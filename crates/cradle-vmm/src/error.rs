//! Startup error taxonomy.
//!
//! Every variant of [`InitError`] is terminal for the boot attempt: the
//! guest is never started and no retry is made. Runtime dispatch has no
//! error type: injection failures and unknown channels are absorbed (and
//! counted) inside the dispatch call that saw them.

use cradle_platform::{ChannelId, ImageError, SmcError, VgicError, VirtIrq};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("channel {0} is bound more than once")]
    DuplicateChannel(ChannelId),

    #[error("virtual IRQ {0} is bound more than once")]
    DuplicateIrq(VirtIrq),
}

#[derive(Debug, Error)]
pub enum InitError {
    #[error("invalid interrupt binding configuration")]
    Config(#[from] ConfigError),

    #[error("failed to stage guest boot images")]
    ImageLoad(#[source] ImageError),

    #[error("failed to initialise the virtual interrupt controller")]
    IntcInit(#[source] VgicError),

    #[error("failed to register the firmware SiP handler")]
    Firmware(#[source] SmcError),

    #[error("failed to register virtual IRQ {irq} for channel {channel}")]
    BindingRegistration {
        channel: ChannelId,
        irq: VirtIrq,
        #[source]
        source: VgicError,
    },

    #[error("guest boot was already attempted")]
    AlreadyStarted,
}
