//! Control core of the cradle virtual machine monitor.
//!
//! This crate composes the collaborator seams defined in `cradle-platform`
//! (image loader, virtual interrupt controller, firmware call router, fault
//! decoder, and the kernel capabilities) into a single guest lifecycle:
//! [`Vmm::init`] stages the boot images and starts the vCPU exactly once,
//! after which the monitor is purely reactive.
//!
//! The kernel invokes the monitor on two channels for the lifetime of the
//! guest:
//! - [`Vmm::handle_notification`] maps a physical interrupt notification to
//!   one virtual interrupt injection, and
//! - [`Vmm::handle_fault`] synchronously resolves one guest trap and says
//!   whether the vCPU may resume.
//!
//! The core is single-threaded and lock-free. It relies on the kernel's
//! delivery contract: at most one outstanding fault per vCPU, and all
//! notification/fault deliveries to one monitor instance are serialized.
#![forbid(unsafe_code)]

mod bindings;
mod config;
mod error;
mod stats;
mod vcpu;
mod vmm;

pub use bindings::{ChannelAckHandler, ChannelRoutes, IrqBinding};
pub use config::{BindingPolicy, BootImages, VmmConfig};
pub use error::{ConfigError, InitError};
pub use stats::DispatchStats;
pub use vcpu::VcpuState;
pub use vmm::{Platform, Vmm};
