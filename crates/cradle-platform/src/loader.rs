//! Boot image staging.

use thiserror::Error;

/// A request to place the guest's boot images into guest RAM.
///
/// Image sizes are carried by the slices. The kernel image has no fixed load
/// address; the loader derives it from the image header and `ram_base`. The
/// DTB and initrd are placed at the exact guest-physical addresses given.
#[derive(Debug, Clone, Copy)]
pub struct StageRequest<'a> {
    /// Guest-physical base address of guest RAM.
    pub ram_base: u64,
    /// Raw kernel image.
    pub kernel: &'a [u8],
    /// Raw device tree blob.
    pub dtb: &'a [u8],
    /// Guest-physical address to place the DTB at.
    pub dtb_gpa: u64,
    /// Raw initial RAM disk.
    pub initrd: &'a [u8],
    /// Guest-physical address to place the initrd at.
    pub initrd_gpa: u64,
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("kernel image rejected: {0}")]
    BadKernel(&'static str),

    #[error("device tree blob rejected: {0}")]
    BadDtb(&'static str),

    #[error("image of {size} bytes does not fit at {gpa:#x}")]
    OutOfRange { gpa: u64, size: usize },

    #[error("loader produced a null entry point")]
    NullEntryPoint,
}

/// Relocates and validates the guest boot images.
///
/// Staging happens exactly once, before the guest is started. On success the
/// returned value is the guest-physical program counter the vCPU must begin
/// execution at.
pub trait ImageLoader {
    fn stage(&mut self, req: StageRequest<'_>) -> Result<u64, ImageError>;
}
