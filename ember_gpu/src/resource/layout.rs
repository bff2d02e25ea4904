/// Image layout transition table
///
/// The only layout changes an image resource performs:
///
/// | from                 | to                       | src access / stage           | dst access / stage                          |
/// |----------------------|--------------------------|------------------------------|---------------------------------------------|
/// | Undefined            | TransferDst              | none / top-of-pipe           | transfer write / transfer                   |
/// | TransferDst          | ShaderReadOnly           | transfer write / transfer    | shader read / fragment shader               |
/// | Undefined            | DepthStencilAttachment   | none / top-of-pipe           | depth-stencil read+write / early fragment   |

use crate::device::{AccessFlags, ImageLayout, PipelineStages};
use crate::error::{Error, Result};

/// Access and stage masks for one legal transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutTransition {
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
    pub src_stage: PipelineStages,
    pub dst_stage: PipelineStages,
}

impl LayoutTransition {
    /// Look up the masks for `old -> new`
    ///
    /// # Errors
    ///
    /// `UnsupportedTransition` for any pair outside the table.
    pub fn resolve(old: ImageLayout, new: ImageLayout) -> Result<Self> {
        match (old, new) {
            (ImageLayout::Undefined, ImageLayout::TransferDst) => Ok(Self {
                src_access: AccessFlags::empty(),
                dst_access: AccessFlags::TRANSFER_WRITE,
                src_stage: PipelineStages::TOP_OF_PIPE,
                dst_stage: PipelineStages::TRANSFER,
            }),
            (ImageLayout::TransferDst, ImageLayout::ShaderReadOnly) => Ok(Self {
                src_access: AccessFlags::TRANSFER_WRITE,
                dst_access: AccessFlags::SHADER_READ,
                src_stage: PipelineStages::TRANSFER,
                dst_stage: PipelineStages::FRAGMENT_SHADER,
            }),
            (ImageLayout::Undefined, ImageLayout::DepthStencilAttachment) => Ok(Self {
                src_access: AccessFlags::empty(),
                dst_access: AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                    | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                src_stage: PipelineStages::TOP_OF_PIPE,
                dst_stage: PipelineStages::EARLY_FRAGMENT_TESTS,
            }),
            (from, to) => {
                crate::engine_error!("ember::Image", "Unsupported layout transition {:?} -> {:?}", from, to);
                Err(Error::UnsupportedTransition { from, to })
            }
        }
    }

    /// Whether `old -> new` is in the table
    pub fn is_supported(old: ImageLayout, new: ImageLayout) -> bool {
        matches!(
            (old, new),
            (ImageLayout::Undefined, ImageLayout::TransferDst)
                | (ImageLayout::TransferDst, ImageLayout::ShaderReadOnly)
                | (ImageLayout::Undefined, ImageLayout::DepthStencilAttachment)
        )
    }
}

#[cfg(test)]
#[path = "layout_tests.rs"]
mod tests;
