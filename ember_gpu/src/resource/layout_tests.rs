//! Unit tests for the layout transition table

use crate::device::{AccessFlags, ImageLayout, PipelineStages};
use crate::error::Error;
use crate::resource::LayoutTransition;

const ALL_LAYOUTS: [ImageLayout; 7] = [
    ImageLayout::Undefined,
    ImageLayout::General,
    ImageLayout::TransferSrc,
    ImageLayout::TransferDst,
    ImageLayout::ShaderReadOnly,
    ImageLayout::ColorAttachment,
    ImageLayout::DepthStencilAttachment,
];

#[test]
fn test_undefined_to_transfer_dst() {
    let t = LayoutTransition::resolve(ImageLayout::Undefined, ImageLayout::TransferDst).unwrap();
    assert_eq!(t.src_access, AccessFlags::empty());
    assert_eq!(t.dst_access, AccessFlags::TRANSFER_WRITE);
    assert_eq!(t.src_stage, PipelineStages::TOP_OF_PIPE);
    assert_eq!(t.dst_stage, PipelineStages::TRANSFER);
}

#[test]
fn test_transfer_dst_to_shader_read() {
    let t = LayoutTransition::resolve(ImageLayout::TransferDst, ImageLayout::ShaderReadOnly).unwrap();
    assert_eq!(t.src_access, AccessFlags::TRANSFER_WRITE);
    assert_eq!(t.dst_access, AccessFlags::SHADER_READ);
    assert_eq!(t.src_stage, PipelineStages::TRANSFER);
    assert_eq!(t.dst_stage, PipelineStages::FRAGMENT_SHADER);
}

#[test]
fn test_undefined_to_depth_attachment() {
    let t = LayoutTransition::resolve(ImageLayout::Undefined, ImageLayout::DepthStencilAttachment).unwrap();
    assert_eq!(t.src_access, AccessFlags::empty());
    assert_eq!(
        t.dst_access,
        AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
    );
    assert_eq!(t.dst_stage, PipelineStages::EARLY_FRAGMENT_TESTS);
}

#[test]
fn test_table_is_closed() {
    let mut supported = 0;
    for from in ALL_LAYOUTS {
        for to in ALL_LAYOUTS {
            let result = LayoutTransition::resolve(from, to);
            assert_eq!(result.is_ok(), LayoutTransition::is_supported(from, to));
            if let Err(err) = result {
                assert_eq!(err, Error::UnsupportedTransition { from, to });
            } else {
                supported += 1;
            }
        }
    }
    assert_eq!(supported, 3);
}

#[test]
fn test_reverse_of_upload_is_rejected() {
    let err = LayoutTransition::resolve(ImageLayout::ShaderReadOnly, ImageLayout::TransferDst).unwrap_err();
    assert!(matches!(err, Error::UnsupportedTransition { .. }));
}
