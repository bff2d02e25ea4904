/// One-shot command buffers: allocate, record, submit alone, wait for queue idle, free

use ash::vk;
use ember_gpu::ember::{Error, Result};
use ember_gpu::engine_error;

const SOURCE: &str = "ember::vulkan::one_shot";

fn submission_error(what: &str, e: vk::Result) -> Error {
    engine_error!(SOURCE, "{}: {:?}", what, e);
    Error::CommandSubmissionFailed(format!("{}: {:?}", what, e))
}

/// Allocate a primary command buffer from `pool` and begin it for a single submission
///
/// # Safety
///
/// `pool` must belong to `device` and must not be used concurrently.
pub(crate) unsafe fn begin(device: &ash::Device, pool: vk::CommandPool) -> Result<vk::CommandBuffer> {
    let allocate_info = vk::CommandBufferAllocateInfo::default()
        .command_pool(pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);
    let command_buffer = device
        .allocate_command_buffers(&allocate_info)
        .map_err(|e| submission_error("Failed to allocate one-shot command buffer", e))?
        .into_iter()
        .next()
        .ok_or_else(|| {
            engine_error!(SOURCE, "Driver returned no command buffer");
            Error::CommandSubmissionFailed("Driver returned no command buffer".to_string())
        })?;

    let begin_info = vk::CommandBufferBeginInfo::default().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
    if let Err(e) = device.begin_command_buffer(command_buffer, &begin_info) {
        device.free_command_buffers(pool, &[command_buffer]);
        return Err(submission_error("Failed to begin one-shot command buffer", e));
    }
    Ok(command_buffer)
}

/// End `command_buffer`, submit it alone to `queue`, wait until the queue is idle, then free it
///
/// The command buffer is freed on every path.
///
/// # Safety
///
/// `command_buffer` must come from `begin` with the same `pool`.
pub(crate) unsafe fn submit_and_wait(
    device: &ash::Device,
    queue: vk::Queue,
    pool: vk::CommandPool,
    command_buffer: vk::CommandBuffer,
) -> Result<()> {
    let result = (|| {
        device
            .end_command_buffer(command_buffer)
            .map_err(|e| submission_error("Failed to end one-shot command buffer", e))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        device
            .queue_submit(queue, &[submit_info], vk::Fence::null())
            .map_err(|e| submission_error("Failed to submit one-shot command buffer", e))?;

        device
            .queue_wait_idle(queue)
            .map_err(|e| submission_error("Failed to wait for one-shot submission", e))
    })();

    device.free_command_buffers(pool, &[command_buffer]);
    result
}
