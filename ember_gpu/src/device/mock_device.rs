/// Mock DeviceLink for unit tests (no GPU required)
///
/// Objects are plain ids backed by host memory. Recorded commands execute at
/// `end_one_shot`, so uploads, barriers and readbacks behave like a queue that
/// runs on submit. Misuse a real driver would reject (destroying an image while
/// a view of it is alive, copying into an image in the wrong layout, freeing a
/// mapped buffer, nested one-shots) is recorded as a fault instead of panicking.

use std::cell::RefCell;
use std::ptr::NonNull;

use rustc_hash::FxHashMap;

use crate::config::Settings;
use crate::device::{
    BufferDesc, BufferImageCopy, DeviceLink, ImageBarrier, ImageCreateDesc, ImageLayout,
    ImageViewDesc, SamplerDesc,
};
use crate::error::{Error, Result};

/// Failure to inject on the next matching call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    BufferAllocation,
    ImageAllocation,
    OutOfMemory,
    Map,
    ImageView,
    Sampler,
    Begin,
    Submit,
}

#[derive(Debug)]
pub struct MockAllocation {
    pub id: u64,
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Barrier { image: u64, barrier: ImageBarrier },
    BufferToImage { buffer: u64, image: u64, region: BufferImageCopy },
    ImageToBuffer { image: u64, buffer: u64, region: BufferImageCopy },
}

struct MockBuffer {
    bytes: Vec<u8>,
    host_visible: bool,
    mapped: bool,
}

struct MockImage {
    desc: ImageCreateDesc,
    layout: ImageLayout,
    texels: Vec<u8>,
}

#[derive(Default)]
struct State {
    next_id: u64,
    buffers: FxHashMap<u64, MockBuffer>,
    images: FxHashMap<u64, MockImage>,
    views: FxHashMap<u64, u64>,
    samplers: FxHashMap<u64, SamplerDesc>,
    open: FxHashMap<u64, Vec<Command>>,
    calls: Vec<String>,
    faults: Vec<String>,
    fail_next: Option<MockFailure>,
    submissions: usize,
}

impl State {
    fn id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn take_failure(&mut self, failure: MockFailure) -> bool {
        if self.fail_next == Some(failure) {
            self.fail_next = None;
            true
        } else {
            false
        }
    }

    fn record(&mut self, command_buffer: u64, command: Command) {
        match self.open.get_mut(&command_buffer) {
            Some(commands) => commands.push(command),
            None => self.faults.push(format!("record into closed command buffer {}", command_buffer)),
        }
    }

    fn execute(&mut self, command: Command) {
        match command {
            Command::Barrier { image, barrier } => {
                let Some(target) = self.images.get_mut(&image) else {
                    self.faults.push(format!("barrier on dead image {}", image));
                    return;
                };
                if barrier.old_layout != ImageLayout::Undefined && barrier.old_layout != target.layout {
                    self.faults.push(format!(
                        "barrier claims {:?} but image {} is in {:?}",
                        barrier.old_layout, image, target.layout
                    ));
                }
                target.layout = barrier.new_layout;
            }
            Command::BufferToImage { buffer, image, region } => {
                let (Some(src), Some(dst)) = (self.buffers.get(&buffer), self.images.get_mut(&image)) else {
                    self.faults.push(format!("copy between dead objects {} -> {}", buffer, image));
                    return;
                };
                if dst.layout != ImageLayout::TransferDst {
                    self.faults.push(format!("copy into image {} in {:?}", image, dst.layout));
                    return;
                }
                let len = (region.width * region.height * dst.desc.format.bytes_per_pixel()) as usize;
                if len > src.bytes.len() || len > dst.texels.len() {
                    self.faults.push(format!("copy of {} bytes out of bounds", len));
                    return;
                }
                dst.texels[..len].copy_from_slice(&src.bytes[..len]);
            }
            Command::ImageToBuffer { image, buffer, region } => {
                let (Some(src), Some(dst)) = (self.images.get(&image), self.buffers.get_mut(&buffer)) else {
                    self.faults.push(format!("copy between dead objects {} -> {}", image, buffer));
                    return;
                };
                if src.layout != ImageLayout::TransferSrc {
                    self.faults.push(format!("readback from image {} in {:?}", image, src.layout));
                    return;
                }
                let len = (region.width * region.height * src.desc.format.bytes_per_pixel()) as usize;
                if len > dst.bytes.len() || len > src.texels.len() {
                    self.faults.push(format!("readback of {} bytes out of bounds", len));
                    return;
                }
                dst.bytes[..len].copy_from_slice(&src.texels[..len]);
            }
        }
    }
}

/// In-memory device link
pub struct MockDevice {
    settings: Settings,
    state: RefCell<State>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> Self {
        Self { settings, state: RefCell::new(State::default()) }
    }

    /// Make the next matching call fail
    pub fn fail_next(&self, failure: MockFailure) {
        self.state.borrow_mut().fail_next = Some(failure);
    }

    /// Every create/destroy/submit call, in order
    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    /// Calls whose name starts with `prefix`
    pub fn calls_named(&self, prefix: &str) -> Vec<String> {
        self.calls().into_iter().filter(|c| c.starts_with(prefix)).collect()
    }

    /// Misuse detected so far (empty when every call was legal)
    pub fn faults(&self) -> Vec<String> {
        self.state.borrow().faults.clone()
    }

    /// Number of buffers, images, views and samplers still alive
    pub fn live_objects(&self) -> usize {
        let state = self.state.borrow();
        state.buffers.len() + state.images.len() + state.views.len() + state.samplers.len()
    }

    pub fn live_samplers(&self) -> usize {
        self.state.borrow().samplers.len()
    }

    pub fn submissions(&self) -> usize {
        self.state.borrow().submissions
    }

    /// Layout the simulated GPU last left the image in
    pub fn image_layout(&self, image: u64) -> Option<ImageLayout> {
        self.state.borrow().images.get(&image).map(|i| i.layout)
    }

    pub fn image_desc(&self, image: u64) -> Option<ImageCreateDesc> {
        self.state.borrow().images.get(&image).map(|i| i.desc)
    }

    pub fn image_texels(&self, image: u64) -> Vec<u8> {
        self.state.borrow().images.get(&image).map(|i| i.texels.clone()).unwrap_or_default()
    }

    pub fn view_image(&self, view: u64) -> Option<u64> {
        self.state.borrow().views.get(&view).copied()
    }

    pub fn sampler_desc(&self, sampler: u64) -> Option<SamplerDesc> {
        self.state.borrow().samplers.get(&sampler).copied()
    }
}

impl DeviceLink for MockDevice {
    type Buffer = u64;
    type Image = u64;
    type ImageView = u64;
    type Sampler = u64;
    type Allocation = MockAllocation;
    type CommandBuffer = u64;

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<(u64, MockAllocation)> {
        let mut state = self.state.borrow_mut();
        if state.take_failure(MockFailure::BufferAllocation) {
            return Err(Error::AllocationFailed("mock buffer allocation".to_string()));
        }
        if state.take_failure(MockFailure::OutOfMemory) {
            return Err(Error::OutOfMemory);
        }
        let id = state.id();
        state.buffers.insert(
            id,
            MockBuffer {
                bytes: vec![0; desc.size as usize],
                host_visible: desc.memory.is_host_visible(),
                mapped: false,
            },
        );
        state.calls.push(format!("create_buffer({})", id));
        Ok((id, MockAllocation { id }))
    }

    fn destroy_buffer(&self, buffer: u64, allocation: MockAllocation) {
        let mut state = self.state.borrow_mut();
        match state.buffers.remove(&buffer) {
            Some(removed) if removed.mapped => {
                state.faults.push(format!("buffer {} destroyed while mapped", buffer))
            }
            Some(_) => {}
            None => state.faults.push(format!("destroy of dead buffer {}", buffer)),
        }
        if allocation.id != buffer {
            state.faults.push(format!("buffer {} freed with allocation {}", buffer, allocation.id));
        }
        state.calls.push(format!("destroy_buffer({})", buffer));
    }

    fn map_allocation(&self, allocation: &MockAllocation) -> Result<NonNull<u8>> {
        let mut state = self.state.borrow_mut();
        if state.take_failure(MockFailure::Map) {
            return Err(Error::BackendError("mock map failure".to_string()));
        }
        let buffer = state
            .buffers
            .get_mut(&allocation.id)
            .ok_or_else(|| Error::InvalidResource(format!("no allocation {}", allocation.id)))?;
        if !buffer.host_visible {
            return Err(Error::BackendError("allocation is not host visible".to_string()));
        }
        buffer.mapped = true;
        let ptr = NonNull::new(buffer.bytes.as_mut_ptr())
            .ok_or_else(|| Error::BackendError("null mapping".to_string()))?;
        state.calls.push(format!("map({})", allocation.id));
        Ok(ptr)
    }

    fn unmap_allocation(&self, allocation: &MockAllocation) {
        let mut state = self.state.borrow_mut();
        match state.buffers.get_mut(&allocation.id) {
            Some(buffer) if buffer.mapped => buffer.mapped = false,
            _ => state.faults.push(format!("unmap of unmapped allocation {}", allocation.id)),
        }
        state.calls.push(format!("unmap({})", allocation.id));
    }

    fn create_image(&self, desc: &ImageCreateDesc) -> Result<(u64, MockAllocation)> {
        let mut state = self.state.borrow_mut();
        if state.take_failure(MockFailure::ImageAllocation) {
            return Err(Error::AllocationFailed("mock image allocation".to_string()));
        }
        let id = state.id();
        let size = (desc.width * desc.height * desc.format.bytes_per_pixel()) as usize;
        state.images.insert(
            id,
            MockImage { desc: *desc, layout: ImageLayout::Undefined, texels: vec![0; size] },
        );
        state.calls.push(format!("create_image({})", id));
        Ok((id, MockAllocation { id }))
    }

    fn destroy_image(&self, image: u64, _allocation: MockAllocation) {
        let mut state = self.state.borrow_mut();
        if state.views.values().any(|&target| target == image) {
            state.faults.push(format!("image {} destroyed while a view is alive", image));
        }
        if state.images.remove(&image).is_none() {
            state.faults.push(format!("destroy of dead image {}", image));
        }
        state.calls.push(format!("destroy_image({})", image));
    }

    fn create_image_view(&self, image: u64, _desc: &ImageViewDesc) -> Result<u64> {
        let mut state = self.state.borrow_mut();
        if state.take_failure(MockFailure::ImageView) {
            return Err(Error::ResourceCreationFailed("mock image view".to_string()));
        }
        if !state.images.contains_key(&image) {
            return Err(Error::InvalidResource(format!("view of dead image {}", image)));
        }
        let id = state.id();
        state.views.insert(id, image);
        state.calls.push(format!("create_image_view({})", id));
        Ok(id)
    }

    fn destroy_image_view(&self, view: u64) {
        let mut state = self.state.borrow_mut();
        if state.views.remove(&view).is_none() {
            state.faults.push(format!("destroy of dead view {}", view));
        }
        state.calls.push(format!("destroy_image_view({})", view));
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<u64> {
        let mut state = self.state.borrow_mut();
        if state.take_failure(MockFailure::Sampler) {
            return Err(Error::ResourceCreationFailed("mock sampler".to_string()));
        }
        let id = state.id();
        state.samplers.insert(id, *desc);
        state.calls.push(format!("create_sampler({})", id));
        Ok(id)
    }

    fn destroy_sampler(&self, sampler: u64) {
        let mut state = self.state.borrow_mut();
        if state.samplers.remove(&sampler).is_none() {
            state.faults.push(format!("destroy of dead sampler {}", sampler));
        }
        state.calls.push(format!("destroy_sampler({})", sampler));
    }

    fn begin_one_shot(&self) -> Result<u64> {
        let mut state = self.state.borrow_mut();
        if state.take_failure(MockFailure::Begin) {
            return Err(Error::CommandSubmissionFailed("mock begin".to_string()));
        }
        if !state.open.is_empty() {
            state.faults.push("nested one-shot command buffer".to_string());
        }
        let id = state.id();
        state.open.insert(id, Vec::new());
        Ok(id)
    }

    fn end_one_shot(&self, command_buffer: u64) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let Some(commands) = state.open.remove(&command_buffer) else {
            state.faults.push(format!("end of unknown command buffer {}", command_buffer));
            return Err(Error::CommandSubmissionFailed("unknown command buffer".to_string()));
        };
        if state.take_failure(MockFailure::Submit) {
            return Err(Error::CommandSubmissionFailed("mock submit".to_string()));
        }
        for command in commands {
            state.execute(command);
        }
        state.submissions += 1;
        state.calls.push(format!("submit({})", command_buffer));
        Ok(())
    }

    fn cmd_image_barrier(&self, command_buffer: u64, image: u64, barrier: &ImageBarrier) {
        self.state
            .borrow_mut()
            .record(command_buffer, Command::Barrier { image, barrier: *barrier });
    }

    fn cmd_copy_buffer_to_image(
        &self,
        command_buffer: u64,
        buffer: u64,
        image: u64,
        region: &BufferImageCopy,
    ) {
        self.state
            .borrow_mut()
            .record(command_buffer, Command::BufferToImage { buffer, image, region: *region });
    }

    fn cmd_copy_image_to_buffer(
        &self,
        command_buffer: u64,
        image: u64,
        buffer: u64,
        region: &BufferImageCopy,
    ) {
        self.state
            .borrow_mut()
            .record(command_buffer, Command::ImageToBuffer { image, buffer, region: *region });
    }
}

#[cfg(test)]
#[path = "mock_device_tests.rs"]
mod tests;
