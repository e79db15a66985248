//! Mock engine that records calls and fabricates output instead of touching pixels.

use super::{DecodeMode, EncodedImage, EngineError, HandleAttributes, ImageEngine, TransformPlan};
use imgserve_core::ImageSize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedOp {
    Open(DecodeMode),
    Render(TransformPlan),
    Release,
    ThreadCleanup,
}

pub struct MockHandle {
    attributes: HandleAttributes,
}

/// Every non-empty buffer decodes to `attributes`; the empty buffer is a decode error.
pub struct MockEngine {
    pub attributes: HandleAttributes,
    fail_encode: bool,
    operations: Mutex<Vec<RecordedOp>>,
    live: AtomicUsize,
    opened: AtomicUsize,
    released: AtomicUsize,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::with_size(1785, 1000)
    }
}

impl MockEngine {
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            attributes: HandleAttributes {
                size: ImageSize::new(width, height),
                channels: 3,
                has_alpha: false,
                has_profile: false,
                space: "srgb".to_string(),
                orientation: None,
                image_type: "jpeg",
            },
            fail_encode: false,
            operations: Mutex::new(Vec::new()),
            live: AtomicUsize::new(0),
            opened: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
        }
    }

    pub fn failing_encode(mut self) -> Self {
        self.fail_encode = true;
        self
    }

    pub fn operations(&self) -> Vec<RecordedOp> {
        self.operations.lock().unwrap().clone()
    }

    pub fn rendered_plans(&self) -> Vec<TransformPlan> {
        self.operations()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Render(plan) => Some(plan),
                _ => None,
            })
            .collect()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    fn record(&self, op: RecordedOp) {
        self.operations.lock().unwrap().push(op);
    }
}

impl ImageEngine for MockEngine {
    type Handle = MockHandle;

    fn open(&self, buf: &[u8], mode: DecodeMode) -> Result<MockHandle, EngineError> {
        if buf.is_empty() {
            return Err(EngineError::Decode("empty image buffer".to_string()));
        }
        self.record(RecordedOp::Open(mode));
        self.live.fetch_add(1, Ordering::SeqCst);
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockHandle {
            attributes: self.attributes.clone(),
        })
    }

    fn attributes(&self, handle: &MockHandle) -> HandleAttributes {
        handle.attributes.clone()
    }

    fn render(
        &self,
        handle: &mut MockHandle,
        plan: &TransformPlan,
    ) -> Result<EncodedImage, EngineError> {
        self.record(RecordedOp::Render(*plan));
        if self.fail_encode {
            return Err(EngineError::Encode("mock encoder failure".to_string()));
        }
        let size = plan.output_size(handle.attributes.size);
        Ok(EncodedImage {
            data: size.to_string().into_bytes(),
            size,
            image_type: handle.attributes.image_type,
        })
    }

    fn release(&self, _handle: MockHandle) {
        self.record(RecordedOp::Release);
        self.live.fetch_sub(1, Ordering::SeqCst);
        self.released.fetch_add(1, Ordering::SeqCst);
    }

    fn live_handles(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    fn thread_cleanup(&self) {
        self.record(RecordedOp::ThreadCleanup);
    }
}
