//! Backend for builds or hosts without capture hardware

use super::{AcquiredStream, CaptureBackend, CaptureConstraints};
use crate::error::{MediaError, MediaResult};
use async_trait::async_trait;

/// Backend whose every acquisition fails with `DeviceUnavailable`
#[derive(Debug, Clone)]
pub struct UnavailableCaptureBackend {
    reason: String,
}

impl UnavailableCaptureBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CaptureBackend for UnavailableCaptureBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn acquire(&self, _constraints: &CaptureConstraints) -> MediaResult<AcquiredStream> {
        Err(MediaError::DeviceUnavailable {
            reason: self.reason.clone(),
        })
    }
}
