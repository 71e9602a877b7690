//! The capture seam used by tool handlers

use async_trait::async_trait;

use crate::error::Result;
use crate::subprocess::{PeepItCli, image_args, list_apps_args, list_windows_args};
use crate::types::{
    ApplicationList, CaptureData, CaptureRequest, HelperOutput, WindowDetail, WindowList,
};

/// Capture and enumeration operations
#[async_trait]
pub trait CaptureBridge: Send + Sync {
    /// Capture the requested target into files
    async fn capture(&self, request: &CaptureRequest) -> Result<HelperOutput<CaptureData>>;

    /// List running applications
    async fn list_applications(&self) -> Result<HelperOutput<ApplicationList>>;

    /// List the windows of one application
    async fn list_windows(
        &self,
        app: &str,
        details: &[WindowDetail],
    ) -> Result<HelperOutput<WindowList>>;
}

#[async_trait]
impl CaptureBridge for PeepItCli {
    async fn capture(&self, request: &CaptureRequest) -> Result<HelperOutput<CaptureData>> {
        self.run(&image_args(request)).await
    }

    async fn list_applications(&self) -> Result<HelperOutput<ApplicationList>> {
        self.run(&list_apps_args()).await
    }

    async fn list_windows(
        &self,
        app: &str,
        details: &[WindowDetail],
    ) -> Result<HelperOutput<WindowList>> {
        self.run(&list_windows_args(app, details)).await
    }
}
