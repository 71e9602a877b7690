//! Bridge to the native `peepit` helper
//!
//! Screen capture and window enumeration are performed by a separate native
//! executable. This crate wraps its command-line contract:
//!
//! - Building argument lists for `image`, `list apps` and `list windows`
//! - Running the helper as a subprocess with a bounded wait
//! - Decoding the JSON envelope it prints on stdout into typed results
//!
//! The [`CaptureBridge`] trait is the seam consumers depend on, so that
//! tests can substitute an in-process fake for the real helper.

pub mod bridge;
pub mod error;
pub mod subprocess;
pub mod target;
pub mod types;

pub use bridge::CaptureBridge;
pub use error::{CaptureError, Result};
pub use subprocess::PeepItCli;
pub use target::CaptureTarget;
pub use types::{
    ApplicationInfo, ApplicationList, CaptureData, CaptureFocus, CaptureRequest, HelperOutput,
    ImageFormat, SavedFile, TargetApplicationInfo, WindowBounds, WindowDetail, WindowInfo,
    WindowList,
};
