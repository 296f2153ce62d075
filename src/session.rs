//! Still-image display sessions
//!
//! A session owns one hardware decode and render pipeline bound to a
//! single physical output for as long as it is open. Teardown is
//! idempotent and forced on drop, so a dropped session never leaks the
//! pipeline.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{DisplayError, Result};
use crate::hal::PipelineHandle;
use crate::host::HostShared;
use crate::types::DisplayTarget;

/// Display-region parameters for the render stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Output the renderer binds to
    pub target: DisplayTarget,
    /// Compositor layer the picture is placed on
    pub layer: i32,
    /// Scale the picture to the full output
    pub fullscreen: bool,
    /// Picture opacity, 0 transparent to 255 opaque
    pub opacity: u8,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            target: DisplayTarget::Hdmi,
            layer: 0,
            fullscreen: true,
            opacity: 255,
        }
    }
}

/// One exclusive image presentation on a physical output
///
/// Created closed; `open` acquires the pipeline, `close` releases it.
/// The observable fields are accessor-only: the bound output never
/// changes after construction, and the uri tracks the lifecycle.
pub struct DisplaySession {
    shared: Arc<HostShared>,
    config: SessionConfig,
    pipeline: Option<PipelineHandle>,
    uri: String,
}

impl DisplaySession {
    pub(crate) fn new(shared: Arc<HostShared>, config: SessionConfig) -> Self {
        DisplaySession { shared, config, pipeline: None, uri: String::new() }
    }

    /// Output this session renders to
    pub fn target(&self) -> DisplayTarget {
        self.config.target
    }

    /// Locator of the image currently shown, empty while closed
    pub fn resource_uri(&self) -> &str {
        &self.uri
    }

    /// Whether a hardware pipeline is active
    pub fn is_open(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Decode `uri` and present it on the session's output.
    ///
    /// Validation runs before any hardware interaction: the uri must be
    /// carryable, non-empty, readable and a recognized still-image
    /// format. A session that is already open rejects the call; close
    /// it first to show a different picture. The call returns once the
    /// pipeline is running; the first frame may still be settling on
    /// the panel.
    pub fn open(&mut self, uri: &str) -> Result<()> {
        if self.is_open() {
            return Err(DisplayError::SessionBusy(self.uri.clone()));
        }
        probe_resource(uri)?;

        self.shared.claim_output(self.config.target)?;
        let acquired = {
            let _serial = self.shared.command_lock(self.config.target);
            self.shared
                .hw()
                .acquire_pipeline(self.config.target, Path::new(uri), &self.config)
        };
        let handle = match acquired {
            Ok(handle) => handle,
            Err(fault) => {
                self.shared.release_output(self.config.target);
                return Err(fault.into());
            }
        };

        self.pipeline = Some(handle);
        self.uri = uri.to_string();
        log::info!("display session open: '{}' on {}", uri, self.config.target);
        Ok(())
    }

    /// Stop presentation and release the pipeline.
    ///
    /// Safe to call any number of times; on an already closed session
    /// this does nothing.
    pub fn close(&mut self) {
        let Some(handle) = self.pipeline.take() else {
            return;
        };
        self.uri.clear();
        let released = {
            let _serial = self.shared.command_lock(self.config.target);
            self.shared.hw().release_pipeline(handle)
        };
        if let Err(fault) = released {
            log::warn!("pipeline release on {} reported: {}", self.config.target, fault);
        }
        self.shared.release_output(self.config.target);
        log::info!("display session closed on {}", self.config.target);
    }
}

impl Drop for DisplaySession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Check that the uri resolves to a readable still image, without
/// touching the hardware.
fn probe_resource(uri: &str) -> Result<()> {
    if uri.contains('\0') {
        return Err(DisplayError::InvalidUri(uri.to_string()));
    }
    if uri.is_empty() {
        return Err(DisplayError::ResourceIo {
            uri: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "empty resource uri"),
        });
    }
    let mut file = std::fs::File::open(uri)
        .map_err(|source| DisplayError::ResourceIo { uri: uri.to_string(), source })?;
    let mut header = [0u8; 32];
    let read = file
        .read(&mut header)
        .map_err(|source| DisplayError::ResourceIo { uri: uri.to_string(), source })?;
    if image::guess_format(&header[..read]).is_err() {
        return Err(DisplayError::ResourceIo {
            uri: uri.to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "unrecognized image format",
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::FakeVideoCore;
    use crate::host::DisplayHost;
    use std::path::PathBuf;
    use std::time::Duration;

    fn test_host() -> (DisplayHost, FakeVideoCore) {
        let hw = FakeVideoCore::new().with_settle(Duration::ZERO);
        (DisplayHost::new(hw.clone()), hw)
    }

    fn temp_image(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "vc-display-test-{}-{}.png",
            std::process::id(),
            name
        ));
        image::RgbImage::new(8, 8).save(&path).unwrap();
        path
    }

    #[test]
    fn test_fresh_session_is_closed() {
        let (host, _) = test_host();
        let session = host.session();
        assert!(!session.is_open());
        assert_eq!(session.resource_uri(), "");
        assert_eq!(session.target(), DisplayTarget::Hdmi);

        let lcd = host.session_on(DisplayTarget::Lcd);
        assert_eq!(lcd.target(), DisplayTarget::Lcd);
    }

    #[test]
    fn test_open_empty_uri_is_a_resource_error() {
        let (host, hw) = test_host();
        let mut session = host.session();
        assert!(matches!(
            session.open(""),
            Err(DisplayError::ResourceIo { .. })
        ));
        assert!(!session.is_open());
        assert_eq!(hw.live_pipelines(), 0);
    }

    #[test]
    fn test_open_missing_file_is_a_resource_error() {
        let (host, _) = test_host();
        let mut session = host.session();
        assert!(matches!(
            session.open("/no/such/picture.png"),
            Err(DisplayError::ResourceIo { .. })
        ));
        assert!(!session.is_open());
    }

    #[test]
    fn test_open_non_image_is_a_resource_error() {
        let path = std::env::temp_dir().join(format!(
            "vc-display-test-{}-not-an-image.txt",
            std::process::id()
        ));
        std::fs::write(&path, b"definitely not pixels").unwrap();

        let (host, _) = test_host();
        let mut session = host.session();
        assert!(matches!(
            session.open(path.to_str().unwrap()),
            Err(DisplayError::ResourceIo { .. })
        ));
        assert!(!session.is_open());
    }

    #[test]
    fn test_open_nul_uri_is_rejected() {
        let (host, _) = test_host();
        let mut session = host.session();
        assert!(matches!(
            session.open("bad\0path.png"),
            Err(DisplayError::InvalidUri(_))
        ));
        assert!(!session.is_open());
    }

    #[test]
    fn test_open_and_close_roundtrip() {
        let image = temp_image("roundtrip");
        let uri = image.to_str().unwrap();
        let (host, hw) = test_host();

        let mut session = host.session_on(DisplayTarget::Hdmi);
        session.open(uri).unwrap();
        assert!(session.is_open());
        assert_eq!(session.resource_uri(), uri);
        assert_eq!(session.target(), DisplayTarget::Hdmi);
        assert_eq!(hw.live_pipelines(), 1);

        session.close();
        assert!(!session.is_open());
        assert_eq!(session.resource_uri(), "");
        assert_eq!(hw.live_pipelines(), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let image = temp_image("idempotent-close");
        let (host, hw) = test_host();
        let mut session = host.session();

        session.close();
        session.close();

        session.open(image.to_str().unwrap()).unwrap();
        session.close();
        session.close();
        assert!(!session.is_open());
        assert_eq!(session.resource_uri(), "");
        assert_eq!(hw.live_pipelines(), 0);
    }

    #[test]
    fn test_open_while_open_is_rejected() {
        let image = temp_image("reopen");
        let other = temp_image("reopen-other");
        let uri = image.to_str().unwrap();
        let (host, _) = test_host();

        let mut session = host.session();
        session.open(uri).unwrap();
        assert!(matches!(
            session.open(other.to_str().unwrap()),
            Err(DisplayError::SessionBusy(_))
        ));
        assert!(session.is_open());
        assert_eq!(session.resource_uri(), uri);
    }

    #[test]
    fn test_second_session_on_same_output_is_rejected() {
        let image = temp_image("conflict");
        let uri = image.to_str().unwrap();
        let (host, _) = test_host();

        let mut first = host.session();
        let mut second = host.session();
        first.open(uri).unwrap();
        assert!(matches!(
            second.open(uri),
            Err(DisplayError::OutputBusy(DisplayTarget::Hdmi))
        ));
        assert!(!second.is_open());

        first.close();
        second.open(uri).unwrap();
        assert!(second.is_open());
    }

    #[test]
    fn test_sessions_on_distinct_outputs_coexist() {
        let image = temp_image("distinct");
        let uri = image.to_str().unwrap();
        let (host, hw) = test_host();

        let mut panel = host.session_on(DisplayTarget::Lcd);
        let mut monitor = host.session_on(DisplayTarget::Hdmi);
        panel.open(uri).unwrap();
        monitor.open(uri).unwrap();
        assert_eq!(hw.live_pipelines(), 2);
    }

    #[test]
    fn test_drop_releases_the_pipeline() {
        let image = temp_image("drop");
        let (host, hw) = test_host();
        {
            let mut session = host.session();
            session.open(image.to_str().unwrap()).unwrap();
            assert_eq!(hw.live_pipelines(), 1);
        }
        assert_eq!(hw.live_pipelines(), 0);

        // The output claim is released too.
        let mut next = host.session();
        next.open(image.to_str().unwrap()).unwrap();
        assert!(next.is_open());
    }
}
