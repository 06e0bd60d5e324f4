use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::core::recording::RecordingSession;
use crate::core::io::RequestHandle;

use crate::prelude::*;

/// <sup>[`serde`](https://serde.rs)</sup>
/// Kind of files downloadable from a device.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DownloadKind {
    /// Crash reports.
    CrashReports,
    /// Flight logs.
    FlightLogs,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Outcome of a transfer.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TransferStatus {
    /// Transfer completed.
    Success,
    /// Transfer failed.
    Failed,
    /// Transfer was cancelled through its [`RequestHandle`].
    Canceled,
}

/// Listener of upload and download progress.
pub trait TransferListener: Send + Sync {
    /// Transfer progress in percent.
    fn on_progress(&self, percent: u8) {
        let _ = percent;
    }

    /// Transfer is over.
    fn on_complete(&self, status: TransferStatus);
}

/// Source of commands sent periodically without acknowledgement.
///
/// Encoders are polled by the backend at the period set by
/// [`ProtocolBackend::set_unacked_loop_period`].
pub trait NoAckEncoder: Debug + Send + Sync {
    /// Produces the next command to send, if any.
    fn encode(&self) -> Option<Command>;
}

/// Live protocol link to a device.
///
/// Handed to a device controller when its provider reports the link as connected and released
/// on disconnection.
pub trait ProtocolBackend: Debug + Send + Sync {
    /// Sends a command. Returns `false` if the command could not be queued.
    fn send(&self, command: Command) -> bool;

    /// Sets the period of the unacknowledged command loop.
    fn set_unacked_loop_period(&self, period: Duration);

    /// Adds an encoder to the unacknowledged command loop.
    fn register_unacked_encoder(&self, encoder: Arc<dyn NoAckEncoder>);

    /// Removes an encoder from the unacknowledged command loop.
    fn unregister_unacked_encoder(&self, encoder: &Arc<dyn NoAckEncoder>);

    /// Opens an auxiliary channel to the device-side `port`.
    ///
    /// Completion is reported with a
    /// [`ProxyChannelOpened`](crate::core::event::Event::ProxyChannelOpened) event.
    fn open_proxy_channel(&self, port: u16) -> RequestHandle;

    /// Starts downloading files of given `kind` into `dest`.
    fn start_download(
        &self,
        kind: DownloadKind,
        dest: &Path,
        listener: Arc<dyn TransferListener>,
    ) -> RequestHandle;

    /// Starts uploading a firmware file.
    fn start_upload(&self, src: &Path, listener: Arc<dyn TransferListener>) -> RequestHandle;

    /// Subscribes a recording session to the device event stream.
    fn subscribe_recording(&self, session: Arc<dyn RecordingSession>) -> RequestHandle;

    /// Backend that reaches `device` through this one.
    fn proxy_for(&self, device: &DeviceId) -> Arc<dyn ProtocolBackend>;
}
