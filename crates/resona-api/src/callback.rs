use crate::device::SessionInfo;

/// Consumer side of the streaming contract. Registered with a device by
/// `start()`, released by `stop()`.
pub trait IoCallback: Send {
    /// Called once per start, before the first block is delivered, on a
    /// backend-chosen thread (not necessarily the real-time one). The
    /// snapshot carries the negotiated sample rate and buffer size.
    fn about_to_start(&mut self, session: &SessionInfo);

    /// Delivers one block of audio on the backend's real-time thread.
    ///
    /// Slot `i` of `inputs`/`outputs` corresponds to entry `i` of the
    /// device's channel-name list; channels outside the active mask are
    /// `None` and must be skipped. Every `Some` output slice must be fully
    /// written before returning, with zeros when there is nothing to play.
    /// Input slices are only valid for the duration of the call.
    /// `num_samples` equals the length of each `Some` slice and may change
    /// from one block to the next.
    ///
    /// Blocking here (locks under contention, I/O, allocation) stalls the
    /// device's period deadline and causes dropouts.
    fn process_block(
        &mut self,
        inputs: &[Option<&[f32]>],
        outputs: &mut [Option<&mut [f32]>],
        num_samples: usize,
    );

    /// Called after a stop has drained the last in-flight block. The device
    /// no longer references the callback once this returns.
    fn stopped(&mut self);

    /// Operational failure report. May arrive from any thread, including the
    /// real-time one; defer heavy work elsewhere.
    fn device_error(&mut self, message: &str) {
        let _ = message;
    }
}
