//! Editing session for one image.
//!
//! [`EditedImage`] lives on the control side. Every edit takes a value
//! snapshot of the chain and hands it to the render lane; the method returns
//! at once. Finished previews come back as events that are applied by
//! [`poll`](EditedImage::poll) or [`wait_for_render`](EditedImage::wait_for_render),
//! which swap the published buffer. A failed render is recorded in
//! [`last_error`](EditedImage::last_error) and never replaces the published
//! buffer.

use crate::lane::{LaneHandle, RenderEvent, SessionId};
use crate::scheduler::{RenderRequest, RenderState, StateCell};
use crate::{PixelBuffer, RenderError, RenderResult, Renderer};
use hdredit_core::Image;
use hdredit_io::{AdjustmentData, Asset, persist};
use hdredit_ops::{AdjustmentChain, AdjustmentId};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// An image being edited, plus its live preview.
pub struct EditedImage {
    pub(crate) source: Image,
    pub(crate) chain: AdjustmentChain,
    show_original: bool,
    default_filename: Option<String>,

    published: Option<Arc<PixelBuffer>>,
    published_seq: u64,
    last_error: Option<RenderError>,
    seq: u64,
    completed_seq: u64,

    session: SessionId,
    pub(crate) lane: LaneHandle,
    events: Receiver<RenderEvent>,
    state: Arc<StateCell>,
}

impl EditedImage {
    /// Starts a session on `renderer` and requests the first preview.
    pub fn new(renderer: &Renderer, source: Image, chain: AdjustmentChain) -> Self {
        let link = renderer.open_session(source.clone());
        let mut this = Self {
            source,
            chain,
            show_original: false,
            default_filename: None,
            published: None,
            published_seq: 0,
            last_error: None,
            seq: 0,
            completed_seq: 0,
            session: link.id,
            lane: link.lane,
            events: link.events,
            state: link.state,
        };
        this.request_render();
        this
    }

    /// Decodes `asset` and restores persisted edits.
    ///
    /// Edits that cannot be loaded (foreign or newer format, corrupt data)
    /// are ignored and the session starts from the default chain.
    ///
    /// # Errors
    ///
    /// Returns the decode error if the asset cannot be read.
    pub fn open(renderer: &Renderer, asset: &Asset, edits: Option<&AdjustmentData>) -> RenderResult<Self> {
        let source = asset.decode().map_err(|e| RenderError::Render(format!("{}: {e}", asset.name())))?;
        let chain = persist::load_or_default(edits);
        debug!(asset = asset.id(), restored = !chain.is_identity(), "open session");
        let mut this = Self::new(renderer, source, chain);
        this.default_filename = asset.default_filename().map(str::to_string);
        Ok(this)
    }

    /// Source image, untouched by edits.
    pub fn source(&self) -> &Image {
        &self.source
    }

    /// Current chain.
    pub fn chain(&self) -> &AdjustmentChain {
        &self.chain
    }

    /// `true` while the preview bypasses the chain.
    pub fn show_original(&self) -> bool {
        self.show_original
    }

    /// Suggested export name, from the source file stem.
    pub fn default_filename(&self) -> Option<&str> {
        self.default_filename.as_deref()
    }

    /// Updates one adjustment and schedules a preview.
    pub fn set_adjustment(&mut self, id: AdjustmentId, enabled: Option<bool>, value: Option<f64>) {
        self.chain.set(id, enabled, value);
        self.request_render();
    }

    /// Enables or disables one adjustment.
    pub fn set_enabled(&mut self, id: AdjustmentId, enabled: bool) {
        self.set_adjustment(id, Some(enabled), None);
    }

    /// Sets one adjustment's value (clamped).
    pub fn set_value(&mut self, id: AdjustmentId, value: f64) {
        self.set_adjustment(id, None, Some(value));
    }

    /// Replaces the whole chain.
    pub fn set_chain(&mut self, chain: AdjustmentChain) {
        self.chain = chain;
        self.request_render();
    }

    /// Resets every adjustment to its disabled default.
    pub fn reset(&mut self) {
        self.chain.reset();
        self.request_render();
    }

    /// Toggles the before/after bypass.
    pub fn set_show_original(&mut self, show: bool) {
        self.show_original = show;
        self.request_render();
    }

    /// Persisted form of the current chain.
    pub fn save_edits(&self) -> Option<AdjustmentData> {
        persist::save(&self.chain)
    }

    /// Most recently published preview.
    pub fn published(&self) -> Option<&Arc<PixelBuffer>> {
        self.published.as_ref()
    }

    /// Error from the most recent render, cleared by the next success.
    pub fn last_error(&self) -> Option<&RenderError> {
        self.last_error.as_ref()
    }

    /// Sequence number of the latest edit.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Where this session's preview is in the pipeline.
    ///
    /// Never [`RenderState::Idle`] while the latest edit is unsettled; a
    /// finished render reads as `Scheduled` until it has been applied.
    pub fn render_state(&self) -> RenderState {
        match self.state.load() {
            RenderState::Idle if !self.is_settled() => RenderState::Scheduled,
            state => state,
        }
    }

    /// `true` once the latest edit has been rendered or has failed.
    pub fn is_settled(&self) -> bool {
        self.completed_seq >= self.seq
    }

    /// Applies all finished renders. Returns how many events were handled.
    pub fn poll(&mut self) -> usize {
        let mut n = 0;
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    self.apply(event);
                    n += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.lane_closed();
                    break;
                }
            }
        }
        n
    }

    /// Blocks until the latest edit has been rendered or has failed.
    ///
    /// Returns `false` on timeout or if the lane has stopped.
    pub fn wait_for_render(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.poll();
        while !self.is_settled() {
            let left = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(left) {
                Ok(event) => self.apply(event),
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => {
                    self.lane_closed();
                    return false;
                }
            }
        }
        self.last_error != Some(RenderError::LaneClosed)
    }

    fn apply(&mut self, event: RenderEvent) {
        self.completed_seq = self.completed_seq.max(event.seq());
        match event {
            RenderEvent::Rendered { seq, buffer } => {
                if seq > self.published_seq {
                    self.published = Some(buffer);
                    self.published_seq = seq;
                    self.last_error = None;
                }
            }
            RenderEvent::Failed { seq, error } => {
                if seq > self.published_seq {
                    self.last_error = Some(error);
                } else {
                    debug!(session = self.session, seq, published = self.published_seq, "stale failure ignored");
                }
            }
        }
    }

    fn request_render(&mut self) {
        self.seq += 1;
        let request = RenderRequest {
            chain: self.chain,
            show_original: self.show_original,
            seq: self.seq,
            requested_at: Instant::now(),
        };
        if let Err(e) = self.lane.preview(self.session, request) {
            warn!(session = self.session, seq = self.seq, error = %e, "cannot schedule preview");
            self.lane_closed();
        }
    }

    fn lane_closed(&mut self) {
        self.last_error = Some(RenderError::LaneClosed);
        self.completed_seq = self.seq;
        self.state.store(RenderState::Idle);
    }
}

impl Drop for EditedImage {
    fn drop(&mut self) {
        self.lane.close(self.session);
    }
}

impl std::fmt::Debug for EditedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditedImage")
            .field("session", &self.session)
            .field("source", &self.source)
            .field("chain", &self.chain)
            .field("show_original", &self.show_original)
            .field("seq", &self.seq)
            .field("published_seq", &self.published_seq)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RendererConfig;

    const WAIT: Duration = Duration::from_secs(10);

    fn gray_session(renderer: &Renderer) -> EditedImage {
        EditedImage::new(renderer, Image::filled(2, 2, [0.5, 0.5, 0.5, 1.0]), AdjustmentChain::new())
    }

    #[test]
    fn late_failure_does_not_mask_newer_preview() {
        let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
        let mut edit = gray_session(&renderer);
        assert!(edit.wait_for_render(WAIT));
        edit.set_value(AdjustmentId::Exposure, 0.5);
        assert!(edit.wait_for_render(WAIT));
        assert_eq!(edit.published_seq, 2);

        edit.apply(RenderEvent::Failed {
            seq: 1,
            error: RenderError::Render("late".into()),
        });
        assert!(edit.last_error().is_none());
        assert_eq!(edit.published_seq, 2);

        edit.apply(RenderEvent::Failed {
            seq: 3,
            error: RenderError::Render("newer".into()),
        });
        assert_eq!(edit.last_error(), Some(&RenderError::Render("newer".into())));
    }

    #[test]
    fn unsettled_session_is_never_idle() {
        let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
        let mut edit = gray_session(&renderer);
        assert!(edit.wait_for_render(WAIT));
        assert_eq!(edit.render_state(), RenderState::Idle);

        // The lane may still hold Idle from the previous render.
        edit.state.store(RenderState::Idle);
        edit.set_value(AdjustmentId::Contrast, 1.2);
        assert!(!edit.is_settled());
        assert_ne!(edit.render_state(), RenderState::Idle);

        assert!(edit.wait_for_render(WAIT));
        assert_eq!(edit.render_state(), RenderState::Idle);
    }
}
