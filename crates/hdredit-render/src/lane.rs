//! The render lane: one worker thread that owns the [`RenderContext`].
//!
//! Sessions and exports talk to the lane over a single mpsc queue, so all
//! compositing, buffer filling and encoding is serialized on one thread and
//! the context needs no locking. Preview requests are coalesced per session;
//! the lane sleeps until the next coalescer deadline or the next message.
//!
//! Results go back over per-session channels as [`RenderEvent`]s. Exports
//! reply on a one-shot channel and the caller waits with a deadline.

use crate::buffer::{BufferAllocator, PixelBuffer};
use crate::context::{CpuContext, RenderContext};
use crate::resolver::resolve;
use crate::scheduler::{Coalescer, RenderRequest, RenderState, StateCell};
use crate::{RenderError, RenderResult, RendererConfig};
use hdredit_core::Image;
use hdredit_io::{ContentType, HdrColorInfo};
use hdredit_ops::{AdjustmentChain, compose};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Identifies a session on the lane.
pub type SessionId = u64;

/// Result of one preview render, delivered to the owning session.
#[derive(Debug, Clone)]
pub enum RenderEvent {
    /// A new preview is ready.
    Rendered {
        /// Sequence number of the request that produced it.
        seq: u64,
        /// The filled buffer.
        buffer: Arc<PixelBuffer>,
    },
    /// The render failed; the previous preview stays current.
    Failed {
        /// Sequence number of the failed request.
        seq: u64,
        /// Why.
        error: RenderError,
    },
}

impl RenderEvent {
    /// Sequence number this event answers.
    pub fn seq(&self) -> u64 {
        match self {
            Self::Rendered { seq, .. } | Self::Failed { seq, .. } => *seq,
        }
    }
}

/// Final encode job.
pub(crate) struct ExportJob {
    pub source: Image,
    pub chain: AdjustmentChain,
    pub content_type: ContentType,
    pub color: HdrColorInfo,
}

enum LaneMsg {
    Open {
        session: SessionId,
        source: Image,
        events: Sender<RenderEvent>,
        state: Arc<StateCell>,
    },
    Preview {
        session: SessionId,
        request: RenderRequest,
    },
    Close {
        session: SessionId,
    },
    Export {
        job: ExportJob,
        reply: SyncSender<RenderResult<Vec<u8>>>,
    },
    Shutdown,
}

/// Cloneable sender side of the lane, held by sessions.
#[derive(Clone)]
pub(crate) struct LaneHandle {
    tx: Sender<LaneMsg>,
    deadline: Duration,
}

impl LaneHandle {
    pub fn preview(&self, session: SessionId, request: RenderRequest) -> RenderResult<()> {
        self.tx
            .send(LaneMsg::Preview { session, request })
            .map_err(|_| RenderError::LaneClosed)
    }

    pub fn close(&self, session: SessionId) {
        let _ = self.tx.send(LaneMsg::Close { session });
    }

    /// Runs `job` on the lane and waits for the encoded bytes.
    pub fn export(&self, job: ExportJob) -> RenderResult<Vec<u8>> {
        let (reply, rx) = mpsc::sync_channel(1);
        self.tx
            .send(LaneMsg::Export { job, reply })
            .map_err(|_| RenderError::LaneClosed)?;
        match rx.recv_timeout(self.deadline) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(RenderError::Timeout(self.deadline)),
            Err(RecvTimeoutError::Disconnected) => Err(RenderError::LaneClosed),
        }
    }
}

/// Session endpoints returned by [`Renderer::open_session`].
pub(crate) struct SessionLink {
    pub id: SessionId,
    pub events: Receiver<RenderEvent>,
    pub state: Arc<StateCell>,
    pub lane: LaneHandle,
}

/// Owner of the render lane thread.
///
/// Dropping the renderer stops the lane and joins it. Sessions that outlive
/// it see [`RenderError::LaneClosed`] on their next edit or export.
pub struct Renderer {
    lane: LaneHandle,
    config: RendererConfig,
    context_name: String,
    next_session: AtomicU64,
    worker: Option<JoinHandle<()>>,
}

impl Renderer {
    /// Spawns the lane with `context`.
    ///
    /// # Errors
    ///
    /// [`RenderError::Render`] if the thread cannot be spawned.
    pub fn new(context: Box<dyn RenderContext>, config: RendererConfig) -> RenderResult<Self> {
        let (tx, rx) = mpsc::channel();
        let context_name = context.name().to_string();
        let lane = Lane {
            rx,
            context,
            allocator: BufferAllocator::new(config.max_buffer_pixels),
            min_interval: config.min_interval(),
            sessions: HashMap::new(),
        };
        let worker = thread::Builder::new()
            .name("hdredit-render".into())
            .spawn(move || lane.run())
            .map_err(|e| RenderError::Render(format!("cannot spawn render lane: {e}")))?;
        debug!(context = %context_name, ?config, "render lane started");

        Ok(Self {
            lane: LaneHandle {
                tx,
                deadline: config.render_deadline(),
            },
            config,
            context_name,
            next_session: AtomicU64::new(1),
            worker: Some(worker),
        })
    }

    /// Lane backed by [`CpuContext`].
    pub fn cpu(config: RendererConfig) -> RenderResult<Self> {
        Self::new(Box::new(CpuContext::new()), config)
    }

    /// Active configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Name of the injected context.
    pub fn context_name(&self) -> &str {
        &self.context_name
    }

    /// Registers a session for `source`.
    pub(crate) fn open_session(&self, source: Image) -> SessionLink {
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        let (events_tx, events) = mpsc::channel();
        let state = Arc::new(StateCell::default());
        let _ = self.lane.tx.send(LaneMsg::Open {
            session: id,
            source,
            events: events_tx,
            state: Arc::clone(&state),
        });
        SessionLink {
            id,
            events,
            state,
            lane: self.lane.clone(),
        }
    }

    /// Encodes without a session: compose, then encode on the lane.
    pub fn export(
        &self,
        source: &Image,
        chain: &AdjustmentChain,
        content_type: &ContentType,
        color: &HdrColorInfo,
    ) -> RenderResult<Vec<u8>> {
        self.lane.export(ExportJob {
            source: source.clone(),
            chain: *chain,
            content_type: content_type.clone(),
            color: *color,
        })
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        let _ = self.lane.tx.send(LaneMsg::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

struct LaneSession {
    source: Image,
    events: Sender<RenderEvent>,
    state: Arc<StateCell>,
    coalescer: Coalescer,
}

struct Lane {
    rx: Receiver<LaneMsg>,
    context: Box<dyn RenderContext>,
    allocator: BufferAllocator,
    min_interval: Duration,
    sessions: HashMap<SessionId, LaneSession>,
}

impl Lane {
    fn run(mut self) {
        'run: loop {
            let deadline = self.sessions.values().filter_map(|s| s.coalescer.next_deadline()).min();
            let msg = match deadline {
                Some(at) => match self.rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                    Ok(msg) => Some(msg),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match self.rx.recv() {
                    Ok(msg) => Some(msg),
                    Err(_) => break,
                },
            };

            // Handle everything already queued, so only the newest snapshot
            // of each session is pending when dispatching.
            let mut next = msg;
            while let Some(msg) = next {
                if matches!(msg, LaneMsg::Shutdown) {
                    break 'run;
                }
                self.handle(msg);
                next = self.rx.try_recv().ok();
            }
            self.dispatch_due(Instant::now());
        }
        debug!(sessions = self.sessions.len(), "render lane stopped");
    }

    fn handle(&mut self, msg: LaneMsg) {
        match msg {
            LaneMsg::Open {
                session,
                source,
                events,
                state,
            } => {
                trace!(session, width = source.width(), height = source.height(), "open session");
                self.sessions.insert(
                    session,
                    LaneSession {
                        source,
                        events,
                        state,
                        coalescer: Coalescer::new(self.min_interval),
                    },
                );
            }
            LaneMsg::Preview { session, request } => match self.sessions.get_mut(&session) {
                Some(s) => {
                    if s.coalescer.offer(request) {
                        trace!(session, seq = request.seq, "coalesced");
                    }
                    s.state.store(RenderState::Scheduled);
                }
                None => warn!(session, "preview for unknown session"),
            },
            LaneMsg::Close { session } => {
                trace!(session, "close session");
                self.sessions.remove(&session);
            }
            LaneMsg::Export { job, reply } => {
                let result = self.export(job);
                // The caller may have timed out and dropped the receiver.
                let _ = reply.try_send(result);
            }
            LaneMsg::Shutdown => {}
        }
    }

    fn dispatch_due(&mut self, now: Instant) {
        let Lane {
            context,
            allocator,
            sessions,
            ..
        } = self;
        for (&id, session) in sessions.iter_mut() {
            let Some(request) = session.coalescer.take_due(now) else {
                continue;
            };
            session.state.store(RenderState::Rendering);
            let event = match render_preview(context.as_mut(), allocator, &session.source, &request) {
                Ok(buffer) => RenderEvent::Rendered {
                    seq: request.seq,
                    buffer: Arc::new(buffer),
                },
                Err(error) => {
                    warn!(session = id, seq = request.seq, %error, "preview render failed");
                    RenderEvent::Failed {
                        seq: request.seq,
                        error,
                    }
                }
            };
            session.state.store(if session.coalescer.has_pending() {
                RenderState::Scheduled
            } else {
                RenderState::Idle
            });
            let _ = session.events.send(event);
        }
    }

    fn export(&mut self, job: ExportJob) -> RenderResult<Vec<u8>> {
        let started = Instant::now();
        let image = compose(&job.source, &job.chain, false);
        let bytes = self.context.encode(&image, &job.content_type, &job.color)?;
        debug!(
            content_type = %job.content_type,
            color = %job.color,
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "export encoded"
        );
        Ok(bytes)
    }
}

/// compose -> resolve -> allocate -> attach -> fill.
fn render_preview(
    context: &mut dyn RenderContext,
    allocator: &BufferAllocator,
    source: &Image,
    request: &RenderRequest,
) -> RenderResult<PixelBuffer> {
    let image = compose(source, &request.chain, request.show_original);
    let color = resolve(source.colorspace().as_ref());
    let mut buffer = allocator.allocate(image.width(), image.height())?;
    buffer.attach_color(color);
    context.fill(&image, &mut buffer)?;
    trace!(seq = request.seq, width = buffer.width(), height = buffer.height(), %color, "preview rendered");
    Ok(buffer)
}
