//! Preview pipeline tests for hdredit-render.

use hdredit_core::{ColorSpaceHint, Image};
use hdredit_io::encode::quantize;
use hdredit_io::{ContentType, HdrColorInfo};
use hdredit_ops::{AdjustmentChain, AdjustmentId};
use hdredit_render::{
    CpuContext, EditedImage, PixelBuffer, RenderContext, RenderError, RenderResult, RenderState, Renderer,
    RendererConfig,
};
use hdredit_transfer::TransferFunction;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

const WAIT: Duration = Duration::from_secs(10);

/// CPU context that counts fills, can be told to fail and can be slowed down.
#[derive(Clone, Default)]
struct Counting {
    fills: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
    delay: Duration,
}

impl RenderContext for Counting {
    fn name(&self) -> &str {
        "counting"
    }

    fn fill(&mut self, image: &Image, buffer: &mut PixelBuffer) -> RenderResult<()> {
        self.fills.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(RenderError::Render("device lost".into()));
        }
        CpuContext.fill(image, buffer)
    }

    fn encode(&mut self, image: &Image, content_type: &ContentType, color: &HdrColorInfo) -> RenderResult<Vec<u8>> {
        CpuContext.encode(image, content_type, color)
    }
}

fn counting_renderer(config: RendererConfig) -> (Renderer, Counting) {
    slow_renderer(config, Duration::ZERO)
}

fn slow_renderer(config: RendererConfig, delay: Duration) -> (Renderer, Counting) {
    let ctx = Counting {
        delay,
        ..Counting::default()
    };
    let renderer = Renderer::new(Box::new(ctx.clone()), config).unwrap();
    (renderer, ctx)
}

/// 10-bit luma a gray working-space value lands on.
fn gray_luma(v: f32, tf: TransferFunction) -> u16 {
    quantize(tf.encode(v), 10)
}

fn assert_uniform_luma(buf: &PixelBuffer, expect: u16) {
    for y in 0..buf.height() {
        for x in 0..buf.width() {
            let got = buf.luma_at(x, y);
            assert!(got.abs_diff(expect) <= 1, "({x}, {y}): {got} vs {expect}");
        }
    }
}

#[test]
fn test_first_preview_is_rendered() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let mut edit = EditedImage::new(&renderer, Image::filled(8, 6, [0.25, 0.25, 0.25, 1.0]), AdjustmentChain::new());
    assert!(edit.wait_for_render(WAIT));
    assert_eq!(edit.render_state(), RenderState::Idle);

    let buf = edit.published().unwrap();
    assert_eq!((buf.width(), buf.height()), (8, 6));
    assert_eq!(buf.color(), Some(HdrColorInfo::default()));
    assert_uniform_luma(buf, gray_luma(0.25, TransferFunction::Pq));
}

#[test]
fn test_exposure_doubles_gray() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let mut edit = EditedImage::new(&renderer, Image::filled(4, 4, [0.3, 0.3, 0.3, 1.0]), AdjustmentChain::new());
    edit.set_adjustment(AdjustmentId::Exposure, Some(true), Some(1.0));
    assert!(edit.wait_for_render(WAIT));
    assert_uniform_luma(edit.published().unwrap(), gray_luma(0.6, TransferFunction::Pq));
}

#[test]
fn test_show_original_bypasses_chain() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let mut edit = EditedImage::new(&renderer, Image::filled(4, 4, [0.3, 0.3, 0.3, 1.0]), AdjustmentChain::new());
    edit.set_adjustment(AdjustmentId::Exposure, Some(true), Some(-2.0));
    edit.set_show_original(true);
    assert!(edit.wait_for_render(WAIT));
    assert_uniform_luma(edit.published().unwrap(), gray_luma(0.3, TransferFunction::Pq));
    // The chain itself is untouched by the bypass.
    assert!(edit.chain().get(AdjustmentId::Exposure).enabled);
}

#[test]
fn test_hlg_source_previews_in_hlg() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let source = Image::filled(2, 2, [0.5, 0.5, 0.5, 1.0]).with_colorspace(Some(ColorSpaceHint::Bt2100Hlg));
    let mut edit = EditedImage::new(&renderer, source, AdjustmentChain::new());
    assert!(edit.wait_for_render(WAIT));
    let buf = edit.published().unwrap();
    assert_eq!(buf.color().unwrap().transfer, TransferFunction::Hlg);
    assert_uniform_luma(buf, gray_luma(0.5, TransferFunction::Hlg));
}

#[test]
fn test_bursts_are_coalesced() {
    let config = RendererConfig::default().with_min_interval(Duration::from_millis(500));
    let (renderer, ctx) = counting_renderer(config);
    let mut edit = EditedImage::new(&renderer, Image::filled(4, 4, [0.1, 0.1, 0.1, 1.0]), AdjustmentChain::new());
    assert!(edit.wait_for_render(WAIT));
    assert_eq!(ctx.fills.load(Ordering::SeqCst), 1);

    let edits = 20;
    for i in 1..=edits {
        edit.set_adjustment(AdjustmentId::Exposure, Some(true), Some(i as f64 * 0.05));
    }
    assert!(edit.wait_for_render(WAIT));

    let renders = ctx.fills.load(Ordering::SeqCst) - 1;
    assert!(renders >= 1 && renders < edits, "{renders} renders for {edits} edits");
    // The trailing render carries the last snapshot: exposure +1.
    assert_uniform_luma(edit.published().unwrap(), gray_luma(0.2, TransferFunction::Pq));
}

#[test]
fn test_slow_renders_coalesce_at_default_interval() {
    // Each fill outlasts the default 25 ms spacing.
    let (renderer, ctx) = slow_renderer(RendererConfig::default(), Duration::from_millis(60));
    let mut edit = EditedImage::new(&renderer, Image::filled(4, 4, [0.1, 0.1, 0.1, 1.0]), AdjustmentChain::new());
    assert!(edit.wait_for_render(WAIT));
    assert_eq!(ctx.fills.load(Ordering::SeqCst), 1);

    let edits = 10;
    for i in 1..=edits {
        edit.set_adjustment(AdjustmentId::Exposure, Some(true), Some(i as f64 * 0.1));
    }
    assert!(edit.wait_for_render(WAIT));

    let renders = ctx.fills.load(Ordering::SeqCst) - 1;
    assert!(renders >= 1 && renders < edits, "{renders} renders for {edits} edits");
    assert_uniform_luma(edit.published().unwrap(), gray_luma(0.2, TransferFunction::Pq));
}

#[test]
fn test_render_state_tracks_unsettled_edits() {
    let (renderer, _ctx) = slow_renderer(RendererConfig::default(), Duration::from_millis(30));
    let mut edit = EditedImage::new(&renderer, Image::filled(4, 4, [0.3, 0.3, 0.3, 1.0]), AdjustmentChain::new());
    for v in [0.6, 0.8, 1.1, 1.4] {
        edit.set_value(AdjustmentId::Contrast, v);
        assert_ne!(edit.render_state(), RenderState::Idle);
    }
    assert!(edit.wait_for_render(WAIT));
    assert_eq!(edit.render_state(), RenderState::Idle);
}

#[test]
fn test_failed_render_keeps_previous_buffer() {
    let (renderer, ctx) = counting_renderer(RendererConfig::default());
    let mut edit = EditedImage::new(&renderer, Image::filled(4, 4, [0.5, 0.5, 0.5, 1.0]), AdjustmentChain::new());
    assert!(edit.wait_for_render(WAIT));
    let before = Arc::clone(edit.published().unwrap());

    ctx.fail.store(true, Ordering::SeqCst);
    edit.set_adjustment(AdjustmentId::Saturation, Some(true), Some(0.0));
    assert!(edit.wait_for_render(WAIT));

    assert!(matches!(edit.last_error(), Some(RenderError::Render(_))));
    assert!(Arc::ptr_eq(edit.published().unwrap(), &before));

    ctx.fail.store(false, Ordering::SeqCst);
    edit.set_adjustment(AdjustmentId::Saturation, Some(true), Some(0.5));
    assert!(edit.wait_for_render(WAIT));
    assert!(edit.last_error().is_none());
    assert!(!Arc::ptr_eq(edit.published().unwrap(), &before));
}

#[test]
fn test_zero_area_source_fails_allocation() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let mut edit = EditedImage::new(&renderer, Image::new(0, 0), AdjustmentChain::new());
    assert!(edit.wait_for_render(WAIT));
    assert!(matches!(edit.last_error(), Some(RenderError::Allocation(_))));
    assert!(edit.published().is_none());
}

#[test]
fn test_buffer_limit_fails_allocation() {
    let config = RendererConfig::default().with_max_buffer_pixels(16);
    let renderer = Renderer::cpu(config).unwrap();
    let mut edit = EditedImage::new(&renderer, Image::filled(5, 5, [1.0; 4]), AdjustmentChain::new());
    assert!(edit.wait_for_render(WAIT));
    assert!(matches!(edit.last_error(), Some(RenderError::Allocation(_))));
}

#[test]
fn test_sessions_share_one_lane() {
    let (renderer, ctx) = counting_renderer(RendererConfig::default());
    let mut a = EditedImage::new(&renderer, Image::filled(2, 2, [0.1, 0.1, 0.1, 1.0]), AdjustmentChain::new());
    let mut b = EditedImage::new(&renderer, Image::filled(3, 3, [0.9, 0.9, 0.9, 1.0]), AdjustmentChain::new());
    assert!(a.wait_for_render(WAIT));
    assert!(b.wait_for_render(WAIT));
    assert_eq!(a.published().unwrap().width(), 2);
    assert_eq!(b.published().unwrap().width(), 3);
    assert_eq!(ctx.fills.load(Ordering::SeqCst), 2);
}

#[test]
fn test_dropped_renderer_closes_sessions() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let mut edit = EditedImage::new(&renderer, Image::filled(2, 2, [0.5; 4]), AdjustmentChain::new());
    assert!(edit.wait_for_render(WAIT));
    drop(renderer);

    edit.set_value(AdjustmentId::Contrast, 1.2);
    assert_eq!(edit.last_error(), Some(&RenderError::LaneClosed));
    assert!(!edit.wait_for_render(Duration::from_millis(100)));
    // The last good preview survives.
    assert!(edit.published().is_some());
}
