//! Export tests for hdredit-render.

use approx::assert_relative_eq;
use hdredit_core::{ColorSpaceHint, Image};
use hdredit_io::{Asset, ContentType, HdrColorInfo, decode_bytes, load_path, persist};
use hdredit_ops::{AdjustmentChain, AdjustmentId};
use hdredit_render::{
    CpuContext, EditedImage, PixelBuffer, RenderContext, RenderError, RenderResult, Renderer, RendererConfig,
};
use hdredit_transfer::TransferFunction;
use std::time::Duration;

fn session(renderer: &Renderer, rgba: [f32; 4]) -> EditedImage {
    EditedImage::new(renderer, Image::filled(6, 4, rgba), AdjustmentChain::new())
}

#[test]
fn test_png_bytes_fall_back_to_pq() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let edit = session(&renderer, [0.4, 0.4, 0.4, 1.0]);

    let out = edit.encode_to_bytes(&ContentType::Png, None).unwrap();
    assert_eq!(out.content_type, ContentType::Png);
    assert_eq!(out.color, HdrColorInfo::default());
    assert_eq!(out.color.transfer, TransferFunction::Pq);

    let back = decode_bytes(&out.bytes).unwrap();
    assert_eq!(back.colorspace(), Some(ColorSpaceHint::Bt2100Pq));
    assert_eq!((back.width(), back.height()), (6, 4));
}

#[test]
fn test_png_bytes_follow_hlg_hint() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let edit = session(&renderer, [0.4, 0.4, 0.4, 1.0]);
    let out = edit.encode_to_bytes(&ContentType::Png, Some(ColorSpaceHint::Bt2100Hlg)).unwrap();
    assert_eq!(out.color.transfer, TransferFunction::Hlg);
    assert_eq!(decode_bytes(&out.bytes).unwrap().colorspace(), Some(ColorSpaceHint::Bt2100Hlg));
}

#[test]
fn test_export_applies_chain_even_when_bypassed() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let mut edit = session(&renderer, [0.25, 0.25, 0.25, 1.0]);
    edit.set_adjustment(AdjustmentId::Exposure, Some(true), Some(2.0));
    edit.set_show_original(true);

    let out = edit.encode_to_bytes(&ContentType::Png, None).unwrap();
    let back = decode_bytes(&out.bytes).unwrap();
    assert_relative_eq!(back.pixel(3, 2)[1], 1.0, max_relative = 2e-3);
}

#[test]
fn test_unsupported_type_is_none() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let edit = session(&renderer, [0.5; 4]);
    let tiff = ContentType::parse("public.tiff");
    assert!(edit.encode_to_bytes(&tiff, None).is_none());
    assert!(matches!(
        edit.try_encode_to_bytes(&tiff, None),
        Err(RenderError::UnsupportedContentType(_))
    ));
}

#[test]
fn test_write_png_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edited.png");
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let mut edit = session(&renderer, [0.2, 0.2, 0.2, 1.0]);
    edit.set_adjustment(AdjustmentId::Contrast, Some(true), Some(1.5));

    assert!(edit.write_to_file(&path, None));
    let back = load_path(&path).unwrap();
    // (0.2 - 0.18) * 1.5 + 0.18
    assert_relative_eq!(back.pixel(0, 0)[0], 0.21, max_relative = 2e-3);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_unsupported_file_type_leaves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edited.tiff");
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let edit = session(&renderer, [0.5; 4]);

    assert!(!edit.write_to_file(&path, Some(ContentType::Other("public.tiff".into()))));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_unknown_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edited.jpg");
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let edit = session(&renderer, [0.5; 4]);

    let err = edit.try_write_to_file(&path, None).unwrap_err();
    assert!(matches!(err, RenderError::UnsupportedContentType(_)), "{err:?}");
    assert!(!edit.write_to_file(&path, None));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[cfg(not(feature = "heif"))]
#[test]
fn test_heif_without_feature_fails_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    // No extension: falls back to HEIF.
    let path = dir.path().join("edited");
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let edit = session(&renderer, [0.5; 4]);

    assert!(!edit.write_to_file(&path, None));
    assert!(!path.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    assert!(edit.editing_output().is_none());
}

#[cfg(feature = "heif")]
#[test]
fn test_editing_output_carries_edits_and_heif() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let mut edit = session(&renderer, [0.5; 4]);
    edit.set_value(AdjustmentId::Sepia, 0.4);
    let out = edit.editing_output().unwrap();
    assert_eq!(persist::load(&out.adjustments), Some(*edit.chain()));
    assert_eq!(out.render.content_type, ContentType::Heif);
    assert!(hdredit_io::heif::is_heif(&out.render.bytes));
}

#[test]
fn test_open_restores_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("beach.png");
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    {
        let edit = session(&renderer, [0.3, 0.3, 0.3, 1.0]);
        assert!(edit.write_to_file(&path, None));
    }

    let mut chain = AdjustmentChain::new();
    chain.set(AdjustmentId::Saturation, Some(true), Some(0.2));
    let blob = persist::save(&chain).unwrap();

    let asset = Asset::from_path(&path);
    let edit = EditedImage::open(&renderer, &asset, Some(&blob)).unwrap();
    assert_eq!(edit.chain(), &chain);
    assert_eq!(edit.default_filename(), Some("beach"));
    assert_eq!(edit.source().colorspace(), Some(ColorSpaceHint::Bt2100Pq));

    let mut foreign = blob.clone();
    foreign.format_version = "9.9".into();
    let edit = EditedImage::open(&renderer, &asset, Some(&foreign)).unwrap();
    assert!(edit.chain().is_identity());
}

/// Context whose encoder never finishes in time.
struct Stalled;

impl RenderContext for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    fn fill(&mut self, image: &Image, buffer: &mut PixelBuffer) -> RenderResult<()> {
        CpuContext.fill(image, buffer)
    }

    fn encode(&mut self, _: &Image, _: &ContentType, _: &HdrColorInfo) -> RenderResult<Vec<u8>> {
        std::thread::sleep(Duration::from_millis(300));
        Ok(Vec::new())
    }
}

#[test]
fn test_export_deadline() {
    let config = RendererConfig::default().with_render_deadline(Duration::from_millis(50));
    let renderer = Renderer::new(Box::new(Stalled), config).unwrap();
    let edit = session(&renderer, [0.5; 4]);
    assert_eq!(
        edit.try_encode_to_bytes(&ContentType::Png, None),
        Err(RenderError::Timeout(Duration::from_millis(50)))
    );
}

#[test]
fn test_export_after_shutdown() {
    let renderer = Renderer::cpu(RendererConfig::default()).unwrap();
    let edit = session(&renderer, [0.5; 4]);
    drop(renderer);
    assert_eq!(
        edit.try_encode_to_bytes(&ContentType::Png, None),
        Err(RenderError::LaneClosed)
    );
}
