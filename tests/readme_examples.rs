//! Validates the code examples from README.md compile and behave correctly.

#[test]
fn readme_copy_on_write() {
    use vellum::{PixelBuffer, Rgba8};

    let a = PixelBuffer::new(4, 4, Rgba8::new(0, 0, 0, 255));
    let mut b = a.clone();
    assert!(a.same_object(&b));
    assert_eq!(a.ref_count(), 2);

    b.set_pixel(1, 1, Rgba8::new(255, 0, 0, 255));
    assert!(!a.same_object(&b));
    assert_eq!(a.pixel(1, 1, Rgba8::default()), Rgba8::new(0, 0, 0, 255));
    assert_eq!(b.pixel(1, 1, Rgba8::default()), Rgba8::new(255, 0, 0, 255));
}

#[test]
fn readme_thumbnail() {
    use vellum::scale::{box_filter, resample};
    use vellum::{Rgba8, Rgba8Map, ScaleDetails, ScaleMode, Threading};

    let photo = Rgba8Map::new(640, 480, Rgba8::new(90, 120, 200, 255));
    let details = ScaleDetails::new(ScaleMode::PadCenter, Rgba8::new(0, 0, 0, 0));
    let thumb = resample(&photo, 128, 128, box_filter, &details, Threading::Auto);

    assert_eq!((thumb.width(), thumb.height()), (128, 128));
    assert_eq!(thumb.pixel(64, 64, Rgba8::default()), Rgba8::new(90, 120, 200, 255));
    // Letterbox bands above and below the picture.
    assert!(thumb.extract_row(0).iter().all(|&p| p == Rgba8::new(0, 0, 0, 0)));
    assert_eq!(thumb.pixel(0, 0, Rgba8::default()), Rgba8::new(0, 0, 0, 0));
    assert_eq!(thumb.pixel(64, 2, Rgba8::default()), Rgba8::new(0, 0, 0, 0));
    assert_eq!(thumb.pixel(64, 125, Rgba8::default()), Rgba8::new(0, 0, 0, 0));
}

#[test]
fn readme_custom_filter() {
    use vellum::scale::{SourceView, resample};
    use vellum::{GrayMap, ScaleDetails, Threading};

    // Nearest-neighbour: sample the rectangle's centre.
    fn nearest(src: &SourceView<'_, u8>, x1: f64, y1: f64, x2: f64, y2: f64) -> u8 {
        src.pixel(((x1 + x2) / 2.0) as isize, ((y1 + y2) / 2.0) as isize)
    }

    let mask = GrayMap::from_slice(2, 2, &[0, 255, 255, 0]);
    let big = resample(&mask, 4, 4, nearest, &ScaleDetails::default(), Threading::Sequential);
    assert_eq!(big.extract_row(0), [0, 0, 255, 255]);
    assert_eq!(big.extract_row(3), [255, 255, 0, 0]);
}

#[test]
fn readme_rgbe() {
    use vellum::rgbe::{decode_rgbe, encode_rgbe};
    use vellum::{RgbaF32, RgbaF32Map};

    let hdr = RgbaF32Map::new(8, 8, RgbaF32::new(12.0, 6.0, 3.0, 1.0));
    let packed = encode_rgbe(&hdr);
    let back = decode_rgbe(&packed);

    let px = back.pixel(3, 3, RgbaF32::default());
    assert!((px.r - 12.0).abs() / 12.0 < 3.0 / 256.0);
    assert_eq!(px.a, 1.0);
}

#[test]
fn readme_power_of_two() {
    use vellum::{GrayMap, PixelBuffer};

    let tile: GrayMap = PixelBuffer::new(100, 60, 7);
    let padded = tile.pad_to_power_of_two();
    assert_eq!((padded.width(), padded.height()), (128, 128));
    assert_eq!(padded.fw(), 100.0 / 128.0);
    assert_eq!(padded.fh(), 60.0 / 128.0);
    // Edge pixels are replicated into the padding.
    assert_eq!(padded.pixel(127, 127, 0), 7);
}

#[cfg(feature = "json")]
#[test]
fn readme_json() {
    use vellum::serial::{from_json, to_json};
    use vellum::{Diagnostics, GrayMap};

    let mask = GrayMap::from_slice(2, 1, &[0, 255]);
    let text = to_json(&mask, None);
    assert_eq!(text, r#"{"w":2,"h":1,"data":"AP8="}"#);

    let mut diag = Diagnostics::new();
    let back: GrayMap = from_json(&text, Some(&mut diag));
    assert_eq!(back, mask);
    assert!(diag.is_empty());
}
