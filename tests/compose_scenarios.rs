use posterforge::{
    BorderSpec, CanvasSpec, CompositeLayer, Fill, LayerSize, MaskShape, PosterError, Raster,
    ShadowSpec, composite_image, create_canvas,
};

fn background(width: f64, height: f64, color: &str) -> Raster {
    create_canvas(
        &CanvasSpec { width, height },
        &Fill::Solid {
            color: color.to_string(),
        },
    )
    .unwrap()
}

#[test]
fn empty_layer_list_returns_an_identical_canvas() {
    let bg = background(64.0, 48.0, "#1a1a2e");
    let out = composite_image(&bg, &[]).unwrap();
    assert_eq!((out.width, out.height), (64, 48));
    assert_eq!(out.data, bg.data);
}

#[test]
fn circle_masked_photo_centered_on_a_dark_canvas() {
    // 400x500 background, 400x400 photo, circle mask, centered.
    let bg = background(400.0, 500.0, "#1a1a2e");
    let photo = Raster::filled(400, 400, [200, 150, 100, 255]).unwrap();
    let layer = CompositeLayer::new(photo)
        .size(LayerSize::exact(400.0, 400.0))
        .mask(MaskShape::Circle);

    let out = composite_image(&bg, &[layer]).unwrap();

    assert_eq!((out.width, out.height), (400, 500));
    // Center lands inside the circle: photo color, not background.
    let center = out.pixel(200, 250).unwrap();
    assert_ne!(center, [26, 26, 46, 255]);
    assert_eq!(center, [200, 150, 100, 255]);
    // Canvas corners stay background.
    assert_eq!(out.pixel(0, 0), Some([26, 26, 46, 255]));
    assert_eq!(out.pixel(399, 499), Some([26, 26, 46, 255]));
}

#[test]
fn border_grows_the_layer_by_twice_its_width() {
    let bg = background(100.0, 100.0, "#000000");
    let photo = Raster::filled(20, 30, [255, 0, 0, 255]).unwrap();
    let layer = CompositeLayer::new(photo).border(BorderSpec {
        width: 5.0,
        color: "#ffffff".to_string(),
    });

    let out = composite_image(&bg, &[layer]).unwrap();

    // Bordered layer is 30x40, centered at (35, 30).
    assert_eq!(out.pixel(35, 30), Some([255, 255, 255, 255]));
    assert_eq!(out.pixel(40, 35), Some([255, 0, 0, 255]));
    assert_eq!(out.pixel(34, 30), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(65, 70), Some([0, 0, 0, 255]));
}

#[test]
fn shadowed_layer_keeps_its_requested_placement() {
    let bg = background(80.0, 80.0, "#ffffff");
    let photo = Raster::filled(20, 20, [10, 10, 10, 255]).unwrap();
    let layer = CompositeLayer::new(photo).shadow(ShadowSpec {
        blur: 4.0,
        offset_x: 6.0,
        offset_y: 6.0,
        color: "#000000".to_string(),
    });

    let out = composite_image(&bg, &[layer]).unwrap();

    assert_eq!((out.width, out.height), (80, 80));
    // Image itself still covers the centered 20x20 square.
    assert_eq!(out.pixel(30, 30), Some([10, 10, 10, 255]));
    assert_eq!(out.pixel(49, 49), Some([10, 10, 10, 255]));
    // Shadow falls past the bottom-right edge of the image.
    let shadowed = out.pixel(53, 53).unwrap();
    assert!(shadowed[0] < 255);
    // Far corner stays clean.
    assert_eq!(out.pixel(2, 2), Some([255, 255, 255, 255]));
}

#[test]
fn opacity_blends_the_layer_with_the_background() {
    let bg = background(40.0, 40.0, "#000000");
    let photo = Raster::filled(40, 40, [255, 255, 255, 255]).unwrap();
    let layer = CompositeLayer::new(photo).opacity(0.5);

    let out = composite_image(&bg, &[layer]).unwrap();
    let px = out.pixel(20, 20).unwrap();
    assert!(px[0] > 100 && px[0] < 155);
    assert_eq!(px[3], 255);
}

#[test]
fn later_layers_paint_over_earlier_ones() {
    let bg = background(30.0, 30.0, "#000000");
    let lower = CompositeLayer::new(Raster::filled(30, 30, [255, 0, 0, 255]).unwrap());
    let upper = CompositeLayer::new(Raster::filled(10, 10, [0, 255, 0, 255]).unwrap());

    let out = composite_image(&bg, &[lower, upper]).unwrap();
    assert_eq!(out.pixel(15, 15), Some([0, 255, 0, 255]));
    assert_eq!(out.pixel(1, 1), Some([255, 0, 0, 255]));
}

#[test]
fn stage_validation_failures_name_the_layer() {
    let bg = background(30.0, 30.0, "#000000");
    let bad = CompositeLayer::new(Raster::filled(10, 10, [255, 0, 0, 255]).unwrap())
        .opacity(1.5);

    let err = composite_image(&bg, &[bad]).unwrap_err();
    assert!(matches!(err, PosterError::InvalidInput(_)));
    assert!(err.to_string().contains("layer 0"));
}

#[test]
fn resize_by_single_dimension_keeps_aspect_ratio() {
    let bg = background(100.0, 100.0, "#000000");
    let photo = Raster::filled(40, 20, [0, 0, 255, 255]).unwrap();
    let layer = CompositeLayer::new(photo).size(LayerSize::width(80.0));

    let out = composite_image(&bg, &[layer]).unwrap();

    // 80x40 centered at (10, 30).
    assert_eq!(out.pixel(11, 31), Some([0, 0, 255, 255]));
    assert_eq!(out.pixel(88, 68), Some([0, 0, 255, 255]));
    assert_eq!(out.pixel(11, 28), Some([0, 0, 0, 255]));
}
