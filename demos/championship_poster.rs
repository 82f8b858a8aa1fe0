use posterforge::{
    FontRegistry, PosterInputs, Raster, RenderOptions, render_poster, template_from_json,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let s = include_str!("../tests/data/championship.json");
    let template = template_from_json(s)?;

    let fonts = FontRegistry::new();
    fonts.init_bundled_default();

    let photo = Raster::filled(800, 800, [210, 180, 140, 255])?;
    let inputs = PosterInputs::new()
        .photo(photo)
        .text_override(1, "2026 NATIONAL FINALS");

    let poster = render_poster(&template, &inputs, &fonts, &RenderOptions::default())?;
    std::fs::write("championship.png", poster.to_png()?)?;
    println!("championship.png: {}x{}", poster.width, poster.height);

    Ok(())
}
