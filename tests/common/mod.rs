#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;

use cardforge::assets::fonts::FontOptions;
use cardforge::compose::scene::{GlareParams, SceneParams, VignetteParams};
use cardforge::{Catalog, CatalogProvider, ForgeConfig, MemoryFetcher, Pipeline, Rgba8, Size};

pub const LOGO_URL: &str = "mem://logo.svg";
pub const PORTRAIT_URL: &str = "mem://portrait.png";
pub const PRIMARY: Rgba8 = Rgba8::rgb(0x1F, 0x3A, 0x93);

pub fn catalog() -> Catalog {
    Catalog::from_json_str(&format!(
        r##"{{
            "institutions": [{{
                "name": "Harbor Technical College",
                "localized_name": "Harbor Tech",
                "logo_url": "{LOGO_URL}",
                "primary_color": "#1F3A93",
                "secondary_color": "#FFFFFF",
                "address": "12 Quay Street, Port Alden",
                "id_template": "HTC-24-#####",
                "kind": "public"
            }}],
            "given_names": {{"male": ["Aren", "Bastian"], "female": ["Celia", "Dara"]}},
            "surnames": ["Morrow", "Quill"],
            "programs": {{"public": ["Applied Science", "Commerce"]}},
            "session": "2024-2025",
            "portrait_url": "{PORTRAIT_URL}"
        }}"##
    ))
    .unwrap()
}

pub fn portrait_png() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(24, 30, image::Rgba([180, 140, 120, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

pub fn logo_svg() -> Vec<u8> {
    br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
        <rect width="10" height="10" fill="#C9A227"/></svg>"##
        .to_vec()
}

pub fn full_fetcher() -> MemoryFetcher {
    MemoryFetcher::new()
        .with(LOGO_URL, logo_svg())
        .with(PORTRAIT_URL, portrait_png())
}

/// Scene without any random or ramped effect, so pixels can be checked exactly.
pub fn quiet_config() -> ForgeConfig {
    let mut cfg = ForgeConfig::default();
    cfg.document.print_grain = None;
    cfg.document.scratches.count = 0;
    cfg.scene = SceneParams {
        background_noise: 0.0,
        max_angle: 0.0,
        glare: GlareParams {
            edge_alpha: 0.0,
            peak_alpha: 0.0,
        },
        vignette: VignetteParams {
            max_alpha: 0.0,
            ..VignetteParams::default()
        },
        sensor_noise: 0.0,
        ..SceneParams::default()
    };
    cfg
}

/// Only the font shipped in `tests/data/fonts`.
pub fn fixture_fonts() -> FontOptions {
    FontOptions {
        dir: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts")),
        system_fonts: false,
        sans_families: vec!["Tuffy".to_owned()],
        mono_families: vec!["Tuffy".to_owned()],
    }
}

/// Builds a pipeline over [`catalog`] that renders with [`fixture_fonts`].
pub fn pipeline(config: ForgeConfig, fetcher: MemoryFetcher) -> Pipeline {
    let config = ForgeConfig {
        fonts: fixture_fonts(),
        ..config
    };
    let provider = CatalogProvider::new(catalog(), Size::new(600, 380).unwrap()).unwrap();
    Pipeline::new(config, Box::new(provider), Box::new(fetcher)).unwrap()
}
