use std::path::PathBuf;

#[test]
fn cli_writes_png_with_placeholder_portrait() {
    let dir = PathBuf::from("target").join("cli_smoke");
    std::fs::create_dir_all(&dir).unwrap();

    let catalog_path = dir.join("catalog.json");
    let config_path = dir.join("config.json");
    // No extension on --out; the PNG format supplies it.
    let out_arg_path = dir.join("card");
    let out_path = dir.join("card.png");
    let _ = std::fs::remove_file(&out_path);

    std::fs::write(
        &catalog_path,
        r##"{
            "institutions": [{
                "name": "Marlow County Academy",
                "primary_color": "#1E5B3A",
                "secondary_color": "#F1C40F",
                "address": "Old Mill Road, Marlow",
                "id_template": "MCA###-##",
                "kind": "public"
            }],
            "given_names": {"male": ["Galen"], "female": ["Juna"]},
            "surnames": ["Everly"],
            "programs": {"public": ["Humanities"]},
            "session": "2024-2025",
            "portrait_url": "target/cli_smoke/missing-portrait.png"
        }"##,
    )
    .unwrap();

    let font_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/fonts");
    let config = serde_json::json!({
        "fonts": {
            "dir": font_dir,
            "system_fonts": false,
            "sans_families": ["Tuffy"],
            "mono_families": ["Tuffy"]
        }
    });
    std::fs::write(&config_path, config.to_string()).unwrap();

    let exe = std::env::var_os("CARGO_BIN_EXE_cardforge")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "cardforge.exe"
            } else {
                "cardforge"
            });
            p
        });

    let catalog_arg = catalog_path.to_string_lossy().to_string();
    let config_arg = config_path.to_string_lossy().to_string();
    let out_arg = out_arg_path.to_string_lossy().to_string();

    let status = std::process::Command::new(exe)
        .args([
            "--catalog",
            catalog_arg.as_str(),
            "--config",
            config_arg.as_str(),
            "--seed",
            "7",
            "--format",
            "png",
            "--log",
            "warn",
            "--out",
        ])
        .arg(out_arg.as_str())
        .status()
        .unwrap();

    assert!(status.success());
    let img = image::open(&out_path).unwrap();
    assert_eq!((img.width(), img.height()), (780, 494));
}
