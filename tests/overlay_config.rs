use std::sync::Mutex;

use tempfile::NamedTempFile;

use vision_overlay::config::OverlayConfig;
use vision_overlay::Modality;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "OVERLAY_CONFIG",
        "OVERLAY_SOURCE",
        "OVERLAY_MOTION_THRESHOLD",
        "OVERLAY_MOTION_SENSITIVITY",
        "OVERLAY_DISABLE",
        "OVERLAY_SNAPSHOT_DIR",
        "OVERLAY_FONT",
    ] {
        std::env::remove_var(key);
    }
}

fn temp_config(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp config");
    std::io::Write::write_all(&mut file, contents.as_bytes()).expect("write config");
    file
}

#[test]
fn loads_json_config_with_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = temp_config(
        ".json",
        r#"{
            "capture": { "source": "dir:///var/lib/frames", "width": 640, "height": 480, "fps": 15 },
            "modalities": { "face": false },
            "motion": { "threshold": 40, "sensitivity": 0.05, "step": 8 },
            "providers": { "hands": "stub", "pose": "none" },
            "output": { "snapshot_every": 10, "font": "/usr/share/fonts/overlay.ttf" }
        }"#,
    );
    std::env::set_var("OVERLAY_CONFIG", file.path());
    std::env::set_var("OVERLAY_MOTION_THRESHOLD", "25");
    std::env::set_var("OVERLAY_DISABLE", "hands, motion");
    std::env::set_var("OVERLAY_SNAPSHOT_DIR", "/tmp/overlay-snapshots");

    let cfg = OverlayConfig::load().expect("load config");

    assert_eq!(cfg.capture.url, "dir:///var/lib/frames");
    assert_eq!((cfg.capture.width, cfg.capture.height), (640, 480));
    assert_eq!(cfg.capture.fps, 15);
    assert!(!cfg.render.hands);
    assert!(cfg.render.pose);
    assert!(!cfg.render.face);
    assert!(!cfg.render.motion);
    assert_eq!(cfg.motion_config().threshold, 25);
    assert_eq!(cfg.motion.sensitivity, 0.05);
    assert_eq!(cfg.motion.step, 8);
    assert_eq!(cfg.providers.spec(Modality::Pose), "none");
    assert_eq!(cfg.providers.spec(Modality::Face), "stub");
    assert_eq!(cfg.output.snapshot_every, 10);
    assert_eq!(
        cfg.output.font.as_deref(),
        Some(std::path::Path::new("/usr/share/fonts/overlay.ttf"))
    );
    assert_eq!(
        cfg.output.snapshot_dir.as_deref(),
        Some(std::path::Path::new("/tmp/overlay-snapshots"))
    );

    clear_env();
}

#[test]
fn loads_toml_config_by_extension() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = temp_config(
        ".toml",
        r#"
            [capture]
            source = "stub://bench"
            fps = 60

            [motion]
            sensitivity = 0.1
        "#,
    );
    std::env::set_var("OVERLAY_CONFIG", file.path());
    std::env::set_var("OVERLAY_SOURCE", "stub://override");
    std::env::set_var("OVERLAY_FONT", "/opt/fonts/labels.otf");

    let cfg = OverlayConfig::load().expect("load config");
    assert_eq!(cfg.capture.url, "stub://override");
    assert_eq!(cfg.capture.fps, 60);
    assert_eq!((cfg.capture.width, cfg.capture.height), (1280, 720));
    assert_eq!(cfg.motion.sensitivity, 0.1);
    assert_eq!(cfg.motion_config().threshold, 30);
    assert_eq!(
        cfg.output.font.as_deref(),
        Some(std::path::Path::new("/opt/fonts/labels.otf"))
    );

    clear_env();
}

#[test]
fn defaults_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = OverlayConfig::load().expect("load defaults");
    assert_eq!(cfg.capture.url, "stub://camera");
    assert!(cfg.render.hands && cfg.render.pose && cfg.render.face && cfg.render.motion);
    assert_eq!(cfg.motion.step, 4);
    assert!(cfg.output.snapshot_dir.is_none());
    assert!(cfg.output.font.is_none());

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("OVERLAY_MOTION_THRESHOLD", "300");
    assert!(OverlayConfig::load().is_err());
    clear_env();

    std::env::set_var("OVERLAY_MOTION_SENSITIVITY", "-0.1");
    assert!(OverlayConfig::load().is_err());
    clear_env();

    std::env::set_var("OVERLAY_DISABLE", "eyes");
    assert!(OverlayConfig::load().is_err());
    clear_env();

    let file = temp_config(".json", r#"{ "capture": { "width": 0 } }"#);
    std::env::set_var("OVERLAY_CONFIG", file.path());
    assert!(OverlayConfig::load().is_err());
    clear_env();

    let file = temp_config(".json", "{ not json");
    std::env::set_var("OVERLAY_CONFIG", file.path());
    assert!(OverlayConfig::load().is_err());

    clear_env();
}
