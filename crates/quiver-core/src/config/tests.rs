use std::io::Write;
use std::path::{Path, PathBuf};

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 8] = [
    "QUIVER_CATALOG_DIR",
    "QUIVER_CATALOG_MODE",
    "QUIVER_PROJECT_DIR",
    "QUIVER_GLOBAL_DIR",
    "QUIVER_SOURCES_FILE",
    "QUIVER_CLONE_DIR",
    "QUIVER_GIT_PROGRAM",
    "QUIVER_RESERVED_WORDS",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.catalog.dir, "templates");
    assert_eq!(config.catalog.mode, CatalogModeSetting::Auto);
    assert_eq!(config.scopes.project_dir, ".claude");
    assert!(config.scopes.global_dir.is_empty());
    assert_eq!(config.skills.reserved_words, vec!["anthropic", "claude"]);
    assert_eq!(config.sources.git_program, "git");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn load_missing_file_uses_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load(&dir.path().join("nope.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[catalog]
dir = "my-templates"
mode = "disk"

[scopes]
project_dir = ".agents"
global_dir = "/opt/agents"

[skills]
reserved_words = ["acme"]

[sources]
clone_dir = "/var/cache/quiver"
git_program = "/usr/local/bin/git"
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.catalog.dir, "my-templates");
    assert_eq!(config.catalog.mode, CatalogModeSetting::Disk);
    assert_eq!(config.scopes.project_dir, ".agents");
    assert_eq!(config.scopes.global_dir, "/opt/agents");
    assert_eq!(config.skills.reserved_words, vec!["acme"]);
    assert_eq!(config.sources.clone_dir, "/var/cache/quiver");
    assert_eq!(config.sources.git_program, "/usr/local/bin/git");
    assert!(config.sources.file.is_empty());
}

#[test]
#[serial]
fn partial_sections_keep_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.toml");
    std::fs::write(&path, "[scopes]\nglobal_dir = \"/g\"\n").unwrap();
    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.scopes.project_dir, ".claude");
    assert_eq!(config.scopes.global_dir, "/g");
    assert_eq!(config.catalog.dir, "templates");
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[catalog\nmode = ").unwrap();
    clear_env();
    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    unsafe {
        std::env::set_var("QUIVER_CATALOG_DIR", "/srv/templates");
        std::env::set_var("QUIVER_CATALOG_MODE", "Embedded");
        std::env::set_var("QUIVER_PROJECT_DIR", ".local");
        std::env::set_var("QUIVER_GLOBAL_DIR", "/g");
        std::env::set_var("QUIVER_SOURCES_FILE", "/s.json");
        std::env::set_var("QUIVER_CLONE_DIR", "/c");
        std::env::set_var("QUIVER_GIT_PROGRAM", "git2");
        std::env::set_var("QUIVER_RESERVED_WORDS", " Acme, ,widget ");
    }

    let mut config = Config::default();
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.catalog.dir, "/srv/templates");
    assert_eq!(config.catalog.mode, CatalogModeSetting::Embedded);
    assert_eq!(config.scopes.project_dir, ".local");
    assert_eq!(config.scopes.global_dir, "/g");
    assert_eq!(config.sources.file, "/s.json");
    assert_eq!(config.sources.clone_dir, "/c");
    assert_eq!(config.sources.git_program, "git2");
    assert_eq!(config.skills.reserved_words, vec!["acme", "widget"]);
}

#[test]
#[serial]
fn invalid_env_mode_is_ignored() {
    clear_env();
    unsafe { std::env::set_var("QUIVER_CATALOG_MODE", "cloud") };
    let mut config = Config::default();
    config.apply_env_overrides();
    clear_env();
    assert_eq!(config.catalog.mode, CatalogModeSetting::Auto);
}

#[test]
fn validate_rejects_bad_settings() {
    let mut config = Config::default();
    config.sources.git_program = "  ".into();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.catalog.mode = CatalogModeSetting::Disk;
    config.catalog.dir = String::new();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.skills.reserved_words = vec!["Claude".into()];
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.scopes.project_dir = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn catalog_mode_selection() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    assert_eq!(config.catalog_mode(dir.path()).unwrap(), CatalogMode::Embedded);

    std::fs::create_dir_all(dir.path().join("templates/skills")).unwrap();
    std::fs::write(dir.path().join("templates/skills/index.json"), "{}").unwrap();
    assert_eq!(
        config.catalog_mode(dir.path()).unwrap(),
        CatalogMode::Disk(dir.path().join("templates"))
    );

    config.catalog.mode = CatalogModeSetting::Embedded;
    assert_eq!(config.catalog_mode(dir.path()).unwrap(), CatalogMode::Embedded);

    config.catalog.mode = CatalogModeSetting::Disk;
    config.catalog.dir = "missing".into();
    assert!(config.catalog_mode(dir.path()).is_err());
}

#[test]
fn unrelated_templates_dir_keeps_embedded_catalog() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("templates/emails")).unwrap();
    std::fs::write(dir.path().join("templates/emails/welcome.html"), "<p>hi</p>").unwrap();
    std::fs::create_dir_all(dir.path().join("templates/personas")).unwrap();

    let mut config = Config::default();
    assert_eq!(config.catalog_mode(dir.path()).unwrap(), CatalogMode::Embedded);

    config.catalog.mode = CatalogModeSetting::Disk;
    assert_eq!(
        config.catalog_mode(dir.path()).unwrap(),
        CatalogMode::Disk(dir.path().join("templates"))
    );
}

#[test]
fn scope_and_source_paths() {
    let mut config = Config::default();
    config.scopes.global_dir = "/home/u/.claude".into();
    assert_eq!(config.project_root(Path::new("/work")), PathBuf::from("/work/.claude"));
    assert_eq!(config.global_root().unwrap(), PathBuf::from("/home/u/.claude"));

    let disk = CatalogMode::Disk(PathBuf::from("/work/templates"));
    assert_eq!(
        config.sources_file(&disk).unwrap(),
        PathBuf::from("/work/templates/sources.json")
    );
    config.sources.file = "/etc/quiver/sources.json".into();
    assert_eq!(
        config.sources_file(&CatalogMode::Embedded).unwrap(),
        PathBuf::from("/etc/quiver/sources.json")
    );

    config.sources.clone_dir = "/cache".into();
    assert_eq!(config.clone_dir().unwrap(), PathBuf::from("/cache"));
}

#[test]
fn absolute_project_dir_is_kept() {
    let mut config = Config::default();
    config.scopes.project_dir = "/abs/.claude".into();
    assert_eq!(config.project_root(Path::new("/work")), PathBuf::from("/abs/.claude"));
}
