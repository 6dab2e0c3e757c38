use figment::Jail;
use localrag_core::config::{expand_path, Config, Settings};
use localrag_core::{ChunkingConfig, Error};

#[test]
fn defaults_apply_without_any_config_file() {
    Jail::expect_with(|_jail| {
        let settings = Config::load().expect("load").settings().expect("settings");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.chunking, ChunkingConfig { max_size: 300, overlap: 50 });
        assert_eq!(settings.retrieval.top_k, 5);
        assert_eq!(settings.index.path, "./vector_store/vector_store");
        Ok(())
    });
}

#[test]
fn env_file_then_env_vars_override_base_file() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "test");
        jail.create_file(
            "config.toml",
            r#"
            [chunking]
            max_size = 120
            overlap = 10

            [index]
            path = "base/index"
            "#,
        )?;
        jail.create_file("config.test.toml", "[index]\npath = \"test/index\"\n")?;
        jail.set_env("APP_CHUNKING__OVERLAP", "7");
        jail.set_env("APP_RETRIEVAL__TOP_K", "3");

        let config = Config::load().expect("load");
        assert_eq!(config.env_name(), "test");
        let settings = config.settings().expect("settings");
        assert_eq!(settings.chunking, ChunkingConfig { max_size: 120, overlap: 7 });
        assert_eq!(settings.retrieval.top_k, 3);
        assert_eq!(settings.index.path, "test/index");
        let top_k: usize = config.get("retrieval.top_k").expect("get");
        assert_eq!(top_k, 3);
        Ok(())
    });
}

#[test]
fn zero_max_size_is_rejected() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_CHUNKING__MAX_SIZE", "0");
        let config = Config::load().expect("load");
        assert!(config.settings().is_err());
        Ok(())
    });
}

#[test]
fn production_refuses_fake_embeddings() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "prod");
        jail.set_env("APP_EMBEDDING__USE_FAKE", "true");
        assert!(Config::load().is_err());
        Ok(())
    });
}

#[test]
fn validate_reports_invalid_config() {
    let mut settings = Settings::default();
    settings.retrieval.top_k = 0;
    assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
}

#[test]
fn unknown_env_name_only_applies_base_layers() {
    Jail::expect_with(|jail| {
        jail.set_env("RUST_ENV", "staging");
        jail.create_file("config.toml", "[retrieval]\ntop_k = 9\n")?;
        jail.create_file("config.dev.toml", "[retrieval]\ntop_k = 1\n")?;
        let config = Config::load().expect("load");
        assert_eq!(config.env_name(), "staging");
        assert_eq!(config.settings().expect("settings").retrieval.top_k, 9);
        Ok(())
    });
}

#[test]
fn expand_path_substitutes_env_vars() {
    Jail::expect_with(|jail| {
        jail.set_env("LOCALRAG_TEST_ROOT", "/srv/rag");
        assert_eq!(expand_path("${LOCALRAG_TEST_ROOT}/index"), std::path::PathBuf::from("/srv/rag/index"));
        assert_eq!(expand_path("relative/index"), std::path::PathBuf::from("relative/index"));
        Ok(())
    });
}
