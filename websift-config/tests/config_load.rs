use websift_config::{LlmConfig, WebsiftConfigLoader};

#[test]
fn loads_openai_provider_with_env_token() {
    temp_env::with_var("WEBSIFT_TEST_API_TOKEN", Some("injected-from-env"), || {
        let config = WebsiftConfigLoader::new()
            .with_yaml_str(
                r#"
version: "1"
llm:
  provider: "openai"
  model: "gpt-4o-mini"
  auth_token: "${WEBSIFT_TEST_API_TOKEN}"
retrieval:
  pool_size: 3
  page_timeout_ms: 1000
"#,
            )
            .load()
            .expect("valid configuration");

        assert_eq!(config.version.as_deref(), Some("1"));
        match &config.llm {
            LlmConfig::Openai {
                model,
                auth_token,
                endpoint,
                ..
            } => {
                assert_eq!(model, "gpt-4o-mini");
                assert_eq!(auth_token, "injected-from-env");
                assert_eq!(endpoint, "https://api.openai.com/v1");
            }
            _ => panic!("expected OpenAI configuration"),
        }
    });
}

#[test]
fn loads_ollama_provider_with_default_endpoint() {
    let config = WebsiftConfigLoader::new()
        .with_yaml_str(
            r#"
llm:
  provider: "ollama"
  model: "llama3.2:3b"
"#,
        )
        .load()
        .expect("valid configuration");

    match &config.llm {
        LlmConfig::Ollama {
            model, endpoint, ..
        } => {
            assert_eq!(model, "llama3.2:3b");
            assert_eq!(endpoint, "http://localhost:11434");
        }
        _ => panic!("expected Ollama configuration"),
    }
}

#[test]
fn missing_retrieval_block_resolves_to_defaults() {
    let config = WebsiftConfigLoader::new()
        .with_yaml_str(
            r#"
llm:
  provider: "ollama"
  model: "llama3.2:3b"
"#,
        )
        .load()
        .expect("valid configuration");

    let retrieval = config.retrieval.resolve();
    assert_eq!(retrieval.pool_size, 3);
    assert_eq!(retrieval.search_timeout_ms, 10_000);
    assert_eq!(retrieval.chromedriver_url, "http://localhost:9515");
}
