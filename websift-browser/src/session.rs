use crate::page::SessionPage;
use crate::stealth::{build_launch_arguments, ClientIdentity};
use anyhow::{Context, Result as AnyResult};
use fantoccini::ClientBuilder;
use rand::Rng;
use serde_json::json;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use webdriver::capabilities::Capabilities;
use websift_common::{RetrievalConfig, Result, WebsiftError};

/// Rendering engines, in launch preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Chromium,
    Firefox,
}

impl Engine {
    pub fn label(&self) -> &'static str {
        match self {
            Engine::Chromium => "chromium",
            Engine::Firefox => "firefox",
        }
    }
}

/// An isolated, persistent rendering context bound 1:1 to a private
/// storage directory.
///
/// The session is exclusively owned by whichever component opened it and
/// must be closed (which also removes its storage) before the retrieval
/// finishes. Sessions are never shared across concurrent retrievals.
pub struct Session {
    id: Uuid,
    client: fantoccini::Client,
    engine: Engine,
    storage_dir: PathBuf,
    scripts_enabled: bool,
}

impl Session {
    /// Open a session against the first rendering engine that launches.
    ///
    /// Engines are tried in fixed preference order (Chromium, then
    /// Firefox); if none can be launched the per-engine errors are
    /// aggregated into [`WebsiftError::NoRenderingEngine`].
    pub async fn open(
        config: &RetrievalConfig,
        storage_root: &Path,
        scripts_enabled: bool,
    ) -> Result<Session> {
        let storage_dir = unique_storage_dir(storage_root);
        std::fs::create_dir_all(&storage_dir).map_err(|e| {
            WebsiftError::NoRenderingEngine(format!(
                "session storage {}: {e}",
                storage_dir.display()
            ))
        })?;

        let identity = ClientIdentity::pick();
        let endpoints = [
            (Engine::Chromium, config.chromedriver_url.as_str()),
            (Engine::Firefox, config.geckodriver_url.as_str()),
        ];

        let mut failures = Vec::new();
        for (engine, endpoint) in endpoints {
            match Self::try_open(
                engine,
                endpoint,
                &identity,
                &storage_dir,
                scripts_enabled,
                config.headless,
            )
            .await
            {
                Ok(session) => {
                    tracing::debug!(
                        target: "browser.session",
                        id = %session.id,
                        engine = engine.label(),
                        scripts_enabled,
                        storage = %storage_dir.display(),
                        "session.opened"
                    );
                    return Ok(session);
                }
                Err(e) => failures.push(format!("{}: {e:#}", engine.label())),
            }
        }

        let _ = std::fs::remove_dir_all(&storage_dir);
        Err(WebsiftError::NoRenderingEngine(failures.join("; ")))
    }

    async fn try_open(
        engine: Engine,
        endpoint: &str,
        identity: &ClientIdentity,
        storage_dir: &Path,
        scripts_enabled: bool,
        headless: bool,
    ) -> AnyResult<Session> {
        let caps = match engine {
            Engine::Chromium => {
                chromium_capabilities(identity, storage_dir, scripts_enabled, headless)
            }
            Engine::Firefox => {
                firefox_capabilities(identity, storage_dir, scripts_enabled, headless)
            }
        };

        let client = ClientBuilder::native()
            .capabilities(caps)
            .connect(endpoint)
            .await
            .with_context(|| format!("connecting to {endpoint}"))?;

        Ok(Session {
            id: Uuid::new_v4(),
            client,
            engine,
            storage_dir: storage_dir.to_path_buf(),
            scripts_enabled,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn scripts_enabled(&self) -> bool {
        self.scripts_enabled
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Open a fresh page (window) within this session.
    pub async fn open_page(&self) -> AnyResult<SessionPage> {
        let mut client = self.client.clone();
        let win = client.new_window(true).await?;
        client.switch_to_window(win.handle.clone()).await?;
        Ok(SessionPage::new(self.client.clone(), win.handle))
    }

    /// Close the session and remove its storage directory.
    ///
    /// Storage removal is best effort: a failure is logged and never
    /// crashes the process.
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            tracing::warn!(
                target: "browser.session",
                id = %self.id,
                error = %e,
                "session.close_failed"
            );
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.storage_dir).await {
            tracing::warn!(
                target: "browser.session",
                id = %self.id,
                storage = %self.storage_dir.display(),
                error = %e,
                "session.storage_removal_failed"
            );
        }
    }
}

/// Storage path under `root` with a fresh random suffix, so concurrent or
/// back-to-back sessions sharing the same root never collide.
fn unique_storage_dir(root: &Path) -> PathBuf {
    let suffix: u32 = rand::thread_rng().gen_range(1..1_000_000);
    root.join(format!("browser-session-{suffix}"))
}

fn chromium_capabilities(
    identity: &ClientIdentity,
    storage_dir: &Path,
    scripts_enabled: bool,
    headless: bool,
) -> Capabilities {
    let mut args = build_launch_arguments(identity);
    args.push(format!("--user-data-dir={}", storage_dir.display()));
    if headless {
        args.push("--headless=new".to_string());
        args.push("--disable-gpu".to_string());
    }

    let mut prefs = serde_json::Map::new();
    if !scripts_enabled {
        // Chromium content setting 2 = block JavaScript for every origin.
        prefs.insert(
            "profile.managed_default_content_settings.javascript".to_string(),
            json!(2),
        );
    }

    let chrome_opts = json!({
        "args": args,
        "prefs": prefs,
        "excludeSwitches": ["enable-automation"],
    });

    let mut caps = Capabilities::new();
    caps.insert("goog:chromeOptions".to_string(), chrome_opts);
    caps
}

fn firefox_capabilities(
    identity: &ClientIdentity,
    storage_dir: &Path,
    scripts_enabled: bool,
    headless: bool,
) -> Capabilities {
    let mut args = vec!["-profile".to_string(), storage_dir.display().to_string()];
    if headless {
        args.push("-headless".to_string());
    }

    let mut prefs = serde_json::Map::new();
    prefs.insert("dom.webdriver.enabled".to_string(), json!(false));
    prefs.insert(
        "general.useragent.override".to_string(),
        json!(identity.user_agent),
    );
    if !scripts_enabled {
        prefs.insert("javascript.enabled".to_string(), json!(false));
    }

    let firefox_opts = json!({
        "args": args,
        "prefs": prefs,
    });

    let mut caps = Capabilities::new();
    caps.insert("moz:firefoxOptions".to_string(), firefox_opts);
    caps
}
