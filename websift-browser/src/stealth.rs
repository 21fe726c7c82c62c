use rand::prelude::SliceRandom;

/// Snapshot of the user agent, viewport, and locale a session presents.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    pub user_agent: String,
    pub viewport: (u32, u32),
    pub languages: Vec<String>,
}

impl ClientIdentity {
    /// Pick one of the built-in desktop identities.
    pub fn pick() -> Self {
        let mut rng = rand::thread_rng();
        desktop_identities()
            .choose(&mut rng)
            .cloned()
            .unwrap_or_else(|| desktop_identities().remove(0))
    }
}

fn desktop_identities() -> Vec<ClientIdentity> {
    vec![
        ClientIdentity {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            viewport: (1920, 1080),
            languages: vec!["en-US".to_string(), "en".to_string()],
        },
        ClientIdentity {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36".to_string(),
            viewport: (1440, 900),
            languages: vec!["en-US".to_string(), "en".to_string()],
        },
    ]
}

/// Construct Chromium command‑line arguments for the given identity.
///
/// The flags suppress the automation signals the engine would otherwise
/// expose and present a maximized window with a realistic user agent.
pub fn build_launch_arguments(identity: &ClientIdentity) -> Vec<String> {
    vec![
        "--disable-blink-features=AutomationControlled".to_string(),
        "--disable-infobars".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-sandbox".to_string(),
        "--disable-extensions".to_string(),
        "--disable-plugins-discovery".to_string(),
        "--start-maximized".to_string(),
        format!("--user-agent={}", identity.user_agent),
        format!(
            "--window-size={},{}",
            identity.viewport.0, identity.viewport.1
        ),
        format!("--lang={}", identity.languages.join(",")),
    ]
}
