use anyhow::Result;
use fantoccini::wd::WindowHandle;

/// One page (window) inside a [`crate::Session`].
///
/// Each concurrent fetch owns a dedicated page; commands re-select the
/// page's window so a session's pages never observe each other's state.
pub struct SessionPage {
    client: fantoccini::Client,
    window: WindowHandle,
}

impl SessionPage {
    pub(crate) fn new(client: fantoccini::Client, window: WindowHandle) -> Self {
        Self { client, window }
    }

    /// Navigate this page to `url`.
    pub async fn goto(&self, url: &str) -> Result<()> {
        let mut client = self.client.clone();
        client.switch_to_window(self.window.clone()).await?;
        client.goto(url).await?;
        Ok(())
    }

    /// Return the fully rendered page markup.
    pub async fn content(&self) -> Result<String> {
        let mut client = self.client.clone();
        client.switch_to_window(self.window.clone()).await?;
        client.source().await.map_err(Into::into)
    }

    /// Close this page's window. Best effort; the owning session's
    /// teardown is what ultimately reclaims the browser.
    pub async fn close(self) {
        let mut client = self.client.clone();
        if client.switch_to_window(self.window.clone()).await.is_ok() {
            if let Err(e) = client.close_window().await {
                tracing::warn!(target: "browser.session", error = %e, "page.close_failed");
            }
        }
    }
}
