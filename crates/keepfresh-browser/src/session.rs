use crate::locator::{
    self, Candidate, ElementProbe, ElementQuery, Probe, RetryPolicy, Strategy, TokioSleeper,
    Visibility,
};
use crate::profile::ScratchProfile;
use crate::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::cdp::browser_protocol::dom::{
    GetDocumentParams, QuerySelectorParams, SetFileInputFilesParams,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::page::{Page, ScreenshotParams};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// An element resolved by the locator: the CDP handle plus a CSS
/// selector (the probe's tag attribute) that re-addresses the same node
/// from injected scripts.
pub struct Located {
    pub element: Element,
    pub css: String,
}

/// One live controlled-browser instance and its page.
///
/// Owned exclusively by the pipeline; released exactly once at the end
/// of the run, success or failure.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler_task: tokio::task::JoinHandle<()>,
    _profile: ScratchProfile,
}

impl BrowserSession {
    pub(crate) fn assemble(
        browser: Browser,
        page: Page,
        handler_task: tokio::task::JoinHandle<()>,
        profile: ScratchProfile,
    ) -> Self {
        Self {
            browser,
            page,
            handler_task,
            _profile: profile,
        }
    }

    /// Navigate and wait for the load to settle, bounded by `nav_wait`.
    /// A slow or hung load is logged and tolerated; the portal's pages
    /// keep loading trackers long after the DOM is usable.
    pub async fn goto(&self, url: &str, nav_wait: Duration) -> Result<()> {
        tracing::debug!("Navigating to {url}");
        self.page.goto(url).await?;

        match tokio::time::timeout(nav_wait, self.page.wait_for_navigation()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!("Navigation wait error (continuing): {e}"),
            Err(_) => tracing::debug!("Navigation wait timed out (continuing)"),
        }
        Ok(())
    }

    pub async fn current_url(&self) -> Result<String> {
        Ok(self.page.url().await?.unwrap_or_default())
    }

    /// Evaluate a script in page context. Scripts that produce no value
    /// resolve to JSON null.
    pub async fn eval(&self, script: impl Into<String>) -> Result<serde_json::Value> {
        let outcome = self.page.evaluate(script.into()).await?;
        Ok(outcome
            .into_value::<serde_json::Value>()
            .unwrap_or(serde_json::Value::Null))
    }

    /// Resolve one logical element via the candidate list.
    pub async fn find(&self, query: &ElementQuery, policy: RetryPolicy) -> Option<Located> {
        let probe = PageProbe::new(&self.page);
        locator::resolve_first(&probe, query, policy, &TokioSleeper).await
    }

    pub async fn click(&self, target: &Located) -> Result<()> {
        target.element.click().await?;
        Ok(())
    }

    pub async fn type_into(&self, target: &Located, text: &str) -> Result<()> {
        target.element.click().await?;
        target.element.type_str(text).await?;
        Ok(())
    }

    /// Read an input's value, falling back to text content for
    /// non-form elements.
    pub async fn read_value(&self, target: &Located) -> Result<String> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({css});
                if (!el) return '';
                if ('value' in el && typeof el.value === 'string') return el.value;
                return (el.textContent || '').trim();
            }})()"#,
            css = js_str(&target.css),
        );
        let value = self.eval(script).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Empty an input and fire the events the portal's framework
    /// listens for.
    pub async fn clear_value(&self, target: &Located) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({css});
                if (!el) return false;
                el.focus();
                if ('value' in el) {{ el.value = ''; }} else {{ el.textContent = ''; }}
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            css = js_str(&target.css),
        );
        self.eval(script).await?;
        Ok(())
    }

    /// Undo the CSS tricks portals use to hide their real file inputs
    /// behind styled upload buttons.
    pub async fn force_interactable(&self, target: &Located) -> Result<()> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector({css});
                if (!el) return false;
                el.style.opacity = '1';
                el.style.display = 'block';
                el.style.visibility = 'visible';
                return true;
            }})()"#,
            css = js_str(&target.css),
        );
        self.eval(script).await?;
        Ok(())
    }

    /// Attach a local file to a file input via the DevTools DOM domain.
    /// Assigning `el.files` from page script is not permitted, so this
    /// goes through `DOM.setFileInputFiles` on the node's id.
    pub async fn set_file_input(&self, target: &Located, file: &Path) -> Result<()> {
        let doc = self.page.execute(GetDocumentParams::default()).await?;
        let node = self
            .page
            .execute(QuerySelectorParams::new(
                doc.root.node_id.clone(),
                target.css.clone(),
            ))
            .await?;

        let mut params = SetFileInputFilesParams::new(vec![file.display().to_string()]);
        params.node_id = Some(node.node_id.clone());
        self.page.execute(params).await?;
        Ok(())
    }

    /// Scroll to the bottom of the page; the portal lazy-loads the
    /// lower profile sections.
    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.eval("window.scrollTo(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    pub async fn scroll_to_top(&self) -> Result<()> {
        self.eval("window.scrollTo(0, 0)").await?;
        Ok(())
    }

    /// Capture a full-page screenshot and a raw markup dump into
    /// `dir`, named by stage and timestamp. The portal's layout is not
    /// ours; when a locator exhausts, these artifacts are the only way
    /// to see what the page actually looked like.
    pub async fn capture_diagnostics(&self, stage: &str, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)?;
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
        let shot_path = dir.join(format!("{stage}-{stamp}.png"));
        let markup_path = dir.join(format!("{stage}-{stamp}.html"));

        let shot = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .full_page(true)
                    .build(),
            )
            .await?;
        std::fs::write(&shot_path, shot)?;

        let markup = self.page.content().await?;
        std::fs::write(&markup_path, markup)?;

        tracing::info!(
            "Diagnostics captured: {} and {}",
            shot_path.display(),
            markup_path.display()
        );
        Ok((shot_path, markup_path))
    }

    /// Release the browser. Every step is tolerated individually: a
    /// failed close request still waits for exit, a hung exit is
    /// abandoned after a bounded wait, and the handler task is always
    /// stopped.
    pub async fn close(mut self) -> Result<()> {
        let closed = self.browser.close().await;
        if let Err(ref e) = closed {
            tracing::debug!("Browser close request failed: {e}");
        }

        match tokio::time::timeout(Duration::from_secs(5), self.browser.wait()).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::debug!("Browser exit wait error: {e}"),
            Err(_) => tracing::debug!("Browser did not exit within 5s; abandoning"),
        }

        self.handler_task.abort();
        closed.map(|_| ()).map_err(Error::from)
    }
}

/// Resolves locator candidates against a live page.
///
/// Each probe runs one injected script that applies the candidate's
/// strategy, checks visibility, and tags the match with a unique
/// attribute; the element handle is then fetched by that tag. Keeping
/// all strategy interpretation in page script means every strategy the
/// portal's markup has historically needed (id, name, css, xpath, tag,
/// class, link text) resolves through one code path.
pub struct PageProbe<'a> {
    page: &'a Page,
    seq: AtomicU64,
}

impl<'a> PageProbe<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self {
            page,
            seq: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl ElementProbe for PageProbe<'_> {
    type Hit = Located;

    async fn probe(&self, candidate: &Candidate, visibility: Visibility) -> Result<Probe<Located>> {
        let tag = format!("kf-{}", self.seq.fetch_add(1, Ordering::Relaxed));
        let script = probe_script(candidate, visibility, &tag);

        let verdict = self
            .page
            .evaluate(script)
            .await?
            .into_value::<String>()
            .map_err(|e| Error::Eval(e.to_string()))?;

        match verdict.as_str() {
            "hit" => {
                let css = format!("[data-kf-probe=\"{tag}\"]");
                let element = self.page.find_element(css.clone()).await?;
                Ok(Probe::Hit(Located { element, css }))
            }
            "hidden" => Ok(Probe::Hidden),
            _ => Ok(Probe::Absent),
        }
    }
}

fn resolve_expr(strategy: Strategy, selector_js: &str) -> String {
    match strategy {
        Strategy::Id => format!("document.getElementById({selector_js})"),
        Strategy::Name => format!("document.getElementsByName({selector_js})[0] || null"),
        Strategy::Css => format!("document.querySelector({selector_js})"),
        Strategy::XPath => format!(
            "document.evaluate({selector_js}, document, null, \
             XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
        ),
        Strategy::Tag => format!("document.getElementsByTagName({selector_js})[0] || null"),
        Strategy::Class => format!("document.getElementsByClassName({selector_js})[0] || null"),
        Strategy::LinkText => format!(
            "Array.from(document.querySelectorAll('a, button')).find(\
             (n) => (n.textContent || '').trim() === {selector_js}) || null"
        ),
    }
}

fn probe_script(candidate: &Candidate, visibility: Visibility, tag: &str) -> String {
    let expr = resolve_expr(candidate.strategy, &js_str(&candidate.selector));
    let require_displayed = matches!(visibility, Visibility::Displayed);

    format!(
        r#"(() => {{
            let el = null;
            try {{ el = {expr}; }} catch (err) {{ return 'absent'; }}
            if (!el || el.nodeType !== 1) {{ return 'absent'; }}
            const style = window.getComputedStyle(el);
            const displayed = el.getClientRects().length > 0
                && style.visibility !== 'hidden'
                && style.display !== 'none';
            if ({require_displayed} && !displayed) {{ return 'hidden'; }}
            el.setAttribute('data-kf-probe', {tag_js});
            return 'hit';
        }})()"#,
        tag_js = js_str(tag),
    )
}

/// JSON-encode a string for safe embedding in page script.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| String::from("\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_script_quotes_selector() {
        let candidate = Candidate::css("input[name=\"resume\"]");
        let script = probe_script(&candidate, Visibility::Present, "kf-1");

        assert!(script.contains(r#"document.querySelector("input[name=\"resume\"]")"#));
        assert!(script.contains("false && !displayed"));
    }

    #[test]
    fn test_probe_script_enforces_visibility_for_displayed() {
        let candidate = Candidate::id("saveBtn");
        let script = probe_script(&candidate, Visibility::Displayed, "kf-2");

        assert!(script.contains(r#"document.getElementById("saveBtn")"#));
        assert!(script.contains("true && !displayed"));
        assert!(script.contains("'hidden'"));
    }

    #[test]
    fn test_resolve_expr_covers_every_strategy() {
        let strategies = [
            Strategy::Id,
            Strategy::Name,
            Strategy::Css,
            Strategy::XPath,
            Strategy::Tag,
            Strategy::Class,
            Strategy::LinkText,
        ];

        for strategy in strategies {
            let expr = resolve_expr(strategy, "\"x\"");
            assert!(expr.contains("\"x\""), "{strategy:?} ignored the selector");
        }
    }
}
