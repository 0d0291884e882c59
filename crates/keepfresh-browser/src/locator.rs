use crate::Result;
use async_trait::async_trait;
use keepfresh_core::WaitBudget;
use std::time::Duration;

/// How a candidate selector is resolved against the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Id,
    Name,
    Css,
    XPath,
    Tag,
    Class,
    LinkText,
}

/// One way of finding a logical UI element.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub strategy: Strategy,
    pub selector: String,
}

impl Candidate {
    pub fn new(strategy: Strategy, selector: impl Into<String>) -> Self {
        Self {
            strategy,
            selector: selector.into(),
        }
    }

    pub fn id(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Id, selector)
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Css, selector)
    }

    pub fn xpath(selector: impl Into<String>) -> Self {
        Self::new(Strategy::XPath, selector)
    }

    pub fn name(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Name, selector)
    }

    pub fn class(selector: impl Into<String>) -> Self {
        Self::new(Strategy::Class, selector)
    }

    pub fn link_text(selector: impl Into<String>) -> Self {
        Self::new(Strategy::LinkText, selector)
    }
}

/// Whether a match must be displayed or merely present in the DOM.
///
/// File inputs are routinely hidden with CSS and still accept paths, so
/// the upload flow looks for `Present` elements; everything the user
/// would click needs `Displayed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Displayed,
    Present,
}

/// One logical element, described by an ordered list of candidates.
/// Earlier candidates are the historically more reliable ones.
#[derive(Debug, Clone)]
pub struct ElementQuery {
    pub label: &'static str,
    pub visibility: Visibility,
    pub candidates: Vec<Candidate>,
}

impl ElementQuery {
    pub fn displayed(label: &'static str, candidates: Vec<Candidate>) -> Self {
        Self {
            label,
            visibility: Visibility::Displayed,
            candidates,
        }
    }

    pub fn present(label: &'static str, candidates: Vec<Candidate>) -> Self {
        Self {
            label,
            visibility: Visibility::Present,
            candidates,
        }
    }
}

/// Bounded retry budget for one resolution: `passes` sweeps over the
/// candidate list with a fixed `backoff` between sweeps.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub passes: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(passes: u32, backoff: Duration) -> Self {
        Self { passes, backoff }
    }

    pub fn from_budget(budget: &WaitBudget) -> Self {
        Self {
            passes: budget.locator_passes,
            backoff: budget.locator_backoff,
        }
    }

    /// A single sweep with no backoff, for opportunistic lookups where
    /// absence is expected (cookie banners, skip prompts).
    pub fn single_pass() -> Self {
        Self {
            passes: 1,
            backoff: Duration::ZERO,
        }
    }
}

/// What one probe attempt saw.
#[derive(Debug)]
pub enum Probe<H> {
    Hit(H),
    Hidden,
    Absent,
}

/// Resolves a single candidate against the live page.
///
/// Implementations report errors; the locator treats them as "try the
/// next candidate" and never lets them escape.
#[async_trait]
pub trait ElementProbe {
    type Hit: Send;

    async fn probe(&self, candidate: &Candidate, visibility: Visibility)
    -> Result<Probe<Self::Hit>>;
}

/// Injectable wait source, so retry budgets are testable without
/// real elapsed time.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, period: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, period: Duration) {
        tokio::time::sleep(period).await;
    }
}

/// Resolve the first candidate, in list order, that satisfies the
/// query's visibility requirement.
///
/// Candidates are swept in priority order once per pass; the first
/// match wins immediately, even if a later candidate would also match.
/// A pass with no match sleeps `policy.backoff` and sweeps again, up to
/// `policy.passes` sweeps. Per-candidate resolution failures are
/// logged and swallowed. Exhaustion returns `None`; the caller decides
/// whether that warrants diagnostics.
pub async fn resolve_first<P: ElementProbe + Sync>(
    probe: &P,
    query: &ElementQuery,
    policy: RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Option<P::Hit> {
    let passes = policy.passes.max(1);

    for pass in 1..=passes {
        if pass > 1 {
            sleeper.sleep(policy.backoff).await;
            tracing::debug!(
                "Retrying '{}' detection (pass {}/{})",
                query.label,
                pass,
                passes
            );
        }

        for (index, candidate) in query.candidates.iter().enumerate() {
            match probe.probe(candidate, query.visibility).await {
                Ok(Probe::Hit(hit)) => {
                    tracing::debug!(
                        "Resolved '{}' via candidate {} ({:?} {})",
                        query.label,
                        index,
                        candidate.strategy,
                        candidate.selector
                    );
                    return Some(hit);
                }
                Ok(Probe::Hidden) => {
                    tracing::trace!(
                        "Candidate {} for '{}' present but not displayed",
                        index,
                        query.label
                    );
                }
                Ok(Probe::Absent) => {}
                Err(err) => {
                    tracing::trace!(
                        "Candidate {} for '{}' failed to resolve: {}",
                        index,
                        query.label,
                        err
                    );
                }
            }
        }
    }

    tracing::warn!(
        "Element '{}' not found after {} passes over {} candidates",
        query.label,
        passes,
        query.candidates.len()
    );
    None
}
