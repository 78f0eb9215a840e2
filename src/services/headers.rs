// src/services/headers.rs

//! Rotating announcement text shown above the snapshot list.

use std::collections::HashMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use regex::Regex;

use crate::error::Result;

/// Scope whose texts override every community's own.
pub const GLOBAL_SCOPE: &str = "all";

/// Content starting with this marker disables the scope.
const DISABLE_MARKER: &str = "!ignore";

/// Texts are separated by a line of three or more dashes.
static SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\r?\n-{3,}\r?\n").expect("separator pattern"));

/// Where header texts come from.
#[async_trait]
pub trait HeaderSource: Send + Sync {
    /// Raw content for a scope, `None` if the scope has no page.
    async fn fetch_header(&self, scope: &str) -> Result<Option<String>>;
}

/// Candidate texts for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    texts: Vec<String>,
    disabled: bool,
}

impl Header {
    /// Parse raw page content.
    pub fn parse(content: &str) -> Self {
        if content.starts_with(DISABLE_MARKER) {
            return Self {
                texts: Vec::new(),
                disabled: true,
            };
        }
        let texts = SEPARATOR
            .split(content)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            texts,
            disabled: false,
        }
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// A uniformly random text, or `""` when there is none.
    pub fn pick(&self) -> String {
        self.texts
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }
}

/// Header pools per scope, reloaded on a schedule.
#[derive(Debug, Default)]
pub struct HeaderRotator {
    headers: HashMap<String, Header>,
}

impl HeaderRotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reload one scope. A failed fetch leaves the scope empty until the next refresh.
    pub async fn refresh(&mut self, source: &dyn HeaderSource, scope: &str) {
        let scope = scope.to_lowercase();
        let header = match source.fetch_header(&scope).await {
            Ok(Some(content)) => Header::parse(&content),
            Ok(None) => Header::default(),
            Err(e) => {
                log::warn!("Could not load header for {}: {}", scope, e);
                Header::default()
            }
        };
        log::debug!(
            "Header {}: {} texts{}",
            scope,
            header.texts.len(),
            if header.disabled { " (disabled)" } else { "" }
        );
        self.headers.insert(scope, header);
    }

    /// Drop every pool and reload the global scope plus `scopes`.
    pub async fn refresh_all(&mut self, source: &dyn HeaderSource, scopes: &[String]) {
        self.headers.clear();
        self.refresh(source, GLOBAL_SCOPE).await;
        for scope in scopes {
            if !scope.eq_ignore_ascii_case(GLOBAL_SCOPE) {
                self.refresh(source, scope).await;
            }
        }
    }

    /// Pool that applies to a community.
    ///
    /// A non-empty global pool always wins, so announcements reach everyone.
    pub fn header_for(&self, scope: &str) -> Option<&Header> {
        let global = self.headers.get(GLOBAL_SCOPE);
        if global.is_some_and(|h| !h.is_empty()) {
            return global;
        }
        self.headers.get(&scope.to_lowercase()).or(global)
    }

    /// Random header text for a community, `""` if none applies.
    pub fn get(&self, scope: &str) -> String {
        self.header_for(scope).map(Header::pick).unwrap_or_default()
    }

    /// Forget all pools.
    pub fn clear(&mut self) {
        self.headers.clear();
    }
}
