//! In-memory origin for unit tests

use crate::crawler::fetcher::{Fetch, FetchOutcome};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use url::Url;

/// [`Fetch`] that replays scripted outcomes per URL
///
/// The last scripted outcome for a URL repeats once the script runs out.
/// Unscripted URLs answer 404.
#[derive(Default)]
pub struct ScriptedFetcher {
    scripts: Mutex<HashMap<String, VecDeque<FetchOutcome>>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, key: &str, outcomes: Vec<FetchOutcome>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(key.to_string(), outcomes.into());
    }

    pub fn calls(&self, key: &str) -> usize {
        self.calls.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    fn key(url: &Url, params: &[(String, String)]) -> String {
        let mut url = url.clone();
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url.to_string()
    }
}

#[async_trait]
impl Fetch for ScriptedFetcher {
    async fn fetch(&self, url: &Url, params: &[(String, String)]) -> FetchOutcome {
        let key = Self::key(url, params);
        *self.calls.lock().unwrap().entry(key.clone()).or_insert(0) += 1;

        let mut scripts = self.scripts.lock().unwrap();
        match scripts.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => FetchOutcome::HttpError { status: 404 },
        }
    }
}

pub fn success(body: &str) -> FetchOutcome {
    FetchOutcome::Success {
        body: body.as_bytes().to_vec(),
        final_url: Url::parse("https://tululu.org/").unwrap(),
    }
}

pub fn success_bytes(body: &[u8]) -> FetchOutcome {
    FetchOutcome::Success {
        body: body.to_vec(),
        final_url: Url::parse("https://tululu.org/").unwrap(),
    }
}

pub fn redirect_home() -> FetchOutcome {
    FetchOutcome::Redirected {
        final_url: Url::parse("https://tululu.org/").unwrap(),
    }
}

pub fn connection_failure() -> FetchOutcome {
    FetchOutcome::ConnectionFailure {
        cause: "Connection reset by peer".to_string(),
    }
}

/// Detail page markup in the origin's layout
pub fn detail_page(title: &str, author: &str, image_src: &str) -> String {
    format!(
        r#"<html><body>
        <h1>{title} &nbsp; :: &nbsp; {author}</h1>
        <div class="bookimage"><a href="/b1/"><img src="{image_src}" alt="cover"></a></div>
        <span class="d_book">Жанр книги: <a href="/l55/">Научная фантастика</a>, <a href="/l17/">Повесть</a></span>
        <div class="texts"><b>Reader</b><br><span class="black">Great book</span></div>
        <div class="texts"><b>Other</b><br><span class="black">Too long</span></div>
        </body></html>"#
    )
}

/// Catalog page markup listing the given item paths
pub fn catalog_page(item_paths: &[&str]) -> String {
    let tables: String = item_paths
        .iter()
        .map(|p| {
            format!(
                r#"<table class="d_book"><tr><td><a href="{p}"><img src="/images/x.jpg"></a></td></tr>
                <tr><td><a href="{p}">Title</a></td></tr></table>"#
            )
        })
        .collect();
    format!("<html><body><div id=\"content\">{}</div></body></html>", tables)
}
