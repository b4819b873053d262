//! Test doubles for the crawl pipeline.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::scrapers::{FetchError, FetchOutcome, PageFetcher};

/// Minimal report page accepted by the extractor.
pub const SAMPLE_PAGE: &str = r#"<html><body>
<div id="side-report">
  <div class="banner banner--closed"><p>Closed</p></div>
  <a class="problem-back" href="/around?lat=52.2;lon=0.12">Back</a>
  <h1>Broken streetlight</h1>
  <p class="report_meta_info">Reported via desktop in the Street lighting category anonymously at 08:15, Tue 02 January 2024</p>
  <p class="council_sent_info">Sent to <a href="/c">Cambridge City Council</a> 3 minutes later</p>
  <div class="moderate-display"><p>Light is out.</p></div>
</div>
</body></html>"#;

/// Fetcher returning pre-scripted outcomes; unscripted ids are 404.
pub struct ScriptedFetcher {
    outcomes: HashMap<i64, FetchOutcome>,
    requested: Mutex<Vec<i64>>,
}

impl ScriptedFetcher {
    pub fn new(outcomes: impl IntoIterator<Item = (i64, FetchOutcome)>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn page() -> FetchOutcome {
        FetchOutcome::Success(SAMPLE_PAGE.as_bytes().to_vec())
    }

    /// Every id fetched so far, in order.
    pub async fn requested(&self) -> Vec<i64> {
        self.requested.lock().await.clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, id: i64) -> Result<FetchOutcome, FetchError> {
        self.requested.lock().await.push(id);
        Ok(self
            .outcomes
            .get(&id)
            .cloned()
            .unwrap_or(FetchOutcome::NotFound))
    }
}
