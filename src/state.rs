use std::sync::Arc;

use crate::ledger::SubmissionLedger;
use crate::refresh::RefreshScheduler;
use crate::speech::SpeechSynthesizer;
use crate::store::{ArticleStore, ForecastStore};

/// Handles shared by the HTTP layer. Built once in `main`.
pub struct AppState {
    pub store: Arc<ArticleStore>,
    pub forecasts: Arc<ForecastStore>,
    pub ledger: Arc<SubmissionLedger>,
    pub speech: Arc<SpeechSynthesizer>,
    pub scheduler: Arc<RefreshScheduler>,
}
