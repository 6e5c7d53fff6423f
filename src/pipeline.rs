//! The ask pipeline.
//!
//! One explicit state machine per request:
//!
//! ```text
//! Classify ──▶ Fetch ──▶ Score ──▶ Decide ──▶ Format (store answer)
//!     │          │                    │
//!     └──────────┴────────────────────┴──────▶ Fallback (LLM answer)
//! ```
//!
//! Every failure mode (store unconfigured, fetch error, empty set, low
//! confidence) takes the one shared Fallback transition instead of
//! re-deriving fallback at each call site. The entry point is infallible:
//! callers always get a well-formed [`AskOutcome`].
//!
//! The suggestion policy when the gate is unsure: attempt the LLM first
//! and prefer a meaningful answer; the suggestion list rides along in the
//! response either way.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use crate::alias::AliasTable;
use crate::config::Config;
use crate::format::{format_record, format_suggestions};
use crate::gate::{decide, Decision};
use crate::intent::{classify, detect_dept_hint, is_role_seeking, Intent};
use crate::llm::LlmClient;
use crate::models::Record;
use crate::normalize::{is_greeting, normalize, tokenize, GREETING_REPLY};
use crate::score::{rank, Candidate, ScoreContext};
use crate::store::{fetch_with_hint, RecordStore};

/// Final result of one ask request.
#[derive(Debug, Clone, Serialize)]
pub struct AskOutcome {
    pub answer: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Suggestion>>,
    pub debug: AskDebug,
}

/// A near-miss candidate offered when the gate is unsure.
#[derive(Debug, Clone, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub score: u32,
}

/// Diagnostics for one request.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AskDebug {
    pub request_id: String,
    pub normalized: String,
    pub expanded: String,
    pub intent: String,
    pub role_seeking: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dept_hint: Option<String>,
    pub candidates: usize,
    pub top_scores: Vec<u32>,
    pub elapsed_ms: u64,
    pub notes: Vec<String>,
}

/// Pipeline stages. `Fallback` is reachable from every earlier stage.
enum Stage {
    Classify,
    Fetch { intent: Intent },
    Score { records: Vec<Record> },
    Decide { candidates: Vec<Candidate> },
    Format { candidate: Candidate },
    Fallback,
}

/// The ask pipeline, shared across requests.
pub struct Pipeline {
    store: Arc<dyn RecordStore>,
    llm: Arc<LlmClient>,
    aliases: AliasTable,
    config: Arc<Config>,
}

impl Pipeline {
    pub fn new(store: Arc<dyn RecordStore>, llm: Arc<LlmClient>, config: Arc<Config>) -> Self {
        let aliases = AliasTable::with_extras(&config.ask.extra_aliases);
        Self {
            store,
            llm,
            aliases,
            config,
        }
    }

    /// Run one question through the pipeline. Infallible.
    pub async fn ask(&self, question: &str) -> AskOutcome {
        let started = Instant::now();
        let mut diag = AskDebug {
            request_id: Uuid::new_v4().to_string(),
            normalized: normalize(question),
            ..Default::default()
        };

        // Greeting guard: trivial input never reaches a collaborator.
        if is_greeting(&diag.normalized) {
            diag.elapsed_ms = started.elapsed().as_millis() as u64;
            return AskOutcome {
                answer: GREETING_REPLY.to_string(),
                source: "generic".to_string(),
                matched_alias: None,
                suggestions: None,
                debug: diag,
            };
        }

        let pre_tokens = tokenize(&diag.normalized);
        let expansion = self.aliases.expand(&diag.normalized);
        diag.expanded = expansion.expanded.clone();
        let tokens = tokenize(&expansion.expanded);
        let role_seeking = is_role_seeking(&tokens);
        let dept_hint = detect_dept_hint(&tokens);
        diag.role_seeking = role_seeking;
        diag.dept_hint = dept_hint.as_ref().map(|h| h.phrase.clone());
        let ctx = ScoreContext {
            role_seeking,
            dept_hint: dept_hint.clone(),
        };

        let mut stage = Stage::Classify;
        loop {
            stage = match stage {
                Stage::Classify => {
                    let intent = classify(&pre_tokens);
                    diag.intent = intent.label().to_string();
                    tracing::debug!(
                        request_id = %diag.request_id,
                        intent = intent.label(),
                        role_seeking,
                        "classified query"
                    );
                    Stage::Fetch { intent }
                }

                Stage::Fetch { intent } => {
                    if !self.store.is_configured() {
                        diag.notes.push("record store not configured".to_string());
                        Stage::Fallback
                    } else {
                        match self.fetch_records(intent, &ctx, &mut diag.notes).await {
                            Ok(records) if records.is_empty() => {
                                diag.notes.push("no records fetched".to_string());
                                Stage::Fallback
                            }
                            Ok(records) => Stage::Score { records },
                            Err(e) => {
                                diag.notes.push(format!("store fetch failed: {:#}", e));
                                Stage::Fallback
                            }
                        }
                    }
                }

                Stage::Score { records } => {
                    let candidates = rank(records, &tokens, &ctx, &self.config.ask.weights);
                    diag.candidates = candidates.len();
                    diag.top_scores = candidates.iter().take(3).map(|c| c.points).collect();
                    Stage::Decide { candidates }
                }

                Stage::Decide { candidates } => {
                    match decide(candidates, role_seeking, &self.config.ask) {
                        Decision::Confident(candidate) => Stage::Format { candidate },
                        Decision::Suggest(list) => {
                            return self
                                .finish_suggest(list, &expansion.expanded, expansion.matched_alias, diag, started)
                                .await;
                        }
                        Decision::Fallback => {
                            diag.notes.push("no confident candidate".to_string());
                            Stage::Fallback
                        }
                    }
                }

                Stage::Format { candidate } => {
                    diag.elapsed_ms = started.elapsed().as_millis() as u64;
                    tracing::info!(
                        request_id = %diag.request_id,
                        source = %candidate.record.collection_label,
                        score = candidate.points,
                        elapsed_ms = diag.elapsed_ms,
                        "answered from store"
                    );
                    return AskOutcome {
                        answer: format_record(&candidate.record),
                        source: candidate.record.collection_label.clone(),
                        matched_alias: expansion.matched_alias,
                        suggestions: None,
                        debug: diag,
                    };
                }

                Stage::Fallback => {
                    return self
                        .finish_fallback(&expansion.expanded, expansion.matched_alias, diag, started)
                        .await;
                }
            };
        }
    }

    /// Fetch for an intent. People queries hit faculty and staff jointly;
    /// each result is captured on its own so one failure cannot cancel or
    /// fail the other.
    async fn fetch_records(
        &self,
        intent: Intent,
        ctx: &ScoreContext,
        notes: &mut Vec<String>,
    ) -> anyhow::Result<Vec<Record>> {
        let collections = intent.collections();
        let hint = ctx.dept_hint.as_ref();
        let limit = self.config.ask.fetch_limit;

        if let [first, second] = collections {
            let (a, b) = tokio::join!(
                fetch_with_hint(self.store.as_ref(), *first, hint, limit),
                fetch_with_hint(self.store.as_ref(), *second, hint, limit),
            );
            let mut records = Vec::new();
            let mut failures = 0;
            for (collection, result) in [(*first, a), (*second, b)] {
                match result {
                    Ok(mut batch) => records.append(&mut batch),
                    Err(e) => {
                        failures += 1;
                        notes.push(format!("{} fetch failed: {:#}", collection.table(), e));
                        tracing::warn!(
                            collection = collection.table(),
                            error = %e,
                            "collection fetch failed"
                        );
                    }
                }
            }
            if failures == collections.len() {
                anyhow::bail!("all collections failed to fetch");
            }
            Ok(records)
        } else {
            fetch_with_hint(self.store.as_ref(), collections[0], hint, limit).await
        }
    }

    async fn finish_suggest(
        &self,
        list: Vec<Candidate>,
        expanded: &str,
        matched_alias: Option<String>,
        mut diag: AskDebug,
        started: Instant,
    ) -> AskOutcome {
        let suggestions: Vec<Suggestion> = list
            .iter()
            .map(|c| Suggestion {
                name: c
                    .record
                    .name
                    .clone()
                    .unwrap_or_else(|| c.record.collection_label.clone()),
                score: c.points,
            })
            .collect();

        let reply = self.llm.answer(expanded).await;
        diag.elapsed_ms = started.elapsed().as_millis() as u64;
        if reply.is_meaningful() {
            diag.notes.push("low confidence, preferred LLM answer".to_string());
            return AskOutcome {
                answer: reply.text,
                source: "llm".to_string(),
                matched_alias,
                suggestions: Some(suggestions),
                debug: diag,
            };
        }

        let pairs: Vec<(String, u32)> = suggestions
            .iter()
            .map(|s| (s.name.clone(), s.score))
            .collect();
        let source = list
            .first()
            .map(|c| c.record.collection_label.clone())
            .unwrap_or_else(|| "generic".to_string());
        diag.notes.push("low confidence, returned suggestions".to_string());
        AskOutcome {
            answer: format_suggestions(&pairs),
            source,
            matched_alias,
            suggestions: Some(suggestions),
            debug: diag,
        }
    }

    async fn finish_fallback(
        &self,
        expanded: &str,
        matched_alias: Option<String>,
        mut diag: AskDebug,
        started: Instant,
    ) -> AskOutcome {
        let reply = self.llm.answer(expanded).await;
        let source = if self.llm.is_configured() {
            "llm"
        } else {
            "generic"
        };
        diag.elapsed_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            request_id = %diag.request_id,
            source,
            elapsed_ms = diag.elapsed_ms,
            "answered from fallback"
        );
        AskOutcome {
            answer: reply.text,
            source: source.to_string(),
            matched_alias,
            suggestions: None,
            debug: diag,
        }
    }
}
