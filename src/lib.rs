//! # Campus Desk
//!
//! A question-answering backend for a campus help desk chatbot.
//!
//! Campus Desk answers natural-language questions about an institution's
//! people and programs. Questions are normalized, expanded through an
//! alias table, classified by intent, and matched against records fetched
//! from a REST record store. When no record match is confident enough the
//! question falls through to an LLM provider (Gemini or any
//! OpenAI-compatible endpoint), and when that is unavailable too, to a
//! static reply. The pipeline itself never fails a request.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   ┌──────────────────────────┐   ┌──────────┐
//! │ Question  │──▶│  Pipeline                 │──▶│  Answer   │
//! │           │   │ normalize→alias→intent   │   │ + source  │
//! └───────────┘   │ fetch→score→gate→format  │   └──────────┘
//!                 └─────┬──────────────┬─────┘
//!                       ▼              ▼
//!                 ┌──────────┐   ┌──────────┐
//!                 │  Record  │   │   LLM    │
//!                 │  store   │   │ fallback │
//!                 └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! desk check                    # show configured backends
//! desk ask "who teaches os"     # answer one question from the CLI
//! desk serve                    # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`normalize`] | Query normalization and greeting detection |
//! | [`alias`] | Abbreviation and jargon expansion |
//! | [`intent`] | Intent classification and department hints |
//! | [`models`] | Record collections and the normalized record shape |
//! | [`store`] | Record store trait, REST and in-memory backends |
//! | [`score`] | Candidate scoring against query tokens |
//! | [`gate`] | Confidence gate over ranked candidates |
//! | [`format`] | Record and suggestion rendering |
//! | [`llm`] | LLM providers, text and media generation |
//! | [`media`] | Image payload decoding and limits |
//! | [`pipeline`] | The ask pipeline state machine |
//! | [`server`] | HTTP API server |

pub mod alias;
pub mod config;
pub mod format;
pub mod gate;
pub mod intent;
pub mod llm;
pub mod media;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod score;
pub mod server;
pub mod store;
