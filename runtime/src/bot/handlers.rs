//! Routing of incoming updates to commands and button presses.

use super::messages;
use super::rate_limit::RateLimiter;
use super::session::SessionStore;
use crate::config::SEARCH_RATE_LIMIT;
use crate::delivery::Delivery;
use crate::extraction::resolver::{PdfResolver, ResolvedLink};
use crate::search::SearchProvider;
use crate::telegram::types::CallbackQuery;
use crate::telegram::{InlineKeyboardButton, InlineKeyboardMarkup, Message, Messenger, Update};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// What a text message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Search(String),
    /// A message carrying a page URL to resolve directly.
    Url(String),
    Unknown,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix('/') {
            let (head, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            // `/search@SomeBot` in group chats
            let name = head.split('@').next().unwrap_or(head);
            return match name {
                "start" => Self::Start,
                "help" => Self::Help,
                "search" => Self::Search(args.trim().to_string()),
                _ => Self::Unknown,
            };
        }
        match first_url(text) {
            Some(url) => Self::Url(url),
            None => Self::Unknown,
        }
    }
}

fn first_url(text: &str) -> Option<String> {
    text.split_whitespace()
        .find(|w| w.starts_with("http://") || w.starts_with("https://"))
        .filter(|w| url::Url::parse(w).is_ok())
        .map(str::to_string)
}

/// What an inline button press carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonPress {
    /// `dl|<index>` with a well-formed index.
    Download(usize),
    /// `dl|` followed by something that is not an index.
    Malformed,
    /// Not one of our download buttons.
    Other,
}

impl ButtonPress {
    pub fn parse(data: Option<&str>) -> Self {
        match data.and_then(|d| d.strip_prefix("dl|")) {
            Some(payload) => payload
                .trim()
                .parse()
                .map_or(Self::Malformed, Self::Download),
            None => Self::Other,
        }
    }
}

/// Everything a handler needs, shared across update tasks.
pub struct Bot {
    messenger: Arc<dyn Messenger>,
    search: Arc<dyn SearchProvider>,
    resolver: Arc<PdfResolver>,
    delivery: Delivery,
    sessions: SessionStore,
    rate_limiter: RateLimiter,
}

impl Bot {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        search: Arc<dyn SearchProvider>,
        resolver: Arc<PdfResolver>,
        delivery: Delivery,
    ) -> Self {
        Self {
            messenger,
            search,
            resolver,
            delivery,
            sessions: SessionStore::default(),
            rate_limiter: RateLimiter::new(SEARCH_RATE_LIMIT),
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.rate_limiter = limiter;
        self
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.rate_limiter
    }

    /// Handle one update to completion.
    pub async fn handle_update(&self, update: Update) -> Result<()> {
        if let Some(cb) = update.callback_query {
            return self.on_callback(cb).await;
        }
        if let Some(msg) = update.message {
            return self.on_message(msg).await;
        }
        Ok(())
    }

    async fn on_message(&self, msg: Message) -> Result<()> {
        let Some(text) = msg.text.as_deref() else {
            return Ok(());
        };
        let chat_id = msg.chat.id;
        let user_id = msg.from.as_ref().map_or(chat_id, |u| u.id);

        match Command::parse(text) {
            Command::Start => {
                self.messenger
                    .send_message(chat_id, messages::WELCOME, None)
                    .await?;
            }
            Command::Help => {
                self.messenger
                    .send_message(chat_id, messages::HELP, None)
                    .await?;
            }
            Command::Search(query) => self.on_search(chat_id, user_id, &query).await?,
            Command::Url(url) => {
                self.messenger
                    .send_message(chat_id, messages::EXTRACTING, None)
                    .await?;
                let title = title_from_url(&url);
                self.resolve_and_send(chat_id, &url, &title).await?;
            }
            Command::Unknown => {
                self.messenger
                    .send_message(chat_id, messages::UNKNOWN, None)
                    .await?;
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn on_search(&self, chat_id: i64, user_id: i64, query: &str) -> Result<()> {
        if query.is_empty() {
            self.messenger
                .send_message(chat_id, messages::SEARCH_USAGE, None)
                .await?;
            return Ok(());
        }
        if !self.rate_limiter.check(user_id) {
            self.messenger
                .send_message(chat_id, messages::RATE_LIMITED, None)
                .await?;
            return Ok(());
        }

        let status_id = self
            .messenger
            .send_message(chat_id, &messages::searching(query), None)
            .await?;

        let hits = match self.search.search(query).await {
            Ok(h) => h,
            Err(e) => {
                warn!(provider = self.search.name(), error = %e, "search failed");
                self.messenger
                    .edit_message_text(chat_id, status_id, &messages::search_failed(&e), None)
                    .await?;
                return Ok(());
            }
        };

        if hits.is_empty() {
            self.messenger
                .edit_message_text(chat_id, status_id, messages::NO_RESULTS, None)
                .await?;
            return Ok(());
        }

        info!(count = hits.len(), "search results");
        let text = messages::result_list(&hits);
        let keyboard = InlineKeyboardMarkup::single_column(
            (0..hits.len())
                .map(|i| {
                    InlineKeyboardButton::callback(messages::download_button(i + 1), format!("dl|{i}"))
                })
                .collect(),
        );
        self.sessions.store(user_id, hits);
        self.messenger
            .edit_message_text(chat_id, status_id, &text, Some(keyboard))
            .await?;
        Ok(())
    }

    async fn on_callback(&self, cb: CallbackQuery) -> Result<()> {
        if let Err(e) = self.messenger.answer_callback_query(&cb.id).await {
            warn!(error = %e, "answerCallbackQuery failed");
        }
        let Some(msg) = cb.message else {
            return Ok(());
        };
        let chat_id = msg.chat.id;

        let hit = match ButtonPress::parse(cb.data.as_deref()) {
            ButtonPress::Download(i) => self.sessions.hit(cb.from.id, i),
            ButtonPress::Malformed => None,
            ButtonPress::Other => {
                debug!(data = ?cb.data, "ignoring non-download button");
                return Ok(());
            }
        };
        let Some(hit) = hit else {
            self.messenger
                .send_message(chat_id, messages::INVALID_LINK, None)
                .await?;
            return Ok(());
        };

        self.messenger
            .edit_message_text(chat_id, msg.message_id, messages::EXTRACTING, None)
            .await?;
        self.resolve_and_send(chat_id, &hit.link, &hit.title).await
    }

    #[instrument(skip(self, title))]
    async fn resolve_and_send(&self, chat_id: i64, source: &str, title: &str) -> Result<()> {
        match self.resolver.resolve(source).await {
            Some(link) => self.deliver(chat_id, &link, title).await,
            None => {
                self.messenger
                    .send_message(chat_id, &messages::not_found(source), None)
                    .await?;
                Ok(())
            }
        }
    }

    async fn deliver(&self, chat_id: i64, link: &ResolvedLink, title: &str) -> Result<()> {
        let pdf = match self
            .delivery
            .download(&link.pdf_url, Some(&link.referer), title)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                warn!(url = %link.pdf_url, error = %e, "delivery failed");
                self.messenger
                    .send_message(chat_id, &e.user_message(), None)
                    .await?;
                return Ok(());
            }
        };

        let sent = self
            .messenger
            .send_document(chat_id, pdf.path(), &pdf.file_name())
            .await;
        pdf.discard().await;

        match sent {
            Ok(()) => {
                info!(chat_id, url = %link.pdf_url, via = %link.via, "book sent");
                self.messenger.send_message(chat_id, messages::SENT, None).await?;
            }
            Err(e) => {
                warn!(error = %e, "sendDocument failed");
                self.messenger
                    .send_message(chat_id, &messages::send_failed(&e), None)
                    .await?;
            }
        }
        Ok(())
    }
}

/// Fallback document title: the last path segment of the URL.
fn title_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "book".to_string())
}
