//! Async operations for the TUI
//!
//! Uses channels to communicate between the sync TUI loop and async tasks.

use tokio::sync::mpsc;

use crate::api::bluesky::{BlueskyClient, DEFAULT_PDS_URL};
use crate::api::get_client;
use crate::auth;
use crate::compose::{SubmitRequest, submit};
use crate::error::ComposeError;
use crate::media::CompressOptions;
use crate::models::Account;
use crate::richtext::{FacetCache, RichText};

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone)]
pub enum AsyncCommand {
    /// Log in with the stored app password of `account`
    Login { account: Account },
    /// Detect and resolve facets in `text`
    DetectFacets { text: String },
    /// Publish a post
    Submit {
        request: SubmitRequest,
        opts: CompressOptions,
    },
    /// Shutdown the worker
    Shutdown,
}

/// Results sent back from the async worker to the TUI
#[derive(Debug)]
pub enum AsyncResult {
    /// Session established
    LoggedIn { handle: String },
    /// Facets for a piece of text
    FacetsDetected { rich_text: RichText },
    /// Post created
    Posted { url: String },
    /// Submit failed; the draft stays as is
    PostFailed { error: ComposeError },
    /// An error occurred
    Error { message: String },
    /// Status message (for progress updates)
    Status { message: String },
}

/// Channel handles for communicating with the async worker
pub struct AsyncHandle {
    /// Send commands to the worker
    pub cmd_tx: mpsc::Sender<AsyncCommand>,
    /// Receive results from the worker
    pub result_rx: mpsc::Receiver<AsyncResult>,
}

/// Worker-side session
struct Worker {
    account: Option<Account>,
    client: Option<BlueskyClient>,
    cache: FacetCache,
}

impl Worker {
    /// Log in as the current account if that has not happened yet
    async fn ensure_login(&mut self) -> Result<(), String> {
        if self.client.is_some() {
            return Ok(());
        }
        let Some(account) = &self.account else {
            return Err("No account configured. Run `plume auth`".to_string());
        };

        let password = match auth::get_credentials(account) {
            Ok(Some(p)) => p,
            Ok(None) => return Err(format!("No credentials for {}", account.full_handle())),
            Err(e) => return Err(format!("Auth error for {}: {}", account.full_handle(), e)),
        };

        let client = get_client(account, &password)
            .await
            .map_err(|e| format!("Login failed for {}: {}", account.full_handle(), e))?;
        self.client = Some(client);
        Ok(())
    }

    fn anonymous(&self) -> BlueskyClient {
        let pds_url = self
            .account
            .as_ref()
            .map_or(DEFAULT_PDS_URL, |a| a.pds_url.as_str());
        BlueskyClient::anonymous(pds_url)
    }
}

/// Spawn the async worker and return handles
pub fn spawn_worker(cache: FacetCache) -> AsyncHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<AsyncCommand>(32);
    let (result_tx, result_rx) = mpsc::channel::<AsyncResult>(32);

    tokio::spawn(async move {
        let mut worker = Worker {
            account: None,
            client: None,
            cache,
        };

        while let Some(cmd) = cmd_rx.recv().await {
            match cmd {
                AsyncCommand::Shutdown => break,
                AsyncCommand::Login { account } => {
                    worker.account = Some(account);
                    worker.client = None;
                    handle_login(&result_tx, &mut worker).await;
                }
                AsyncCommand::DetectFacets { text } => {
                    handle_detect(&result_tx, &worker, text).await;
                }
                AsyncCommand::Submit { request, opts } => {
                    handle_submit(&result_tx, &mut worker, request, opts).await;
                }
            }
        }
    });

    AsyncHandle { cmd_tx, result_rx }
}

async fn handle_login(result_tx: &mpsc::Sender<AsyncResult>, worker: &mut Worker) {
    match worker.ensure_login().await {
        Ok(()) => {
            let handle = worker
                .client
                .as_ref()
                .map(|c| c.handle().to_string())
                .unwrap_or_default();
            let _ = result_tx.send(AsyncResult::LoggedIn { handle }).await;
        }
        Err(message) => {
            tracing::warn!("{}", message);
            let _ = result_tx.send(AsyncResult::Error { message }).await;
        }
    }
}

async fn handle_detect(result_tx: &mpsc::Sender<AsyncResult>, worker: &Worker, text: String) {
    let rich_text = if let Some(cached) = worker.cache.get(&text) {
        cached
    } else {
        let mut rich_text = RichText::new(text);
        match &worker.client {
            Some(client) => rich_text.detect_facets(client).await,
            None => rich_text.detect_facets(&worker.anonymous()).await,
        }
        worker.cache.insert(rich_text.clone());
        rich_text
    };

    let _ = result_tx
        .send(AsyncResult::FacetsDetected { rich_text })
        .await;
}

async fn handle_submit(
    result_tx: &mpsc::Sender<AsyncResult>,
    worker: &mut Worker,
    request: SubmitRequest,
    opts: CompressOptions,
) {
    let _ = result_tx
        .send(AsyncResult::Status {
            message: "Posting...".to_string(),
        })
        .await;

    if let Err(message) = worker.ensure_login().await {
        tracing::warn!("{}", message);
    }

    let result = match &worker.client {
        Some(client) => submit(client, request, opts)
            .await
            .map(|outcome| outcome.post.web_url(client.handle())),
        None => Err(ComposeError::NotLoggedIn),
    };

    let message = match result {
        Ok(url) => AsyncResult::Posted { url },
        Err(error) => {
            tracing::error!("Submit failed: {:?}", error);
            AsyncResult::PostFailed { error }
        }
    };
    let _ = result_tx.send(message).await;
}
