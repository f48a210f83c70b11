#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use contacts_api::config::AppConfig;
use contacts_api::database::MemoryStore;
use contacts_api::validation::RulesTable;
use contacts_api::{app, AppState};

/// A server on its own port with a fresh in-memory store, so ids start at 1
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Result<reqwest::Response> {
        Ok(self.client.put(self.url(path)).json(body).send().await?)
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.delete(self.url(path)).send().await?)
    }

    /// POST and return the new resource path from the Location header
    pub async fn create(&self, path: &str, body: &Value) -> Result<String> {
        let res = self.post_json(path, body).await?;
        anyhow::ensure!(res.status() == reqwest::StatusCode::CREATED, "POST {} returned {}", path, res.status());
        let location = res
            .headers()
            .get(reqwest::header::LOCATION)
            .context("missing Location header")?
            .to_str()?
            .to_string();
        Ok(location)
    }
}

pub async fn spawn_server() -> Result<TestServer> {
    // Pick an unused port for isolation
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let base_url = format!("http://127.0.0.1:{}", port);

    let rules = Arc::new(RulesTable::for_today()?);
    let state = AppState::new(Arc::new(MemoryStore::new()), rules);
    let router = app(state, &AppConfig::development());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("failed to bind port {}", port))?;

    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });

    Ok(TestServer {
        port,
        base_url,
        client: reqwest::Client::new(),
    })
}
