//! ルーター API クライアント

use crate::error::Result;
use crate::http::{base_url, check, join, traverse_collection};
use gilliam_core::Route;
use reqwest::{Client, Url};

#[derive(Debug, Clone)]
pub struct RouterClient {
    client: Client,
    base: Url,
}

impl RouterClient {
    pub fn new(base: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            base: base_url(base)?,
        })
    }

    pub async fn routes(&self) -> Result<Vec<Route>> {
        traverse_collection(&self.client, join(&self.base, "route")?).await
    }

    pub async fn create(&self, route: &Route) -> Result<Route> {
        let response = self
            .client
            .post(join(&self.base, "route")?)
            .json(route)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let response = self
            .client
            .delete(join(&self.base, &format!("route/{name}"))?)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }
}
