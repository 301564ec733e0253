use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, Response, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    dao::{
        game_store::GameStore,
        storage::{StorageError, StorageResult},
    },
    state::{lobby::LobbyCode, snapshot::Snapshot},
};

use super::{
    config::CouchConfig,
    error::{CouchDaoError, CouchResult},
    models::{CouchSessionDocument, session_doc_id},
};

/// `GameStore` backed by a CouchDB database over HTTP.
#[derive(Clone)]
pub struct CouchGameStore {
    client: Client,
    base_url: Arc<str>,
    database: Arc<str>,
    auth: Option<(Arc<str>, Arc<str>)>,
}

impl CouchGameStore {
    /// Establish a connection to CouchDB and ensure the database exists.
    pub async fn connect(config: CouchConfig) -> CouchResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| CouchDaoError::ClientBuilder { source })?;

        let base_url = Arc::<str>::from(config.base_url.trim_end_matches('/'));
        let database = Arc::<str>::from(config.database);
        let auth = config
            .username
            .zip(config.password)
            .map(|(u, p)| (Arc::<str>::from(u), Arc::<str>::from(p)));

        let store = Self {
            client,
            base_url,
            database,
            auth,
        };

        store.ensure_database().await?;
        Ok(store)
    }

    fn database_url(&self) -> String {
        format!("{}/{}", self.base_url, self.database)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.auth {
            Some((ref user, ref pass)) => builder.basic_auth(user.as_ref(), Some(pass.as_ref())),
            None => builder,
        }
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.database_url(), path);
        self.authorize(self.client.request(method, url))
    }

    async fn ensure_database(&self) -> CouchResult<()> {
        let database = self.database.to_string();
        let url = self.database_url();

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(|source| CouchDaoError::DatabaseQuery {
                database: database.clone(),
                source,
            })?;

        match response.status() {
            StatusCode::OK => Ok(()),
            StatusCode::NOT_FOUND => {
                let create = self
                    .authorize(self.client.put(&url))
                    .send()
                    .await
                    .map_err(|source| CouchDaoError::DatabaseCreate {
                        database: database.clone(),
                        source,
                    })?;
                if create.status().is_success() {
                    Ok(())
                } else {
                    Err(CouchDaoError::DatabaseStatus {
                        database,
                        status: create.status(),
                    })
                }
            }
            other => Err(CouchDaoError::DatabaseStatus {
                database,
                status: other,
            }),
        }
    }

    async fn send(&self, doc_id: &str, builder: reqwest::RequestBuilder) -> CouchResult<Response> {
        builder
            .send()
            .await
            .map_err(|source| CouchDaoError::RequestSend {
                path: doc_id.to_string(),
                source,
            })
    }

    /// Fetch a document by id, `None` on 404.
    async fn fetch_document<T>(&self, doc_id: &str) -> CouchResult<Option<T>>
    where
        T: DeserializeOwned,
    {
        let response = self.send(doc_id, self.request(Method::GET, doc_id)).await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            });
        }
        let document = response
            .json::<T>()
            .await
            .map_err(|source| CouchDaoError::DecodeResponse {
                path: doc_id.to_string(),
                source,
            })?;
        Ok(Some(document))
    }

    async fn put_document<T>(&self, doc_id: &str, document: &T) -> CouchResult<()>
    where
        T: ?Sized + Serialize,
    {
        let response = self
            .send(doc_id, self.request(Method::PUT, doc_id).json(document))
            .await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            status => Err(CouchDaoError::RequestStatus {
                path: doc_id.to_string(),
                status,
            }),
        }
    }
}

impl GameStore for CouchGameStore {
    fn get_document(&self, code: &LobbyCode) -> BoxFuture<'static, StorageResult<Option<Snapshot>>> {
        let store = self.clone();
        let doc_id = session_doc_id(code);
        Box::pin(async move {
            let maybe_doc = store
                .fetch_document::<CouchSessionDocument>(&doc_id)
                .await?;
            Ok(maybe_doc.map(|doc| doc.snapshot))
        })
    }

    fn create_document(
        &self,
        code: &LobbyCode,
        snapshot: Snapshot,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let doc = CouchSessionDocument::new(code, snapshot, None);
        Box::pin(async move {
            match store.put_document(&doc.id, &doc).await {
                Ok(()) => Ok(()),
                Err(err) if err.is_conflict() => Err(StorageError::already_exists(doc.id)),
                Err(err) => Err(err.into()),
            }
        })
    }

    fn replace_document(
        &self,
        code: &LobbyCode,
        snapshot: Snapshot,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let mut doc = CouchSessionDocument::new(code, snapshot, None);
        Box::pin(async move {
            let Some(existing) = store
                .fetch_document::<CouchSessionDocument>(&doc.id)
                .await?
            else {
                return Err(StorageError::not_found(doc.id));
            };
            doc.rev = existing.rev;
            debug!(doc_id = %doc.id, rev = ?doc.rev, "replacing session document");
            store.put_document(&doc.id, &doc).await.map_err(Into::into)
        })
    }

    fn delete_document(&self, code: &LobbyCode) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let doc_id = session_doc_id(code);
        Box::pin(async move {
            let Some(existing) = store
                .fetch_document::<CouchSessionDocument>(&doc_id)
                .await?
            else {
                return Ok(());
            };
            let Some(rev) = existing.rev else {
                return Ok(());
            };
            let response = store
                .send(
                    &doc_id,
                    store.request(Method::DELETE, &doc_id).query(&[("rev", rev)]),
                )
                .await?;
            match response.status() {
                status if status.is_success() || status == StatusCode::NOT_FOUND => {
                    debug!(%doc_id, "deleted session document");
                    Ok(())
                }
                status => Err(CouchDaoError::RequestStatus {
                    path: doc_id,
                    status,
                }
                .into()),
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let url = store.database_url();
            let response = store.send(&url, store.authorize(store.client.get(&url))).await?;
            match response.status() {
                status if status.is_success() => Ok(()),
                status => Err(CouchDaoError::RequestStatus { path: url, status }.into()),
            }
        })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.ensure_database().await.map_err(Into::into) })
    }
}
