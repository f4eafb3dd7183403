use std::sync::Arc;

use api_types::{
    Id,
    auth::{LoginRequest, LoginResponse},
    coffee::Coffee,
};
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    Tracker,
    error::{ClientError, Result},
    token::TokenStore,
};

/// Default address of the REST backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api";

/// Spring-style error body. Either field may be missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorResponse {
    message: Option<String>,
    error: Option<String>,
}

impl ErrorResponse {
    fn into_message(self) -> Option<String> {
        self.message
            .filter(|message| !message.is_empty())
            .or(self.error)
    }
}

/// Typed REST client.
///
/// Every request carries the stored bearer token, if any. A `401` answer
/// clears the stored token before being reported as
/// [`ClientError::Unauthorized`].
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    tokens: Arc<dyn TokenStore>,
}

impl Client {
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> Result<Self> {
        // `Url::join` drops the last segment unless the base ends with '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|err| ClientError::InvalidUrl(err.to_string()))?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        Ok(match self.tokens.load()? {
            Some(token) => request.bearer_auth(token),
            None => request,
        })
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response> {
        let res = self.authorize(request)?.send().await?;
        self.check(res).await
    }

    async fn check(&self, res: Response) -> Result<Response> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        tracing::debug!("{} answered {status}", res.url());

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("backend rejected the session, clearing stored token");
            if let Err(err) = self.tokens.clear() {
                tracing::error!("failed to clear stored token: {err}");
            }
            return Err(ClientError::Unauthorized);
        }

        let body = match res.json::<ErrorResponse>().await {
            Ok(body) => body.into_message(),
            Err(err) => {
                tracing::debug!("error body read failed: {err}");
                None
            }
        }
        .unwrap_or_else(|| "unknown error".to_string());

        let err = match status {
            StatusCode::FORBIDDEN => ClientError::Forbidden,
            StatusCode::NOT_FOUND => ClientError::NotFound,
            StatusCode::CONFLICT => ClientError::Conflict(body),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ClientError::Validation(body)
            }
            _ => ClientError::Server(body),
        };
        Err(err)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.http.get(self.endpoint(path)?);
        Ok(self.dispatch(request).await?.json::<T>().await?)
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.http.post(self.endpoint(path)?).json(body);
        Ok(self.dispatch(request).await?.json::<T>().await?)
    }

    async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.http.put(self.endpoint(path)?).json(body);
        Ok(self.dispatch(request).await?.json::<T>().await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let request = self.http.delete(self.endpoint(path)?);
        self.dispatch(request).await?;
        Ok(())
    }

    /// Exchange credentials for a token and store it.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let payload = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let res: LoginResponse = self.post("auth/login", &payload).await?;
        self.tokens.save(&res.token)?;
        tracing::info!("signed in as {username}");
        Ok(res)
    }

    pub fn logout(&self) -> Result<()> {
        self.tokens.clear()
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.tokens.load()?.is_some())
    }

    pub async fn list_owners<V: Tracker>(&self) -> Result<Vec<V::Owner>> {
        self.get(V::OWNERS).await
    }

    pub async fn get_owner<V: Tracker>(&self, id: Id) -> Result<V::Owner> {
        self.get(&format!("{}/{id}", V::OWNERS)).await
    }

    pub async fn create_owner<V: Tracker>(&self, input: &V::OwnerInput) -> Result<V::Owner> {
        self.post(V::OWNERS, input).await
    }

    pub async fn update_owner<V: Tracker>(
        &self,
        id: Id,
        input: &V::OwnerInput,
    ) -> Result<V::Owner> {
        self.put(&format!("{}/{id}", V::OWNERS), input).await
    }

    /// The backend also removes every child of the owner.
    pub async fn delete_owner<V: Tracker>(&self, id: Id) -> Result<()> {
        self.delete(&format!("{}/{id}", V::OWNERS)).await
    }

    pub async fn list_children<V: Tracker>(&self) -> Result<Vec<V::Child>> {
        self.get(V::CHILDREN).await
    }

    pub async fn get_child<V: Tracker>(&self, id: Id) -> Result<V::Child> {
        self.get(&format!("{}/{id}", V::CHILDREN)).await
    }

    pub async fn list_children_of<V: Tracker>(&self, owner_id: Id) -> Result<Vec<V::Child>> {
        self.get(&format!("{}/{}/{owner_id}", V::CHILDREN, V::OWNER_SCOPE))
            .await
    }

    pub async fn create_child<V: Tracker>(&self, input: &V::ChildInput) -> Result<V::Child> {
        self.post(V::CHILDREN, input).await
    }

    pub async fn update_child<V: Tracker>(
        &self,
        id: Id,
        input: &V::ChildInput,
    ) -> Result<V::Child> {
        self.put(&format!("{}/{id}", V::CHILDREN), input).await
    }

    pub async fn delete_child<V: Tracker>(&self, id: Id) -> Result<()> {
        self.delete(&format!("{}/{id}", V::CHILDREN)).await
    }

    pub async fn summary<V: Tracker>(&self, params: &V::SummaryParams) -> Result<V::Summary> {
        let mut url = self.endpoint(V::SUMMARY)?;
        let query = V::summary_query(params);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        let request = self.http.get(url);
        Ok(self.dispatch(request).await?.json::<V::Summary>().await?)
    }

    /// Drink `amount` grams from a bag; the backend persists the new weight.
    pub async fn consume_coffee(&self, id: Id, amount: Decimal) -> Result<Coffee> {
        let mut url = self.endpoint(&format!("coffees/{id}/consume"))?;
        url.query_pairs_mut()
            .append_pair("amount", &amount.to_string());
        let request = self.http.post(url);
        Ok(self.dispatch(request).await?.json::<Coffee>().await?)
    }
}
