use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode, multipart::Form};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};

use crate::dto::{ErrorResponseDto, LoginRequestDto, LoginResponseDto, MessageResponseDto};
use crate::error::{CmsClientError, CmsClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Таймауты HTTP-клиента.
pub struct HttpOptions {
    /// Таймаут установки соединения.
    pub connect_timeout: Duration,
    /// Таймаут всего запроса.
    pub timeout: Duration,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
/// Транспорт поверх REST API CMS.
pub(crate) struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт HTTP-клиент с базовым URL сервера.
    pub(crate) fn new(base_url: impl Into<String>, options: HttpOptions) -> CmsClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        debug!(%method, path, "sending request");

        let request = self.client.request(method, self.endpoint(path));
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_error(path: &str, response: reqwest::Response) -> (StatusCode, Option<String>) {
        let status = response.status();
        let message = response
            .json::<ErrorResponseDto>()
            .await
            .ok()
            .and_then(ErrorResponseDto::into_message);

        warn!(%status, path, message = message.as_deref().unwrap_or(""), "request failed");
        (status, message)
    }

    async fn decode_error(path: &str, response: reqwest::Response) -> CmsClientError {
        let (status, message) = Self::read_error(path, response).await;
        CmsClientError::from_http_status(status, message)
    }

    async fn execute<TRes>(&self, path: &str, request: RequestBuilder) -> CmsClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(CmsClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(path, response).await);
        }

        response
            .json::<TRes>()
            .await
            .map_err(CmsClientError::from_reqwest)
    }

    /// GET с query-параметрами.
    pub(crate) async fn get_json<TRes>(
        &self,
        path: &str,
        query: &[(&str, String)],
        token: Option<&str>,
    ) -> CmsClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let mut request = self.request(Method::GET, path, token);
        if !query.is_empty() {
            request = request.query(query);
        }
        self.execute(path, request).await
    }

    /// универсальный helper для отправки запросов с json-payload
    pub(crate) async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
        token: Option<&str>,
    ) -> CmsClientResult<TRes>
    where
        TReq: Serialize + ?Sized,
        TRes: DeserializeOwned,
    {
        let request = self.request(method, path, token).json(body);
        self.execute(path, request).await
    }

    /// Запрос, от ответа которого нужно только сообщение сервера.
    ///
    /// Пустое или нестандартное тело ответа ошибкой не считается.
    pub(crate) async fn send_for_message<TReq>(
        &self,
        method: Method,
        path: &str,
        body: Option<&TReq>,
        token: Option<&str>,
    ) -> CmsClientResult<Option<String>>
    where
        TReq: Serialize + ?Sized,
    {
        let mut request = self.request(method, path, token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(CmsClientError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(path, response).await);
        }

        let text = response.text().await.map_err(CmsClientError::from_reqwest)?;
        Ok(serde_json::from_str::<MessageResponseDto>(&text)
            .ok()
            .and_then(|dto| dto.message))
    }

    /// Отправка multipart-формы.
    pub(crate) async fn upload<TRes>(
        &self,
        path: &str,
        form: Form,
        token: Option<&str>,
    ) -> CmsClientResult<TRes>
    where
        TRes: DeserializeOwned,
    {
        let request = self.request(Method::POST, path, token).multipart(form);
        self.execute(path, request).await
    }

    /// Вход: возвращает сырой токен.
    pub(crate) async fn login(&self, username: &str, password: &str) -> CmsClientResult<String> {
        let path = "/api/auth/login";
        let payload = LoginRequestDto { username, password };

        let response = self
            .request(Method::POST, path, None)
            .json(&payload)
            .send()
            .await
            .map_err(CmsClientError::from_reqwest)?;
        if !response.status().is_success() {
            let (status, message) = Self::read_error(path, response).await;
            return Err(CmsClientError::from_login_status(status, message));
        }

        let dto = response
            .json::<LoginResponseDto>()
            .await
            .map_err(CmsClientError::from_reqwest)?;
        Ok(dto.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_normalizes_slashes() {
        let client =
            HttpClient::new("http://localhost:5000/", HttpOptions::default()).expect("client");
        let full = client.endpoint("/api/posts");
        assert_eq!(full, "http://localhost:5000/api/posts");
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let client = HttpClient::new("https://cms.example.com/backend", HttpOptions::default())
            .expect("client");
        assert_eq!(
            client.endpoint("api/tags/list-tags"),
            "https://cms.example.com/backend/api/tags/list-tags"
        );
    }
}
