use threadlet_api::{
    Comment, CommentApi, CommentId, CommentPage, CommentUpdate, Error, LikeStatus, ListComments,
    NewComment, TargetType, Uuid,
};

/// `CommentApi` over the comment service's REST endpoints
pub struct HttpApi {
    client: reqwest::Client,
    host: String,
    token: Option<String>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct LikeToggle {
    target_type: TargetType,
    target_id: Uuid,
}

fn network(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

/// Turns a non-2xx answer into the error the server described in its body
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.bytes().await.map_err(network)?;
    Err(Error::parse(&body).unwrap_or_else(|err| {
        tracing::debug!(?err, %status, "server error body is not a known error");
        Error::Unknown(format!("server answered {status}"))
    }))
}

async fn decode<R>(resp: reqwest::Response) -> Result<R, Error>
where
    R: for<'de> serde::Deserialize<'de>,
{
    check(resp)
        .await?
        .json()
        .await
        .map_err(|e| match e.is_decode() {
            true => Error::Unknown(format!("parsing server answer: {e}")),
            false => network(e),
        })
}

impl HttpApi {
    pub fn new(host: String, token: Option<String>) -> HttpApi {
        HttpApi {
            client: reqwest::Client::new(),
            host: String::from(host.trim_end_matches('/')),
            token,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let req = self
            .client
            .request(method, format!("{}/api/{}", self.host, path));
        match &self.token {
            Some(tok) => req.bearer_auth(tok),
            None => req,
        }
    }
}

#[async_trait::async_trait]
impl CommentApi for HttpApi {
    async fn list_comments(&mut self, q: &ListComments) -> Result<CommentPage, Error> {
        // the service spells "no parent" as parent 0
        let parent = q
            .parent_comment_id
            .map(|p| p.0.to_string())
            .unwrap_or_else(|| String::from("0"));
        let params = [
            ("targetType", String::from(q.target_type.as_str())),
            ("targetId", q.target_id.0.to_string()),
            ("depth", q.depth.to_string()),
            ("parentCommentId", parent),
            ("orderBy", String::from(q.order_by.as_str())),
            ("desc", q.desc.to_string()),
            ("page", q.page.to_string()),
            ("size", q.size.to_string()),
        ];
        tracing::debug!(?params, "listing comments");
        let resp = self
            .request(reqwest::Method::GET, "comments")
            .query(&params)
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }

    async fn create_comment(&mut self, c: &NewComment) -> Result<Comment, Error> {
        let resp = self
            .request(reqwest::Method::POST, "comments")
            .json(c)
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }

    async fn update_comment(
        &mut self,
        id: CommentId,
        u: &CommentUpdate,
    ) -> Result<Comment, Error> {
        let resp = self
            .request(reqwest::Method::PUT, &format!("comments/{}", id.0))
            .json(u)
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }

    async fn delete_comment(&mut self, id: CommentId) -> Result<(), Error> {
        let resp = self
            .request(reqwest::Method::DELETE, &format!("comments/{}", id.0))
            .send()
            .await
            .map_err(network)?;
        check(resp).await?;
        Ok(())
    }

    async fn toggle_like(
        &mut self,
        target_type: TargetType,
        target_id: Uuid,
    ) -> Result<LikeStatus, Error> {
        let resp = self
            .request(reqwest::Method::POST, "likes/toggle")
            .json(&LikeToggle {
                target_type,
                target_id,
            })
            .send()
            .await
            .map_err(network)?;
        decode(resp).await
    }
}
