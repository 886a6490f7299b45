//! Article endpoints.

use crate::{
    arguments::{Kwargs, QUERY_ARG, REQUEST_BODY_ARG},
    error::{HandlerError, HandlerResult},
    handler::{date_schema, ApiHandler, ParamType, Reply, Signature},
    middleware::request_id::REQUEST_ID_KEY,
    routes::ApiRoute,
    state::STORAGE_KEY,
};
use articles_common::{now_utc_seconds, parse_date, today_utc};
use articles_domain::{
    Article, ArticleFile, ArticleFileMeta, ArticleFileUpload, NewArticle, ReadArticlesQuery,
    ARTICLES_TABLE, ARTICLE_FILES_TABLE,
};
use articles_infrastructure::{Filters, Record, Storage, ID_FIELD_NAME};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

const CREATED_ARG: &str = "created";

/// Routes served by the article handlers
pub fn routes() -> Vec<ApiRoute> {
    vec![
        ApiRoute::post("/create_article", CreateArticle),
        ApiRoute::get("/read_articles/:created", ReadArticles).path_parameter(
            CREATED_ARG,
            "Creation date (YYYY-MM-DD)",
            Some(json!("2022-04-26")),
        ),
        ApiRoute::post("/upload_article_file", UploadArticleFile).multipart(),
    ]
}

fn to_record<T: Serialize>(value: &T) -> HandlerResult<Record> {
    match serde_json::to_value(value).map_err(HandlerError::internal)? {
        Value::Object(record) => Ok(record),
        other => Err(HandlerError::internal(format!(
            "expected a JSON object to store, got {other}"
        ))),
    }
}

fn from_record<T: DeserializeOwned>(record: Record) -> HandlerResult<T> {
    serde_json::from_value(Value::Object(record)).map_err(HandlerError::internal)
}

/// Create a new article
pub struct CreateArticle;

#[async_trait]
impl ApiHandler for CreateArticle {
    fn name(&self) -> &'static str {
        "create_article"
    }

    fn doc(&self) -> &'static str {
        "Create an article

        The creation date defaults to the current UTC date.
        :swagger_tags: articles"
    }

    fn signature(&self) -> Signature {
        Signature::new()
            .param(REQUEST_BODY_ARG, ParamType::json::<NewArticle>())
            .param(STORAGE_KEY, ParamType::Opaque)
            .returns::<Article>()
    }

    async fn call(&self, kwargs: Kwargs) -> HandlerResult<Reply> {
        let new_article = kwargs
            .body::<NewArticle>(REQUEST_BODY_ARG)?
            .with_default_created(today_utc());
        let storage: Arc<dyn Storage> = kwargs.singleton(STORAGE_KEY)?;

        let record = storage
            .create(ARTICLES_TABLE, to_record(&new_article)?)
            .await?;
        let article: Article = from_record(record)?;

        info!(article_id = %article.id, created = %article.created, "Article created");

        Ok(Reply::json(article))
    }
}

/// Read articles created on a date
pub struct ReadArticles;

#[async_trait]
impl ApiHandler for ReadArticles {
    fn name(&self) -> &'static str {
        "read_articles"
    }

    fn doc(&self) -> &'static str {
        "Read articles created on a date
        :swagger_tags: articles"
    }

    fn signature(&self) -> Signature {
        Signature::new()
            .param(CREATED_ARG, ParamType::Value(date_schema))
            .param(QUERY_ARG, ParamType::query::<ReadArticlesQuery>())
            .param(STORAGE_KEY, ParamType::Opaque)
            .param(REQUEST_ID_KEY, ParamType::Opaque)
            .returns_list::<Article>()
    }

    async fn call(&self, kwargs: Kwargs) -> HandlerResult<Reply> {
        let raw_created: String = kwargs.path(CREATED_ARG)?;
        let created = parse_date(&raw_created).map_err(|err| {
            HandlerError::validation(format!("path parameter '{CREATED_ARG}': {err}"))
        })?;
        let query: ReadArticlesQuery = kwargs.query(QUERY_ARG)?;
        let storage: Arc<dyn Storage> = kwargs.singleton(STORAGE_KEY)?;
        let request_id = kwargs.scoped(REQUEST_ID_KEY)?;

        let mut filters = Filters::new();
        filters.insert(CREATED_ARG.to_string(), json!(created));

        let articles = storage
            .read(ARTICLES_TABLE, Some(&filters))
            .await?
            .into_iter()
            .map(from_record::<Article>)
            .collect::<HandlerResult<Vec<_>>>()?
            .into_iter()
            .filter(|article| query.matches(article))
            .collect::<Vec<_>>();

        debug!(
            request_id = %request_id,
            created = %created,
            count = articles.len(),
            "Articles read"
        );

        Ok(Reply::json(articles))
    }
}

/// Attach a file to an existing article
pub struct UploadArticleFile;

#[async_trait]
impl ApiHandler for UploadArticleFile {
    fn name(&self) -> &'static str {
        "upload_article_file"
    }

    fn doc(&self) -> &'static str {
        "Upload a file for an article

        Expects a `meta` JSON part with the article id and a `file` part.
        Only the file metadata is kept.
        :swagger_tags: articles, files"
    }

    fn signature(&self) -> Signature {
        Signature::new()
            .param(REQUEST_BODY_ARG, ParamType::json::<ArticleFileUpload>())
            .param(STORAGE_KEY, ParamType::Opaque)
            .returns::<ArticleFile>()
    }

    async fn call(&self, kwargs: Kwargs) -> HandlerResult<Reply> {
        let form = kwargs.form(REQUEST_BODY_ARG)?;
        let meta: ArticleFileMeta = form.json("meta")?;
        let file = form.file("file")?;
        let storage: Arc<dyn Storage> = kwargs.singleton(STORAGE_KEY)?;

        let mut filters = Filters::new();
        filters.insert(ID_FIELD_NAME.to_string(), json!(meta.article_id));
        if storage.read(ARTICLES_TABLE, Some(&filters)).await?.is_empty() {
            return Err(HandlerError::validation(format!(
                "article {} does not exist",
                meta.article_id
            )));
        }

        let record = to_record(&json!({
            "article_id": meta.article_id,
            "file_name": file.file_name,
            "file_size": file.file_data.len(),
            "uploaded": now_utc_seconds(),
        }))?;
        let article_file: ArticleFile =
            from_record(storage.create(ARTICLE_FILES_TABLE, record).await?)?;

        info!(
            article_id = %article_file.article_id,
            file_name = %article_file.file_name,
            file_size = article_file.file_size,
            "Article file uploaded"
        );

        Ok(Reply::json(article_file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use articles_testing::{create_test_new_article, test_date};
    use std::collections::HashSet;

    #[test]
    fn test_record_conversion() {
        let new_article = create_test_new_article().with_default_created(test_date());
        let mut record = to_record(&new_article).unwrap();
        record.insert(
            ID_FIELD_NAME.to_string(),
            json!("8a1d2f6e-1c1b-4c56-9a0e-2b7f4c3d5e6f"),
        );

        let article: Article = from_record(record).unwrap();
        assert_eq!(article.header, new_article.header);
        assert_eq!(Some(article.created), new_article.created);
    }

    #[test]
    fn test_non_object_cannot_be_stored() {
        let err = to_record(&vec![1, 2]).unwrap_err();
        assert_eq!(err.error_type(), "InternalError");
    }

    #[test]
    fn test_routes_are_unique() {
        let routes = routes();
        let names: HashSet<_> = routes.iter().map(|route| route.handler.name()).collect();
        let paths: HashSet<_> = routes.iter().map(|route| route.path).collect();
        assert_eq!(routes.len(), 3);
        assert_eq!(names.len(), routes.len());
        assert_eq!(paths.len(), routes.len());
        assert!(routes.iter().any(|route| route.multipart));
    }
}
