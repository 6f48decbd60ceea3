//! 交互式 API 文档
//!
//! 每个服务在自己的前缀下提供 `openapi.json`、Swagger UI（`/docs`）与 ReDoc（`/redoc`）。

use std::collections::BTreeMap;

use axum::{
    Router,
    http::header,
    response::{Html, IntoResponse},
    routing::get,
};
use serde_json::{Map, Value, json};

/// 文档版本
pub const API_VERSION: &str = "1.0.0";

/// 本地开发服务器地址，总是追加在 servers 列表末尾
const LOCAL_SERVER: &str = "http://localhost:8000";

/// 取值为字符串的路径参数，其余路径参数均为整数 id
const STRING_PATH_PARAMS: &[&str] = &["transaction_id"];

/// OpenAPI 文档构建器
#[derive(Debug, Clone)]
pub struct ApiDoc {
    title: String,
    description: String,
    servers: Vec<(String, String)>,
    paths: BTreeMap<String, Map<String, Value>>,
}

impl ApiDoc {
    pub fn new(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            servers: Vec::new(),
            paths: BTreeMap::new(),
        }
    }

    /// 添加服务器：`{base_url}{prefix}` 与本地开发地址
    pub fn servers(mut self, base_url: &str, prefix: &str, description: &str) -> Self {
        self.servers
            .push((format!("{}{}", base_url, prefix), description.to_string()));
        self.servers.push((
            format!("{}{}", LOCAL_SERVER, prefix),
            "Local Development Server".to_string(),
        ));
        self
    }

    /// 登记一个操作
    ///
    /// 路径中的 `{param}` 自动声明为 path 参数
    pub fn operation(self, method: &str, path: &str, summary: &str) -> Self {
        self.add_operation(method, path, summary, None)
    }

    /// 登记一个带 JSON 请求体的操作，`schema` 见 [`object_schema`]
    pub fn operation_with_body(self, method: &str, path: &str, summary: &str, schema: Value) -> Self {
        self.add_operation(method, path, summary, Some(schema))
    }

    fn add_operation(mut self, method: &str, path: &str, summary: &str, body: Option<Value>) -> Self {
        let parameters: Vec<Value> = path_params(path)
            .map(|name| {
                let schema = if STRING_PATH_PARAMS.contains(&name) {
                    json!({ "type": "string" })
                } else {
                    json!({ "type": "integer", "format": "int64" })
                };
                json!({
                    "name": name,
                    "in": "path",
                    "required": true,
                    "schema": schema
                })
            })
            .collect();

        let mut op = json!({
            "summary": summary,
            "responses": { "200": { "description": "Successful Response" } }
        });
        if !parameters.is_empty() {
            op["parameters"] = Value::Array(parameters);
        }
        if let Some(schema) = body {
            op["requestBody"] = json!({
                "required": true,
                "content": { "application/json": { "schema": schema } }
            });
        }

        self.paths
            .entry(path.to_string())
            .or_default()
            .insert(method.to_lowercase(), op);
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// 渲染为 OpenAPI 3.0 JSON
    pub fn to_json(&self) -> Value {
        let servers: Vec<Value> = self
            .servers
            .iter()
            .map(|(url, description)| json!({ "url": url, "description": description }))
            .collect();

        json!({
            "openapi": "3.0.3",
            "info": {
                "title": self.title,
                "description": self.description,
                "version": API_VERSION,
            },
            "servers": servers,
            "paths": self.paths,
        })
    }
}

/// 请求体对象的 schema
///
/// `fields` 依次为字段名、JSON 类型与是否必填
pub fn object_schema(fields: &[(&str, &str, bool)]) -> Value {
    let properties: Map<String, Value> = fields
        .iter()
        .map(|(name, ty, _)| (name.to_string(), json!({ "type": ty })))
        .collect();
    let required: Vec<&str> = fields
        .iter()
        .filter(|(_, _, required)| *required)
        .map(|(name, _, _)| *name)
        .collect();

    let mut schema = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn path_params(path: &str) -> impl Iterator<Item = &str> {
    path.split('/')
        .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
}

/// 构建文档路由
///
/// `prefix` 为服务挂载前缀，页面据此引用 `{prefix}/openapi.json`
pub fn docs_routes<S>(prefix: &str, doc: &ApiDoc) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let spec = doc.to_json().to_string();
    let spec_url = format!("{}/openapi.json", prefix);
    let swagger = swagger_ui_html(doc.title(), &spec_url);
    let redoc = redoc_html(doc.title(), &spec_url);

    Router::new()
        .route(
            "/openapi.json",
            get(move || {
                std::future::ready(
                    ([(header::CONTENT_TYPE, "application/json")], spec.clone()).into_response(),
                )
            }),
        )
        .route("/docs", get(move || std::future::ready(Html(swagger.clone()))))
        .route("/redoc", get(move || std::future::ready(Html(redoc.clone()))))
}

fn swagger_ui_html(title: &str, spec_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>{title} - Swagger UI</title>
<link type="text/css" rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui.css">
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
<script>
const ui = SwaggerUIBundle({{
    url: '{spec_url}',
    dom_id: '#swagger-ui',
    layout: 'BaseLayout',
    deepLinking: true,
    presets: [SwaggerUIBundle.presets.apis, SwaggerUIBundle.SwaggerUIStandalonePreset],
}})
</script>
</body>
</html>"#
    )
}

fn redoc_html(title: &str, spec_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>{title} - ReDoc</title>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>body {{ margin: 0; padding: 0; }}</style>
</head>
<body>
<redoc spec-url="{spec_url}"></redoc>
<script src="https://cdn.jsdelivr.net/npm/redoc@2/bundles/redoc.standalone.js"></script>
</body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn sample_doc() -> ApiDoc {
        ApiDoc::new("Sample API", "Sample service")
            .servers("https://demo.example.com", "/sample", "Sample Server")
            .operation("GET", "/items", "List items")
            .operation("GET", "/items/{item_id}", "Get item")
            .operation("DELETE", "/items/{item_id}", "Delete item")
            .operation_with_body(
                "POST",
                "/items",
                "Create item",
                object_schema(&[("name", "string", true), ("price", "number", false)]),
            )
            .operation("GET", "/transactions/{transaction_id}", "Get transaction")
    }

    #[test]
    fn test_openapi_document() {
        let doc = sample_doc().to_json();

        assert_eq!(doc["info"]["title"], "Sample API");
        assert_eq!(doc["info"]["version"], API_VERSION);
        assert_eq!(doc["servers"][0]["url"], "https://demo.example.com/sample");
        assert_eq!(doc["servers"][1]["url"], "http://localhost:8000/sample");

        let item = &doc["paths"]["/items/{item_id}"];
        assert_eq!(item["get"]["summary"], "Get item");
        assert_eq!(item["delete"]["parameters"][0]["name"], "item_id");
        assert!(doc["paths"]["/items"]["get"].get("parameters").is_none());
    }

    #[test]
    fn test_path_param_types() {
        let doc = sample_doc().to_json();

        let id = &doc["paths"]["/items/{item_id}"]["get"]["parameters"][0]["schema"];
        assert_eq!(id["type"], "integer");
        let token = &doc["paths"]["/transactions/{transaction_id}"]["get"]["parameters"][0]["schema"];
        assert_eq!(token["type"], "string");
    }

    #[test]
    fn test_request_body_schema() {
        let doc = sample_doc().to_json();

        let create = &doc["paths"]["/items"]["post"];
        assert_eq!(create["requestBody"]["required"], true);
        let schema = &create["requestBody"]["content"]["application/json"]["schema"];
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["price"]["type"], "number");
        assert_eq!(schema["required"], json!(["name"]));
        assert!(doc["paths"]["/items"]["get"].get("requestBody").is_none());
    }

    #[tokio::test]
    async fn test_docs_routes() {
        let app: Router = docs_routes("/sample", &sample_doc());

        for (uri, needle) in [
            ("/docs", "swagger-ui"),
            ("/redoc", "/sample/openapi.json"),
            ("/openapi.json", "\"openapi\""),
        ] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);

            let body = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let text = String::from_utf8(body.to_vec()).unwrap();
            assert!(text.contains(needle), "{} should contain {}", uri, needle);
        }
    }
}
