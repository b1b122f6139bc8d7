//! In-memory directory endpoint.
//!
//! [`InMemoryDirectory`] answers the same paths and query options as the remote
//! groups API, backed by a map guarded by an async `RwLock`. It is meant for
//! tests, benchmarks and demos:
//!
//! * `/groups` collection with `POST`, `$filter`, `$select`, `$top` and
//!   continuation links
//! * `/groups/{id}` with `GET`, `PATCH` and `DELETE`
//! * `/groups/{id}/{members|owners}` listing and `$ref` add/remove
//! * `/directoryObjects/{id}/memberOf` listing
//!
//! Like the remote API, string equality in filters is case-insensitive, `id` is
//! always part of a projection, removing an absent reference answers
//! `NotFound` and adding a present one answers `Conflict`.
//!
//! Every request is recorded so tests can assert on the exact calls issued, and
//! failures can be injected per method and path fragment.

use crate::endpoint::{DirectoryEndpoint, ODataQuery, Page};
use crate::error::{EndpointError, EndpointResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

const DEFAULT_PAGE_SIZE: usize = 100;
const SKIP_TOKEN: &str = "$skiptoken=";

/// HTTP method of a recorded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Patch => "PATCH",
            RequestMethod::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A request as seen by the in-memory directory.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: RequestMethod,
    pub path: String,
    pub query: String,
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct StoredGroup {
    body: Map<String, Value>,
    members: Vec<String>,
    owners: Vec<String>,
}

impl StoredGroup {
    fn relation(&self, name: &str) -> Option<&Vec<String>> {
        match name {
            "members" => Some(&self.members),
            "owners" => Some(&self.owners),
            _ => None,
        }
    }

    fn relation_mut(&mut self, name: &str) -> Option<&mut Vec<String>> {
        match name {
            "members" => Some(&mut self.members),
            "owners" => Some(&mut self.owners),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct InjectedFailure {
    method: RequestMethod,
    path_fragment: String,
    error: EndpointError,
}

#[derive(Debug, Default)]
struct DirectoryState {
    groups: BTreeMap<String, StoredGroup>,
    objects: BTreeMap<String, Value>,
    requests: Vec<RecordedRequest>,
    failures: Vec<InjectedFailure>,
}

impl DirectoryState {
    /// Record a request and surface any injected failure for it.
    fn record(
        &mut self,
        method: RequestMethod,
        path: &str,
        query: String,
        body: Option<&Value>,
    ) -> EndpointResult<()> {
        self.requests.push(RecordedRequest {
            method,
            path: path.to_string(),
            query,
            body: body.cloned(),
        });

        match self
            .failures
            .iter()
            .find(|failure| failure.method == method && path.contains(&failure.path_fragment))
        {
            Some(failure) => Err(failure.error.clone()),
            None => Ok(()),
        }
    }

    fn group(&self, id: &str, path: &str) -> EndpointResult<&StoredGroup> {
        self.groups
            .get(id)
            .ok_or_else(|| EndpointError::not_found(path))
    }

    fn group_mut(&mut self, id: &str, path: &str) -> EndpointResult<&mut StoredGroup> {
        self.groups
            .get_mut(id)
            .ok_or_else(|| EndpointError::not_found(path))
    }

    fn object_summary(&self, id: &str) -> Value {
        self.objects.get(id).cloned().unwrap_or_else(|| {
            let mut summary = Map::new();
            summary.insert("id".to_string(), Value::String(id.to_string()));
            Value::Object(summary)
        })
    }
}

/// Thread-safe in-memory implementation of [`DirectoryEndpoint`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a non-group directory object (e.g. a user) that can be referenced.
    pub async fn insert_object(&self, object: Value) -> Option<String> {
        let id = object.get("id")?.as_str()?.to_string();
        self.state.write().await.objects.insert(id.clone(), object);
        Some(id)
    }

    /// Insert a group directly, bypassing request recording and checks.
    pub async fn insert_group(&self, mut body: Map<String, Value>) -> String {
        let id = match body.get("id").and_then(Value::as_str) {
            Some(id) => id.to_string(),
            None => uuid::Uuid::new_v4().to_string(),
        };
        body.insert("id".to_string(), Value::String(id.clone()));
        self.state.write().await.groups.insert(
            id.clone(),
            StoredGroup {
                body,
                ..Default::default()
            },
        );
        id
    }

    /// Current stored body of a group.
    pub async fn group(&self, id: &str) -> Option<Value> {
        let state = self.state.read().await;
        state
            .groups
            .get(id)
            .map(|group| Value::Object(group.body.clone()))
    }

    pub async fn members(&self, id: &str) -> Vec<String> {
        let state = self.state.read().await;
        state
            .groups
            .get(id)
            .map(|group| group.members.clone())
            .unwrap_or_default()
    }

    pub async fn owners(&self, id: &str) -> Vec<String> {
        let state = self.state.read().await;
        state
            .groups
            .get(id)
            .map(|group| group.owners.clone())
            .unwrap_or_default()
    }

    pub async fn group_count(&self) -> usize {
        self.state.read().await.groups.len()
    }

    /// All requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<RecordedRequest> {
        self.state.read().await.requests.clone()
    }

    /// Number of recorded requests with the given method.
    pub async fn request_count(&self, method: RequestMethod) -> usize {
        let state = self.state.read().await;
        state
            .requests
            .iter()
            .filter(|request| request.method == method)
            .count()
    }

    pub async fn clear_requests(&self) {
        self.state.write().await.requests.clear();
    }

    /// Answer every matching request with `error` until failures are cleared.
    pub async fn fail_requests(
        &self,
        method: RequestMethod,
        path_fragment: impl Into<String>,
        error: EndpointError,
    ) {
        self.state.write().await.failures.push(InjectedFailure {
            method,
            path_fragment: path_fragment.into(),
            error,
        });
    }

    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn is_relation(name: &str) -> bool {
    name == "members" || name == "owners"
}

/// Keep selected fields; `id` is always returned.
fn project(body: &Map<String, Value>, select: &[String]) -> Value {
    if select.is_empty() {
        return Value::Object(body.clone());
    }
    let projected = body
        .iter()
        .filter(|(key, _)| key.as_str() == "id" || select.iter().any(|field| field == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    Value::Object(projected)
}

fn skip_from_link(next_link: Option<&str>) -> usize {
    next_link
        .and_then(|link| link.split_once(SKIP_TOKEN))
        .and_then(|(_, rest)| rest.split('&').next())
        .and_then(|token| token.parse().ok())
        .unwrap_or(0)
}

impl DirectoryEndpoint for InMemoryDirectory {
    async fn create(&self, path: &str, body: Value) -> EndpointResult<Value> {
        let mut state = self.state.write().await;
        state.record(RequestMethod::Post, path, String::new(), Some(&body))?;

        if segments(path) != ["groups"] {
            return Err(EndpointError::bad_request(path, "Unsupported create target"));
        }
        let Value::Object(mut body) = body else {
            return Err(EndpointError::bad_request(path, "Body must be a JSON object"));
        };
        if let Some(relation) = body.keys().find(|key| is_relation(key)) {
            return Err(EndpointError::bad_request(
                path,
                format!("Relationship '{}' cannot be set in the resource body", relation),
            ));
        }

        let id = uuid::Uuid::new_v4().to_string();
        body.insert("id".to_string(), Value::String(id.clone()));
        body.insert(
            "createdDateTime".to_string(),
            Value::String(chrono::Utc::now().to_rfc3339()),
        );
        let created = Value::Object(body.clone());
        state.groups.insert(
            id,
            StoredGroup {
                body,
                ..Default::default()
            },
        );
        Ok(created)
    }

    async fn create_no_content(&self, path: &str, body: Value) -> EndpointResult<()> {
        let mut state = self.state.write().await;
        state.record(RequestMethod::Post, path, String::new(), Some(&body))?;

        let parts = segments(path);
        let ["groups", group_id, relation, "$ref"] = parts.as_slice() else {
            return Err(EndpointError::bad_request(path, "Unsupported reference target"));
        };
        if !is_relation(relation) {
            return Err(EndpointError::bad_request(path, "Unknown relationship"));
        }
        let reference = body
            .get("@odata.id")
            .and_then(Value::as_str)
            .ok_or_else(|| EndpointError::bad_request(path, "Missing '@odata.id' reference"))?;
        let foreign_id = reference
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| EndpointError::bad_request(path, "Malformed reference"))?
            .to_string();

        let group = state.group_mut(group_id, path)?;
        let Some(related) = group.relation_mut(relation) else {
            return Err(EndpointError::bad_request(path, "Unknown relationship"));
        };
        if related.contains(&foreign_id) {
            return Err(EndpointError::conflict(
                path,
                "One or more added object references already exist",
            ));
        }
        related.push(foreign_id);
        Ok(())
    }

    async fn update_no_content(&self, path: &str, body: Value) -> EndpointResult<()> {
        let mut state = self.state.write().await;
        state.record(RequestMethod::Patch, path, String::new(), Some(&body))?;

        let parts = segments(path);
        let ["groups", group_id] = parts.as_slice() else {
            return Err(EndpointError::bad_request(path, "Unsupported update target"));
        };
        let Value::Object(changes) = body else {
            return Err(EndpointError::bad_request(path, "Body must be a JSON object"));
        };
        if changes.contains_key("id") {
            return Err(EndpointError::bad_request(path, "Property 'id' is read-only"));
        }
        if let Some(relation) = changes.keys().find(|key| is_relation(key)) {
            return Err(EndpointError::bad_request(
                path,
                format!("Relationship '{}' cannot be set in the resource body", relation),
            ));
        }

        let group = state.group_mut(group_id, path)?;
        for (key, value) in changes {
            if value.is_null() {
                group.body.remove(&key);
            } else {
                group.body.insert(key, value);
            }
        }
        Ok(())
    }

    async fn delete(&self, path: &str) -> EndpointResult<()> {
        let mut state = self.state.write().await;
        state.record(RequestMethod::Delete, path, String::new(), None)?;

        match segments(path).as_slice() {
            ["groups", group_id] => state
                .groups
                .remove(*group_id)
                .map(|_| ())
                .ok_or_else(|| EndpointError::not_found(path)),
            ["groups", group_id, relation, foreign_id, "$ref"] if is_relation(relation) => {
                let group = state.group_mut(group_id, path)?;
                let related = group
                    .relation_mut(relation)
                    .ok_or_else(|| EndpointError::not_found(path))?;
                let position = related
                    .iter()
                    .position(|id| id == foreign_id)
                    .ok_or_else(|| EndpointError::not_found(path))?;
                related.remove(position);
                Ok(())
            }
            _ => Err(EndpointError::bad_request(path, "Unsupported delete target")),
        }
    }

    async fn get(&self, path: &str, query: &ODataQuery) -> EndpointResult<Value> {
        let mut state = self.state.write().await;
        state.record(RequestMethod::Get, path, query.to_query_string(), None)?;

        match segments(path).as_slice() {
            ["groups", group_id] => {
                let group = state.group(group_id, path)?;
                Ok(project(&group.body, query.select()))
            }
            ["users" | "directoryObjects", object_id] => match state.objects.get(*object_id) {
                Some(Value::Object(body)) => Ok(project(body, query.select())),
                _ => Err(EndpointError::not_found(path)),
            },
            _ => Err(EndpointError::bad_request(path, "Unsupported read target")),
        }
    }

    async fn list_page(
        &self,
        path: &str,
        query: &ODataQuery,
        next_link: Option<&str>,
    ) -> EndpointResult<Page> {
        let mut state = self.state.write().await;
        let recorded_query = match next_link {
            Some(link) => link.to_string(),
            None => query.to_query_string(),
        };
        state.record(RequestMethod::Get, path, recorded_query, None)?;

        let filter = query
            .filter()
            .map(|expression| {
                filter::parse(expression).map_err(|message| {
                    EndpointError::bad_request(path, format!("Invalid filter: {}", message))
                })
            })
            .transpose()?;

        let candidates: Vec<Value> = match segments(path).as_slice() {
            ["groups"] => state
                .groups
                .values()
                .map(|group| Value::Object(group.body.clone()))
                .collect(),
            ["groups", group_id, relation] if is_relation(relation) => {
                let group = state.group(group_id, path)?;
                group
                    .relation(relation)
                    .map(|ids| ids.iter().map(|id| state.object_summary(id)).collect())
                    .unwrap_or_default()
            }
            ["users" | "directoryObjects", object_id, "memberOf", rest @ ..]
                if rest.is_empty() || rest == ["microsoft.graph.group"] =>
            {
                state
                    .groups
                    .values()
                    .filter(|group| group.members.iter().any(|id| id == object_id))
                    .map(|group| Value::Object(group.body.clone()))
                    .collect()
            }
            _ => return Err(EndpointError::bad_request(path, "Unsupported list target")),
        };

        let matching: Vec<Value> = candidates
            .into_iter()
            .filter(|item| filter.as_ref().is_none_or(|expr| expr.matches(item)))
            .collect();

        let skip = skip_from_link(next_link);
        let top = query.top().map(|top| top as usize).unwrap_or(DEFAULT_PAGE_SIZE).max(1);
        let items: Vec<Value> = matching
            .iter()
            .skip(skip)
            .take(top)
            .map(|item| match item {
                Value::Object(body) => project(body, query.select()),
                other => other.clone(),
            })
            .collect();

        let next = skip + items.len();
        let next_link = (next < matching.len()).then(|| format!("{}?{}{}", path, SKIP_TOKEN, next));
        Ok(Page::new(items, next_link))
    }
}

/// Minimal `$filter` evaluator: `eq`, `startswith`, `and`, `or`, `not` and
/// parentheses, with single-quoted literals using doubled quotes as escapes.
mod filter {
    use serde_json::Value;

    #[derive(Debug, Clone, PartialEq)]
    pub(super) enum FilterExpr {
        Eq(String, Value),
        StartsWith(String, String),
        And(Box<FilterExpr>, Box<FilterExpr>),
        Or(Box<FilterExpr>, Box<FilterExpr>),
        Not(Box<FilterExpr>),
    }

    impl FilterExpr {
        pub(super) fn matches(&self, item: &Value) -> bool {
            match self {
                FilterExpr::Eq(attribute, expected) => match item.get(attribute) {
                    Some(Value::Array(values)) => values.iter().any(|v| scalar_eq(v, expected)),
                    Some(actual) => scalar_eq(actual, expected),
                    None => false,
                },
                FilterExpr::StartsWith(attribute, prefix) => item
                    .get(attribute)
                    .and_then(Value::as_str)
                    .is_some_and(|s| s.to_lowercase().starts_with(&prefix.to_lowercase())),
                FilterExpr::And(left, right) => left.matches(item) && right.matches(item),
                FilterExpr::Or(left, right) => left.matches(item) || right.matches(item),
                FilterExpr::Not(inner) => !inner.matches(item),
            }
        }
    }

    fn scalar_eq(actual: &Value, expected: &Value) -> bool {
        match (actual, expected) {
            (Value::String(a), Value::String(b)) => a.eq_ignore_ascii_case(b),
            (a, b) => a == b,
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Token {
        Word(String),
        Literal(String),
        Open,
        Close,
        Comma,
    }

    fn tokenize(input: &str) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();
        let mut chars = input.chars().peekable();

        while let Some(&c) = chars.peek() {
            match c {
                ' ' | '\t' => {
                    chars.next();
                }
                '(' => {
                    chars.next();
                    tokens.push(Token::Open);
                }
                ')' => {
                    chars.next();
                    tokens.push(Token::Close);
                }
                ',' => {
                    chars.next();
                    tokens.push(Token::Comma);
                }
                '\'' => {
                    chars.next();
                    let mut literal = String::new();
                    loop {
                        match chars.next() {
                            Some('\'') if chars.peek() == Some(&'\'') => {
                                chars.next();
                                literal.push('\'');
                            }
                            Some('\'') => break,
                            Some(other) => literal.push(other),
                            None => return Err("unterminated string literal".to_string()),
                        }
                    }
                    tokens.push(Token::Literal(literal));
                }
                _ => {
                    let mut word = String::new();
                    while let Some(&c) = chars.peek() {
                        if c.is_whitespace() || matches!(c, '(' | ')' | ',' | '\'') {
                            break;
                        }
                        word.push(c);
                        chars.next();
                    }
                    tokens.push(Token::Word(word));
                }
            }
        }

        Ok(tokens)
    }

    struct Parser {
        tokens: Vec<Token>,
        position: usize,
    }

    impl Parser {
        fn peek_word(&self, keyword: &str) -> bool {
            matches!(self.tokens.get(self.position), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
        }

        fn next(&mut self) -> Option<Token> {
            let token = self.tokens.get(self.position).cloned();
            self.position += 1;
            token
        }

        fn expect(&mut self, expected: Token) -> Result<(), String> {
            match self.next() {
                Some(token) if token == expected => Ok(()),
                other => Err(format!("expected {:?}, found {:?}", expected, other)),
            }
        }

        fn or_expr(&mut self) -> Result<FilterExpr, String> {
            let mut left = self.and_expr()?;
            while self.peek_word("or") {
                self.position += 1;
                let right = self.and_expr()?;
                left = FilterExpr::Or(Box::new(left), Box::new(right));
            }
            Ok(left)
        }

        fn and_expr(&mut self) -> Result<FilterExpr, String> {
            let mut left = self.unary()?;
            while self.peek_word("and") {
                self.position += 1;
                let right = self.unary()?;
                left = FilterExpr::And(Box::new(left), Box::new(right));
            }
            Ok(left)
        }

        fn unary(&mut self) -> Result<FilterExpr, String> {
            if self.peek_word("not") {
                self.position += 1;
                return Ok(FilterExpr::Not(Box::new(self.unary()?)));
            }
            self.primary()
        }

        fn primary(&mut self) -> Result<FilterExpr, String> {
            match self.next() {
                Some(Token::Open) => {
                    let inner = self.or_expr()?;
                    self.expect(Token::Close)?;
                    Ok(inner)
                }
                Some(Token::Word(word)) if word.eq_ignore_ascii_case("startswith") => {
                    self.expect(Token::Open)?;
                    let attribute = match self.next() {
                        Some(Token::Word(attribute)) => attribute,
                        other => return Err(format!("expected attribute, found {:?}", other)),
                    };
                    self.expect(Token::Comma)?;
                    let prefix = match self.next() {
                        Some(Token::Literal(prefix)) => prefix,
                        other => return Err(format!("expected string literal, found {:?}", other)),
                    };
                    self.expect(Token::Close)?;
                    Ok(FilterExpr::StartsWith(attribute, prefix))
                }
                Some(Token::Word(attribute)) => {
                    if !self.peek_word("eq") {
                        return Err(format!("unsupported operator after '{}'", attribute));
                    }
                    self.position += 1;
                    let value = match self.next() {
                        Some(Token::Literal(s)) => Value::String(s),
                        Some(Token::Word(w)) if w == "true" => Value::Bool(true),
                        Some(Token::Word(w)) if w == "false" => Value::Bool(false),
                        Some(Token::Word(w)) => match w.parse::<i64>() {
                            Ok(n) => Value::from(n),
                            Err(_) => return Err(format!("invalid literal '{}'", w)),
                        },
                        other => return Err(format!("expected literal, found {:?}", other)),
                    };
                    Ok(FilterExpr::Eq(attribute, value))
                }
                other => Err(format!("unexpected token {:?}", other)),
            }
        }
    }

    pub(super) fn parse(input: &str) -> Result<FilterExpr, String> {
        let mut parser = Parser {
            tokens: tokenize(input)?,
            position: 0,
        };
        let expr = parser.or_expr()?;
        if parser.position < parser.tokens.len() {
            return Err(format!(
                "unexpected trailing input at token {}",
                parser.position
            ));
        }
        Ok(expr)
    }

}
