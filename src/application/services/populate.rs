//! Replaces reference ids in response documents with the referenced users.

use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::domain::document::Document;
use crate::domain::entities::User;
use crate::domain::query::Filter;
use crate::domain::repositories::Collection;
use crate::error::AppError;

/// Replaces the user id (or array of ids) at `field` in every document with
/// a summary object holding only `fields`.
///
/// Every referenced user is loaded with a single query. Array entries whose
/// user is gone are dropped; a single missing reference becomes `null`.
pub async fn populate_users(
    docs: &mut [Value],
    field: &str,
    users: &Collection<User>,
    fields: &[&str],
) -> Result<(), AppError> {
    let mut ids: Vec<Value> = Vec::new();
    for doc in docs.iter() {
        match doc.get(field) {
            Some(Value::String(id)) => ids.push(Value::String(id.clone())),
            Some(Value::Array(items)) => ids.extend(items.iter().filter(|v| v.is_string()).cloned()),
            _ => {}
        }
    }
    if ids.is_empty() {
        return Ok(());
    }
    ids.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    ids.dedup();

    let found: HashMap<String, Value> = users
        .find_all(Filter::new().is_in("id", ids))
        .await?
        .into_iter()
        .map(|user| -> Result<(String, Value), AppError> {
            let id = user.id.to_string();
            let summary = summarize(User::present(serde_json::to_value(&user)?), fields);
            Ok((id, summary))
        })
        .collect::<Result<_, AppError>>()?;

    for doc in docs.iter_mut() {
        let replacement = match doc.get(field) {
            Some(Value::String(id)) => found.get(id.as_str()).cloned().unwrap_or(Value::Null),
            Some(Value::Array(items)) => Value::Array(
                items
                    .iter()
                    .filter_map(|v| v.as_str().and_then(|id| found.get(id)).cloned())
                    .collect(),
            ),
            _ => continue,
        };
        if let Value::Object(map) = doc {
            map.insert(field.to_string(), replacement);
        }
    }

    Ok(())
}

fn summarize(doc: Value, fields: &[&str]) -> Value {
    let Value::Object(map) = doc else {
        return doc;
    };

    let summary: Map<String, Value> = map
        .into_iter()
        .filter(|(key, _)| key == "id" || fields.contains(&key.as_str()))
        .collect();
    Value::Object(summary)
}
