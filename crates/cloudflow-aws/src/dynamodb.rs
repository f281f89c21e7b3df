//! DynamoDB key-value facade
//!
//! Items cross the boundary as JSON objects and are converted to and from
//! `AttributeValue` maps here.

use crate::{AwsProvider, sdk_error};
use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use cloudflow_core::{CloudError, Item, KeyValueApi, Result};
use serde_json::{Number, Value};
use std::collections::HashMap;

const SERVICE: &str = "dynamodb";

pub fn to_attribute_value(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(to_attribute_value).collect()),
        Value::Object(map) => AttributeValue::M(to_attribute_map(map)),
    }
}

pub fn to_attribute_map(item: &Item) -> HashMap<String, AttributeValue> {
    item.iter()
        .map(|(k, v)| (k.clone(), to_attribute_value(v)))
        .collect()
}

/// DynamoDB sends numbers as decimal strings
fn parse_number(raw: &str) -> Result<Value> {
    Ok(Value::Number(serde_json::from_str::<Number>(raw)?))
}

pub fn from_attribute_value(value: &AttributeValue) -> Result<Value> {
    Ok(match value {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(n) => parse_number(n)?,
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::Ss(values) => Value::from(values.clone()),
        AttributeValue::Ns(values) => Value::Array(
            values
                .iter()
                .map(|n| parse_number(n))
                .collect::<Result<_>>()?,
        ),
        AttributeValue::L(values) => Value::Array(
            values
                .iter()
                .map(from_attribute_value)
                .collect::<Result<_>>()?,
        ),
        AttributeValue::M(map) => Value::Object(from_attribute_map(map)?),
        other => {
            return Err(CloudError::MalformedResponse(format!(
                "unsupported attribute type: {other:?}"
            )));
        }
    })
}

pub fn from_attribute_map(map: &HashMap<String, AttributeValue>) -> Result<Item> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), from_attribute_value(v)?)))
        .collect()
}

#[async_trait]
impl KeyValueApi for AwsProvider {
    async fn list_tables(&self) -> Result<Vec<String>> {
        tracing::debug!("ListTables");
        let mut tables = Vec::new();
        let mut start = None;

        loop {
            let output = self
                .dynamodb
                .list_tables()
                .set_exclusive_start_table_name(start)
                .send()
                .await
                .map_err(sdk_error(SERVICE, "ListTables"))?;

            tables.extend(output.table_names().iter().cloned());
            start = output.last_evaluated_table_name().map(str::to_string);
            if start.is_none() {
                break;
            }
        }
        Ok(tables)
    }

    async fn put_item(&self, table: &str, item: &Item) -> Result<()> {
        tracing::debug!("PutItem {} ({} attribute(s))", table, item.len());
        self.dynamodb
            .put_item()
            .table_name(table)
            .set_item(Some(to_attribute_map(item)))
            .send()
            .await
            .map_err(sdk_error(SERVICE, "PutItem"))?;
        Ok(())
    }

    async fn get_item(&self, table: &str, key: &Item) -> Result<Option<Item>> {
        tracing::debug!("GetItem {}", table);
        let output = self
            .dynamodb
            .get_item()
            .table_name(table)
            .set_key(Some(to_attribute_map(key)))
            .send()
            .await
            .map_err(sdk_error(SERVICE, "GetItem"))?;

        output.item().map(from_attribute_map).transpose()
    }

    async fn delete_item(&self, table: &str, key: &Item) -> Result<()> {
        tracing::debug!("DeleteItem {}", table);
        self.dynamodb
            .delete_item()
            .table_name(table)
            .set_key(Some(to_attribute_map(key)))
            .send()
            .await
            .map_err(sdk_error(SERVICE, "DeleteItem"))?;
        Ok(())
    }
}
