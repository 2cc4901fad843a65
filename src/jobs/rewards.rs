//! Reward bodies returned by `pet.getPrize` and `box.open`.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Numeric reward fields, summed across loot boxes.
pub const CURRENCY_FIELDS: [&str; 5] = ["soft", "ton", "gton", "eventCurrency", "experience"];

/// List reward fields, concatenated across loot boxes.
pub const LIST_FIELDS: [&str; 3] = ["resultSkins", "resultEggs", "resultEssence"];

const NO_PRIZES: &str = "No prizes";

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "?".to_owned(),
        Value::Number(n) => n
            .as_i64()
            .map(|i| i.to_string())
            .or_else(|| n.as_f64().map(|f| f.to_string()))
            .unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

fn field<'a>(item: &'a Value, key: &str) -> &'a Value {
    item.get(key).unwrap_or(&Value::Null)
}

fn items<'a>(body: &'a Value, key: &str) -> &'a [Value] {
    body.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Human-readable rendering of a reward body, one line per reward.
///
/// Returns `No prizes` when nothing in the body is worth reporting.
pub fn format_prizes(body: &Value) -> String {
    let mut lines = Vec::new();

    for name in CURRENCY_FIELDS {
        let value = field(body, name);
        if is_truthy(value) {
            lines.push(format!("{name}: {}", text(value)));
        }
    }
    for skin in items(body, "resultSkins") {
        lines.push(format!(
            "Skin: {} ({})",
            text(field(skin, "name")),
            text(field(skin, "rarity"))
        ));
    }
    for egg in items(body, "resultEggs") {
        lines.push(format!(
            "Egg: {} ({})",
            text(field(egg, "allowedRegion")),
            text(field(egg, "rarity"))
        ));
    }
    for essence in items(body, "resultEssence") {
        lines.push(format!("Essence: {}", text(field(essence, "type"))));
    }

    if lines.is_empty() {
        NO_PRIZES.to_owned()
    } else {
        lines.join("\n")
    }
}

/// Running totals across several reward bodies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardTotals {
    currencies: BTreeMap<&'static str, f64>,
    lists: BTreeMap<&'static str, Vec<Value>>,
}

impl RewardTotals {
    /// Fold one reward body in. Non-numeric currency values are ignored.
    pub fn absorb(&mut self, body: &Value) {
        for name in CURRENCY_FIELDS {
            if let Some(amount) = body.get(name).and_then(Value::as_f64) {
                *self.currencies.entry(name).or_insert(0.0) += amount;
            }
        }
        for name in LIST_FIELDS {
            let found = items(body, name);
            if !found.is_empty() {
                self.lists
                    .entry(name)
                    .or_default()
                    .extend(found.iter().cloned());
            }
        }
    }

    pub fn currency(&self, name: &str) -> f64 {
        self.currencies.get(name).copied().unwrap_or(0.0)
    }

    pub fn list(&self, name: &str) -> &[Value] {
        self.lists.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Totals as a reward body, so they render like a single prize.
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        for (name, total) in &self.currencies {
            let number = if total.fract() == 0.0 && total.abs() < 9.0e15 {
                Value::from(*total as i64)
            } else {
                Value::from(*total)
            };
            body.insert((*name).to_owned(), number);
        }
        for (name, list) in &self.lists {
            body.insert((*name).to_owned(), Value::Array(list.clone()));
        }
        Value::Object(body)
    }
}
