//! Functions templates can call by name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::DateTime;
use serde::de::DeserializeOwned;

use super::engine::{FunctionSet, Value};
use crate::i18n::{LanguageChoice, Localizer};
use crate::panicker::Panicker;

/// Prices at or above this many hundredths are refused.
pub const PRICE_CEILING: u64 = 100_000;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

type RecordFn = Arc<dyn Fn(&serde_json::Value) -> Result<String, String> + Send + Sync>;

/// A helper bound into a template's scope.
#[derive(Clone)]
pub enum Helper {
    /// Plain-text caption computed from a record.
    Caption(RecordFn),
    /// Trusted link computed from a record; printed without HTML escaping.
    Link(RecordFn),
    /// Formats an integer price given in hundredths.
    Price(Arc<dyn Panicker>),
    /// Formats a unix timestamp.
    Time(Arc<dyn Panicker>),
    /// Looks a message id up in the request's language.
    Translate {
        localizer: Arc<Localizer>,
        language: LanguageChoice,
    },
}

impl fmt::Debug for Helper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Helper::Caption(_) => f.write_str("Caption"),
            Helper::Link(_) => f.write_str("Link"),
            Helper::Price(_) => f.write_str("Price"),
            Helper::Time(_) => f.write_str("Time"),
            Helper::Translate { language, .. } => write!(f, "Translate({})", language.tag),
        }
    }
}

fn typed<E, F>(f: F) -> RecordFn
where
    E: DeserializeOwned + 'static,
    F: Fn(&E) -> String + Send + Sync + 'static,
{
    Arc::new(move |raw| {
        let record = serde_json::from_value::<E>(raw.clone()).map_err(|e| e.to_string())?;
        Ok(f(&record))
    })
}

impl Helper {
    pub fn caption<E, F>(f: F) -> Self
    where
        E: DeserializeOwned + 'static,
        F: Fn(&E) -> String + Send + Sync + 'static,
    {
        Helper::Caption(typed(f))
    }

    pub fn link<E, F>(f: F) -> Self
    where
        E: DeserializeOwned + 'static,
        F: Fn(&E) -> String + Send + Sync + 'static,
    {
        Helper::Link(typed(f))
    }

    fn call(&self, args: &[Value]) -> Result<Value, String> {
        let arg = match args {
            [arg] => arg,
            _ => return Err(format!("expected one argument, got {}", args.len())),
        };

        match self {
            Helper::Caption(f) => f(data(arg)?).map(Value::string),
            Helper::Link(f) => f(data(arg)?).map(Value::Url),
            Helper::Price(panicker) => {
                let price = data(arg)?.as_u64().ok_or("price must be a non-negative integer")?;
                Ok(Value::string(render_price(panicker.as_ref(), price)))
            }
            Helper::Time(panicker) => {
                let secs = data(arg)?.as_i64().ok_or("time must be an integer")?;
                Ok(Value::string(format_time(panicker.as_ref(), secs)))
            }
            Helper::Translate { localizer, language } => {
                let id = arg.to_text();
                Ok(Value::string(localizer.translate(*language, &id)))
            }
        }
    }
}

fn data(value: &Value) -> Result<&serde_json::Value, String> {
    value.as_json().ok_or_else(|| format!("expected data, got {}", value.kind()))
}

/// Named helpers for one render.
#[derive(Clone, Debug, Default)]
pub struct FuncMap {
    helpers: HashMap<&'static str, Helper>,
}

impl FuncMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, helper: Helper) -> Self {
        self.helpers.insert(name, helper);
        self
    }

    /// Adds every helper from `other`, keeping ours on conflicts.
    pub fn merged(mut self, other: &FuncMap) -> Self {
        for (name, helper) in &other.helpers {
            self.helpers.entry(*name).or_insert_with(|| helper.clone());
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }
}

impl FunctionSet for FuncMap {
    fn call(&self, name: &str, args: &[Value]) -> Option<Result<Value, String>> {
        self.helpers.get(name).map(|helper| helper.call(args))
    }
}

/// Renders hundredths as dollars, e.g. `12345` as `$123.45`.
pub fn render_price(panicker: &dyn Panicker, price: u64) -> String {
    if price >= PRICE_CEILING {
        panicker.panic(format!("price {} is out of the supported range", price));
    }
    format!("${}.{:02}", price / 100, price % 100)
}

pub fn format_time(panicker: &dyn Panicker, unix_seconds: i64) -> String {
    match DateTime::from_timestamp(unix_seconds, 0) {
        Some(t) => t.format(TIME_FORMAT).to_string(),
        None => {
            panicker.panic(format!("timestamp {} cannot be formatted", unix_seconds));
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingPanicker;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn prices() {
        let panicker = RecordingPanicker::default();
        assert_eq!(render_price(&panicker, 12345), "$123.45");
        assert_eq!(render_price(&panicker, 42069), "$420.69");
        assert_eq!(render_price(&panicker, 666), "$6.66");
        assert_eq!(render_price(&panicker, 5), "$0.05");
        assert!(panicker.calls().is_empty());
    }

    #[test]
    fn price_ceiling_is_loud() {
        let panicker = RecordingPanicker::default();
        render_price(&panicker, 100001);
        render_price(&panicker, PRICE_CEILING);
        assert_eq!(panicker.calls().len(), 2);
    }

    #[test]
    fn times() {
        let panicker = RecordingPanicker::default();
        assert_eq!(format_time(&panicker, 0), "1970-01-01 00:00 UTC");
        assert_eq!(format_time(&panicker, 1_700_000_000), "2023-11-14 22:13 UTC");
        assert!(panicker.calls().is_empty());

        format_time(&panicker, i64::MAX);
        assert_eq!(panicker.calls().len(), 1);
    }

    #[derive(Deserialize)]
    struct Thing {
        id: u64,
    }

    #[test]
    fn record_helpers_see_typed_values() {
        let funcs = FuncMap::new()
            .with("title", Helper::caption(|t: &Thing| format!("Thing #{}", t.id)))
            .with("url", Helper::link(|t: &Thing| format!("/things/{}", t.id)));

        let thing = Value::Data(json!({"id": 9, "extra": true}));
        assert_eq!(funcs.call("title", &[thing.clone()]).unwrap().unwrap(), Value::string("Thing #9"));
        assert_eq!(funcs.call("url", &[thing]).unwrap().unwrap(), Value::Url("/things/9".into()));
        assert!(funcs.call("title", &[Value::Data(json!({"nope": 1}))]).unwrap().is_err());
        assert!(funcs.call("missing", &[]).is_none());
    }

    #[test]
    fn merge_keeps_existing_entries() {
        let panicker: Arc<dyn Panicker> = Arc::new(RecordingPanicker::default());
        let base = FuncMap::new().with("renderPrice", Helper::Price(panicker.clone()));
        let page = FuncMap::new()
            .with("renderPrice", Helper::Time(panicker))
            .merged(&base);
        assert!(matches!(page.helpers.get("renderPrice"), Some(Helper::Time(_))));
    }
}
