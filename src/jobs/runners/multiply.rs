use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

use crate::jobs::types::{RunResult, TaskRunner};

/// Multiplies a numeric input by `times`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplyRunner {
    pub times: Number,
}

impl MultiplyRunner {
    fn multiply(&self, input: &JsonValue) -> Result<JsonValue, String> {
        let number = match input {
            JsonValue::Number(n) => n.clone(),
            // Upstream adapters often report numbers as strings
            JsonValue::String(s) => s
                .trim()
                .parse::<Number>()
                .map_err(|_| format!("cannot multiply non-numeric input '{}'", s))?,
            other => return Err(format!("cannot multiply non-numeric input {}", other)),
        };

        if let (Some(a), Some(b)) = (number.as_i64(), self.times.as_i64()) {
            return a
                .checked_mul(b)
                .map(JsonValue::from)
                .ok_or_else(|| format!("multiplication overflow: {} * {}", a, b));
        }

        let (Some(a), Some(b)) = (number.as_f64(), self.times.as_f64()) else {
            return Err("multiplication operands out of range".to_string());
        };
        Number::from_f64(a * b)
            .map(JsonValue::Number)
            .ok_or_else(|| format!("multiplication result is not finite: {} * {}", a, b))
    }
}

#[async_trait]
impl TaskRunner for MultiplyRunner {
    fn kind() -> &'static str
    where
        Self: Sized,
    {
        "multiply"
    }

    async fn perform(&self, input: RunResult) -> RunResult {
        let Some(value) = input.value() else {
            return RunResult::with_error("multiply requires an input value");
        };

        match self.multiply(value) {
            Ok(product) => RunResult::with_value(product),
            Err(message) => RunResult::with_error(message),
        }
    }
}
