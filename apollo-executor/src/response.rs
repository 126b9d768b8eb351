use serde::Deserialize;
use serde::Serialize;

use crate::json_ext::Object;
use crate::json_ext::Value;

/// The result of a successful execution.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// The result mapping, keyed by response key in selection order.
    pub value: Object,
}

impl Response {
    /// The result as a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.value)
    }
}
