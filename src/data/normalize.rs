use serde_json::Value;

/// Coerce a raw field value into an ordered list of trimmed, non-empty tokens.
///
/// - a list maps each element to its trimmed text; elements are taken as
///   atomic and are not split on commas
/// - a string is split on commas
/// - any other truthy scalar becomes a single token
/// - falsy values (`null`, `false`, `0`, `""`) yield nothing
pub fn normalize(value: &Value) -> Vec<String> {
	match value {
		Value::Array(items) => items
			.iter()
			.filter_map(element_text)
			.map(|s| s.trim().to_owned())
			.filter(|s| !s.is_empty())
			.collect(),
		Value::String(s) => normalize_str(s),
		other if is_truthy(other) => {
			let text = scalar_text(other);
			let text = text.trim();
			if text.is_empty() {
				Vec::new()
			} else {
				vec![text.to_owned()]
			}
		}
		_ => Vec::new(),
	}
}

/// Comma-split path of [`normalize`] for plain text input.
pub fn normalize_str(s: &str) -> Vec<String> {
	s.split(',')
		.map(str::trim)
		.filter(|part| !part.is_empty())
		.map(str::to_owned)
		.collect()
}

fn element_text(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		other => Some(scalar_text(other)),
	}
}

fn scalar_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Array(items) => items
			.iter()
			.filter_map(element_text)
			.collect::<Vec<_>>()
			.join(","),
		other => other.to_string(),
	}
}

fn is_truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;
	use proptest::prelude::*;
	use serde_json::json;

	use super::*;

	#[test]
	fn list_elements_are_not_resplit() {
		assert_eq!(normalize(&json!([" a ", "", "b,c"])), ["a", "b,c"]);
	}

	#[test]
	fn string_is_comma_split() {
		assert_eq!(normalize(&json!(" moss, , slime mould ,")), ["moss", "slime mould"]);
	}

	#[test]
	fn scalars() {
		assert_eq!(normalize(&json!(2021)), ["2021"]);
		assert_eq!(normalize(&json!(true)), ["true"]);
		assert!(normalize(&json!(0)).is_empty());
		assert!(normalize(&json!(false)).is_empty());
		assert!(normalize(&Value::Null).is_empty());
		assert!(normalize(&json!("")).is_empty());
	}

	#[test]
	fn list_keeps_non_string_elements() {
		assert_eq!(normalize(&json!([1, null, "x", false])), ["1", "x", "false"]);
	}

	proptest! {
		#[test]
		fn tokens_are_trimmed_and_non_empty(parts in proptest::collection::vec(".{0,12}", 0..6)) {
			let as_list = Value::Array(parts.iter().cloned().map(Value::String).collect());
			let as_text = Value::String(parts.join(","));
			for tokens in [normalize(&as_list), normalize(&as_text)] {
				prop_assert!(tokens.iter().all(|t| t.trim() == t && !t.is_empty()));
			}
		}

		#[test]
		fn string_input_is_idempotent(s in ".{0,40}") {
			let once = normalize_str(&s);
			let twice = normalize_str(&once.join(","));
			prop_assert_eq!(once, twice);
		}
	}
}
