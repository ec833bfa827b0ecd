use serde_json::Value;

/// Turns a condition operand into the runtime value it refers to.
///
/// The execution engine owns the real resolution context; the implementations
/// here cover literal operands and `{{path}}` lookups into a JSON document.
pub trait ValueResolver {
    fn resolve(&self, operand: &str) -> Value;
}

/// Treats every operand as a literal string.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralResolver;

impl ValueResolver for LiteralResolver {
    fn resolve(&self, operand: &str) -> Value {
        Value::String(operand.to_string())
    }
}

/// Resolves `{{a.b.0}}` templates against a JSON context.
///
/// An operand that is exactly one template yields the referenced value as-is.
/// Templates embedded in surrounding text are interpolated into a string.
/// Unknown paths resolve to `null`.
#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    context: Value,
}

impl ContextResolver {
    pub fn new(context: Value) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    /// Looks up a dotted path. `items[2].id` and `items.2.id` are equivalent.
    pub fn lookup(&self, path: &str) -> Value {
        let normalized = path.replace('[', ".").replace(']', "");
        let mut current = &self.context;
        for segment in normalized.split('.').map(str::trim).filter(|s| !s.is_empty()) {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return Value::Null,
            }
        }
        current.clone()
    }

    fn whole_template(operand: &str) -> Option<&str> {
        let inner = operand.trim().strip_prefix("{{")?.strip_suffix("}}")?;
        if inner.contains("{{") || inner.contains("}}") {
            None
        } else {
            Some(inner.trim())
        }
    }

    fn interpolate(&self, operand: &str) -> String {
        let mut out = String::with_capacity(operand.len());
        let mut rest = operand;
        while let Some(start) = rest.find("{{") {
            let Some(len) = rest[start + 2..].find("}}") else {
                break;
            };
            out.push_str(&rest[..start]);
            let path = &rest[start + 2..start + 2 + len];
            out.push_str(&stringify(&self.lookup(path)));
            rest = &rest[start + 2 + len + 2..];
        }
        out.push_str(rest);
        out
    }
}

impl ValueResolver for ContextResolver {
    fn resolve(&self, operand: &str) -> Value {
        if let Some(path) = Self::whole_template(operand) {
            return self.lookup(path);
        }
        if operand.contains("{{") {
            return Value::String(self.interpolate(operand));
        }
        Value::String(operand.to_string())
    }
}

/// Text form of a resolved value as used by text comparisons.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resolver() -> ContextResolver {
        ContextResolver::new(json!({
            "trigger": { "amount": 120, "tags": ["vip", "eu"], "name": "Ada" }
        }))
    }

    #[test]
    fn whole_template_keeps_json_type() {
        assert_eq!(resolver().resolve("{{trigger.amount}}"), json!(120));
        assert_eq!(resolver().resolve("{{ trigger.tags }}"), json!(["vip", "eu"]));
        assert_eq!(resolver().resolve("{{trigger.tags[1]}}"), json!("eu"));
    }

    #[test]
    fn embedded_templates_are_interpolated() {
        assert_eq!(
            resolver().resolve("Hello {{trigger.name}}, you owe {{trigger.amount}}"),
            json!("Hello Ada, you owe 120")
        );
    }

    #[test]
    fn unknown_paths_are_null() {
        assert_eq!(resolver().resolve("{{trigger.missing.deep}}"), Value::Null);
        assert_eq!(resolver().resolve("plain"), json!("plain"));
    }
}
