//! Destination path templating
//!
//! Backup destination paths support substitution over a closed field set:
//! `{{ .Namespace }}`, `{{ .Name }}` and `{{ .CreationTimestamp }}` (the
//! leading dot and surrounding whitespace are optional). Anything else is a
//! hard error; a malformed template can never render to a usable
//! destination, so it must fail loudly rather than produce a partial path.

use crate::error::{Error, Result};

/// Field values available to destination path templates
#[derive(Debug, Clone, Default)]
pub struct PathContext {
    pub namespace: String,
    pub name: String,
    pub creation_timestamp: String,
}

/// Render `template`, substituting `{{ Field }}` placeholders from `ctx`.
pub fn render(template: &str, ctx: &PathContext) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| Error::template(format!("unclosed placeholder in '{}'", template)))?;

        let field = after[..end].trim().trim_start_matches('.');
        match field {
            "Namespace" => out.push_str(&ctx.namespace),
            "Name" => out.push_str(&ctx.name),
            "CreationTimestamp" => out.push_str(&ctx.creation_timestamp),
            other => {
                return Err(Error::template(format!(
                    "unknown template field '{}' (supported: Namespace, Name, CreationTimestamp)",
                    other
                )));
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PathContext {
        PathContext {
            namespace: "ns1".to_string(),
            name: "backup1".to_string(),
            creation_timestamp: "2024-06-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn renders_all_fields() {
        let rendered = render(
            "bucket/{{ .Namespace }}/{{ .Name }}/{{ .CreationTimestamp }}/snapshot.db",
            &ctx(),
        )
        .unwrap();
        assert_eq!(rendered, "bucket/ns1/backup1/2024-06-01T00:00:00Z/snapshot.db");
    }

    #[test]
    fn renders_without_dot_or_whitespace() {
        let rendered = render("s3://bucket/{{Namespace}}/{{Name}}/snapshot.db", &ctx()).unwrap();
        assert_eq!(rendered, "s3://bucket/ns1/backup1/snapshot.db");
    }

    #[test]
    fn literal_template_passes_through() {
        assert_eq!(render("bucket/fixed/path.db", &ctx()).unwrap(), "bucket/fixed/path.db");
    }

    #[test]
    fn unknown_field_fails() {
        let err = render("bucket/{{ .Cluster }}/snapshot.db", &ctx()).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        assert!(err.to_string().contains("Cluster"));
    }

    #[test]
    fn unclosed_placeholder_fails() {
        let err = render("bucket/{{ .Name /snapshot.db", &ctx()).unwrap_err();
        assert!(matches!(err, Error::Template(_)));
    }
}
