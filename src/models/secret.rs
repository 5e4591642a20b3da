use serde::{Deserialize, Serialize};

/// One stored credential, as kept inside the decrypted store file and as
/// returned over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretRecord {
    pub id: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewSecret {
    pub email: Option<String>,
    pub password: Option<String>,
    pub description: Option<String>,
}

impl NewSecret {
    pub fn validate(&self) -> Result<(), String> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.is_empty());
        if !present(&self.email) || !present(&self.password) {
            return Err("Email and password are required".into());
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub secrets: Vec<SecretRecord>,
}

#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub success: bool,
    pub message: String,
    pub secret: SecretRecord,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_secret(email: Option<&str>, password: Option<&str>) -> NewSecret {
        NewSecret {
            email: email.map(String::from),
            password: password.map(String::from),
            description: None,
        }
    }

    #[test]
    fn test_validate_requires_email_and_password() {
        assert!(new_secret(Some("a@b.com"), Some("p")).validate().is_ok());
        assert!(new_secret(None, Some("p")).validate().is_err());
        assert!(new_secret(Some("a@b.com"), None).validate().is_err());
        assert!(new_secret(Some(""), Some("p")).validate().is_err());
        assert!(new_secret(Some("a@b.com"), Some("")).validate().is_err());
    }

    #[test]
    fn test_record_wire_format_is_camel_case() {
        let record = SecretRecord {
            id: "1700000000000".into(),
            email: "a@b.com".into(),
            password: "p".into(),
            description: String::new(),
            created_at: "2026-10-16T09:30:00.123Z".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["createdAt"], "2026-10-16T09:30:00.123Z");
        assert!(value.get("created_at").is_none());
    }

    #[test]
    fn test_record_without_description_parses() {
        let record: SecretRecord = serde_json::from_str(
            r#"{"id":"1","email":"a@b.com","password":"p","createdAt":"2026-10-16T09:30:00.123Z"}"#,
        )
        .unwrap();
        assert_eq!(record.description, "");
    }
}
