use serde::{Deserialize, Serialize};

/// Request body for user registration. Missing fields decode as empty.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub full_name: String,
    pub password: String,
    pub phone_number: String,
}

/// Request body for login.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub password: String,
    pub phone_number: String,
}

/// Request body for profile update; absent fields stay unchanged.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub id: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub id: i64,
    pub jwt: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: i64,
    pub name: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_tolerates_missing_fields() {
        let req: RegisterRequest = serde_json::from_str(r#"{"fullName":"testing"}"#).unwrap();
        assert_eq!(req.full_name, "testing");
        assert!(req.password.is_empty());
        assert!(req.phone_number.is_empty());
    }

    #[test]
    fn update_request_distinguishes_absent_from_empty() {
        let req: UpdateProfileRequest =
            serde_json::from_str(r#"{"password":"@Password1","fullName":""}"#).unwrap();
        assert_eq!(req.password.as_deref(), Some("@Password1"));
        assert_eq!(req.full_name.as_deref(), Some(""));
        assert!(req.phone_number.is_none());
    }

    #[test]
    fn profile_response_uses_wire_names() {
        let json = serde_json::to_string(&ProfileResponse {
            id: 1,
            name: "testing".into(),
            phone_number: "+628123456789".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"id":1,"name":"testing","phoneNumber":"+628123456789"}"#);
    }
}
