//! Authentication data models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::guard::Route;

/// User ID type (opaque, backend-issued)
pub type UserId = String;

/// Closed set of platform roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Student,
    #[serde(alias = "TPO/Faculty")]
    Faculty,
    #[serde(rename = "TPO")]
    Tpo,
    Admin,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Student, Role::Faculty, Role::Tpo, Role::Admin];

    /// Landing dashboard for this role.
    pub const fn dashboard(self) -> Route {
        match self {
            Role::Admin => Route::AdminDashboard,
            Role::Faculty | Role::Tpo => Route::FacultyDashboard,
            Role::Student => Route::StudentDashboard,
        }
    }

    /// Name as the backend expects it in role updates.
    pub const fn wire_name(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Faculty => "TPO/Faculty",
            Role::Tpo => "TPO",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Student => write!(f, "Student"),
            Role::Faculty => write!(f, "Faculty"),
            Role::Tpo => write!(f, "TPO"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "faculty" | "tpo/faculty" => Ok(Role::Faculty),
            "tpo" => Ok(Role::Tpo),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

/// User profile as cached by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub division: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub roll_no: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub year_of_study: Option<String>,
}

/// Accepts strings or numbers for profile fields older records stored numerically
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Bearer token plus the user snapshot it was issued for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// Why an OTP is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    Login,
    Register,
}

/// `POST /auth/request-otp` body
#[derive(Debug, Clone, Serialize)]
pub struct OtpRequest {
    pub email: String,
    pub purpose: OtpPurpose,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// `POST /auth/verify-otp` body
#[derive(Debug, Clone, Serialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Token-bearing response of OTP verification and token refresh
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    #[serde(default)]
    pub user: Option<User>,
}

/// `POST /auth/update-profile` body; only set fields are sent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_of_study: Option<String>,
}

impl ProfileUpdate {
    /// Validate fields the profile form would refuse to submit
    pub fn validate(&self) -> Result<(), String> {
        if let Some(mobile) = &self.mobile {
            if mobile.len() < 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
                return Err("Mobile number must be at least 10 digits".to_string());
            }
        }

        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err("Name cannot be empty".to_string());
            }
        }

        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.mobile.is_none()
            && self.gender.is_none()
            && self.department.is_none()
            && self.division.is_none()
            && self.roll_no.is_none()
            && self.year_of_study.is_none()
    }
}

/// Validate an OTP as typed by the user (exactly six digits)
pub fn validate_otp(otp: &str) -> Result<(), String> {
    if otp.len() != 6 || !otp.chars().all(|c| c.is_ascii_digit()) {
        return Err("OTP must be exactly 6 digits".to_string());
    }
    Ok(())
}

/// Minimal email shape check
pub fn validate_email(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    match trimmed.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(format!("'{trimmed}' is not a valid email address")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_accepts_backend_faculty_name() {
        let role: Role = serde_json::from_str("\"TPO/Faculty\"").unwrap();
        assert_eq!(role, Role::Faculty);
        let role: Role = serde_json::from_str("\"TPO\"").unwrap();
        assert_eq!(role, Role::Tpo);
    }

    #[test]
    fn test_role_dashboards() {
        assert_eq!(Role::Admin.dashboard(), Route::AdminDashboard);
        assert_eq!(Role::Faculty.dashboard(), Route::FacultyDashboard);
        assert_eq!(Role::Tpo.dashboard(), Route::FacultyDashboard);
        assert_eq!(Role::Student.dashboard(), Route::StudentDashboard);
    }

    #[test]
    fn test_user_deserializes_sparse_record() {
        let user: User = serde_json::from_str(
            r#"{"_id":"u1","email":"a@b.com","name":"Asha","role":"Student"}"#,
        )
        .unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(user.department, None);
    }

    #[test]
    fn test_user_camel_case_fields() {
        let user: User = serde_json::from_str(
            r#"{"_id":"u1","email":"a@b.com","role":"Admin","rollNo":"42","yearOfStudy":"3"}"#,
        )
        .unwrap();
        assert_eq!(user.roll_no.as_deref(), Some("42"));
        assert_eq!(user.year_of_study.as_deref(), Some("3"));
    }

    #[test]
    fn test_user_numeric_profile_fields() {
        let user: User = serde_json::from_str(
            r#"{"_id":"u1","email":"a@b.com","role":"Student","yearOfStudy":2,"mobile":9876543210}"#,
        )
        .unwrap();
        assert_eq!(user.year_of_study.as_deref(), Some("2"));
        assert_eq!(user.mobile.as_deref(), Some("9876543210"));
    }

    #[test]
    fn test_validate_otp() {
        assert!(validate_otp("123456").is_ok());
        assert!(validate_otp("12345").is_err());
        assert!(validate_otp("12345a").is_err());
        assert!(validate_otp("1234567").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("student@college.edu").is_ok());
        assert!(validate_email("student").is_err());
        assert!(validate_email("@college.edu").is_err());
    }

    #[test]
    fn test_profile_update_rejects_short_mobile() {
        let update = ProfileUpdate {
            mobile: Some("12345".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_profile_update_skips_unset_fields() {
        let update = ProfileUpdate {
            department: Some("CSE".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json, serde_json::json!({"department": "CSE"}));
    }
}
