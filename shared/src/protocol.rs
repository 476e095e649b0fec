use crate::date::format_date;
use crate::request::HttpMethod;
use crate::{
    Appointment, ClinicError, ClinicResult, ClinicalHistory, Patient, Role, Slot, UserRecord,
    VerifiedPatient,
};
use chrono::NaiveDate;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use urlencoding::encode;

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The HTTP method.
    const METHOD: HttpMethod;

    /// The URL path, relative to the API base URL.
    fn path(&self) -> String;

    /// JSON body. Only POST/PUT carry one by default.
    fn body(&self) -> ClinicResult<Option<serde_json::Value>> {
        match Self::METHOD {
            HttpMethod::Post | HttpMethod::Put => serde_json::to_value(self)
                .map(Some)
                .map_err(ClinicError::from),
            HttpMethod::Get | HttpMethod::Delete => Ok(None),
        }
    }
}

// =========================================================
// Auth
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: UserRecord,
    pub token: String,
}

impl ApiRequest for LoginRequest {
    type Response = LoginResponse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/auth/login".to_string()
    }
}

/// The reset token travels in the path, only the new password in the body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(skip)]
    pub token: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
}

impl ApiRequest for ResetPasswordRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        format!("/auth/reset-password/{}", encode(&self.token))
    }
}

// =========================================================
// Usuarios
// =========================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListUsersRequest;

impl ApiRequest for ListUsersRequest {
    type Response = Vec<UserRecord>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/usuarios".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "rol")]
    pub role: Role,
}

impl ApiRequest for CreateUserRequest {
    type Response = UserRecord;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/usuarios".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "rol")]
    pub role: Role,
    /// Left out of the body when the password is not being changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ApiRequest for UpdateUserRequest {
    type Response = UserRecord;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/usuarios/{}", encode(&self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteUserRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DeleteUserRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/usuarios/{}", encode(&self.id))
    }
}

// =========================================================
// Pacientes
// =========================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListPatientsRequest;

impl ApiRequest for ListPatientsRequest {
    type Response = Vec<Patient>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/pacientes".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatePatientRequest {
    pub patient: Patient,
}

impl ApiRequest for CreatePatientRequest {
    type Response = Patient;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/pacientes".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePatientRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub patient: Patient,
}

impl ApiRequest for UpdatePatientRequest {
    type Response = Patient;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/pacientes/{}", encode(&self.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePatientRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DeletePatientRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Delete;

    fn path(&self) -> String {
        format!("/pacientes/{}", encode(&self.id))
    }
}

// =========================================================
// Historia clínica
// =========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetHistoryRequest {
    #[serde(skip)]
    pub patient_id: String,
}

impl ApiRequest for GetHistoryRequest {
    type Response = ClinicalHistory;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/pacientes/{}/historia", encode(&self.patient_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateHistoryRequest {
    #[serde(skip)]
    pub patient_id: String,
    pub history: ClinicalHistory,
}

impl ApiRequest for UpdateHistoryRequest {
    type Response = ClinicalHistory;
    const METHOD: HttpMethod = HttpMethod::Put;

    fn path(&self) -> String {
        format!("/pacientes/{}/historia", encode(&self.patient_id))
    }

    /// The history object is sent as-is, without a wrapper key.
    fn body(&self) -> ClinicResult<Option<serde_json::Value>> {
        Ok(Some(serde_json::Value::Object(self.history.0.clone())))
    }
}

// =========================================================
// Citas
// =========================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListAppointmentsRequest;

impl ApiRequest for ListAppointmentsRequest {
    type Response = Vec<Appointment>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        "/citas".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreateAppointmentRequest {
    pub appointment: Appointment,
}

impl ApiRequest for CreateAppointmentRequest {
    type Response = Appointment;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/citas".to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsRequest {
    #[serde(skip)]
    pub date: NaiveDate,
}

impl ApiRequest for AvailableSlotsRequest {
    type Response = Vec<Slot>;
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("/citas/disponibles?fecha={}", format_date(self.date))
    }
}

/// Step 1 of the email verification handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
}

impl ApiRequest for SendCodeRequest {
    type Response = IgnoredAny;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/citas/enviar-codigo".to_string()
    }
}

/// Step 2 of the email verification handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    #[serde(rename = "codigo")]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCodeResponse {
    #[serde(rename = "paciente")]
    pub patient: VerifiedPatient,
}

impl ApiRequest for VerifyCodeRequest {
    type Response = VerifyCodeResponse;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/citas/verificar-codigo".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookFromBotRequest {
    pub email: String,
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "hora")]
    pub slot: Slot,
    #[serde(rename = "motivo")]
    pub reason: String,
}

impl ApiRequest for BookFromBotRequest {
    type Response = Appointment;
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        "/citas/crear-desde-bot".to_string()
    }
}
