//! 远端 API 客户端
//!
//! 通过注入的 `HttpClient` 发送请求，附带 Bearer 令牌，并把状态码映射为错误类别。
//! 服务端对每个请求独立鉴权，这里的任何本地判定都只是界面层面的提示。

use crate::booking::BookingApi;
use crate::error::ErrorResponse;
use crate::protocol::*;
use crate::request::{HttpClient, HttpRequest};
use crate::validation;
use crate::{
    Appointment, ClinicError, ClinicResult, ClinicalHistory, ErrorKind, HEADER_AUTHORIZATION,
    Patient, Slot, UserRecord, VerifiedPatient,
};
use async_trait::async_trait;
use chrono::NaiveDate;

#[cfg(test)]
mod tests;

#[derive(Clone, Debug, PartialEq)]
pub struct ClinicApi<C: HttpClient> {
    pub base_url: String,
    token: Option<String>,
    client: C,
}

impl<C: HttpClient> ClinicApi<C> {
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            token: None,
            client,
        }
    }

    /// 附带 Bearer 令牌的客户端副本
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 发送一个端点请求并解析响应
    pub async fn call<R: ApiRequest>(&self, req: &R) -> ClinicResult<R::Response> {
        let path = req.path();
        let mut http = HttpRequest::new(&self.url(&path), R::METHOD)
            .with_header("Accept", "application/json");

        if let Some(token) = &self.token {
            http = http.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", token));
        }
        if let Some(body) = req.body()? {
            http = http
                .with_header("Content-Type", "application/json")
                .with_body(body);
        }

        let op = format!("{} {}", R::METHOD.as_str(), path);
        let res = self
            .client
            .send(http)
            .await
            .map_err(|e| e.in_op_with("api.send", op.clone()))?;

        if !res.ok() {
            let kind = ErrorKind::from_status(res.status);
            let message = ErrorResponse::extract(&res.body)
                .unwrap_or_else(|| default_message(kind, res.status));
            return Err(ClinicError::new(kind, message).in_op_with("api.status", op));
        }

        res.json::<R::Response>()
            .map_err(|e| e.in_op_with("api.decode", op))
    }

    // --- Auth ---

    /// 本地校验失败时直接返回，不发出请求
    pub async fn login(&self, email: &str, password: &str) -> ClinicResult<LoginResponse> {
        validation::validate_login(email, password).map_err(|e| e.in_op("api.login"))?;
        self.call(&LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        })
        .await
    }

    /// 长度不足或两次输入不一致时不发出请求
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        confirmation: &str,
    ) -> ClinicResult<()> {
        validation::validate_password_reset(new_password, confirmation)
            .map_err(|e| e.in_op("api.reset_password"))?;
        self.call(&ResetPasswordRequest {
            token: token.to_string(),
            new_password: new_password.to_string(),
        })
        .await
        .map(|_| ())
    }

    // --- Usuarios ---

    pub async fn list_users(&self) -> ClinicResult<Vec<UserRecord>> {
        self.call(&ListUsersRequest).await
    }

    pub async fn create_user(&self, req: CreateUserRequest) -> ClinicResult<UserRecord> {
        self.call(&req).await
    }

    pub async fn update_user(&self, req: UpdateUserRequest) -> ClinicResult<UserRecord> {
        self.call(&req).await
    }

    pub async fn delete_user(&self, id: &str) -> ClinicResult<()> {
        self.call(&DeleteUserRequest { id: id.to_string() })
            .await
            .map(|_| ())
    }

    // --- Pacientes ---

    pub async fn list_patients(&self) -> ClinicResult<Vec<Patient>> {
        self.call(&ListPatientsRequest).await
    }

    pub async fn create_patient(&self, patient: Patient) -> ClinicResult<Patient> {
        self.call(&CreatePatientRequest { patient }).await
    }

    pub async fn update_patient(&self, id: &str, patient: Patient) -> ClinicResult<Patient> {
        self.call(&UpdatePatientRequest {
            id: id.to_string(),
            patient,
        })
        .await
    }

    pub async fn delete_patient(&self, id: &str) -> ClinicResult<()> {
        self.call(&DeletePatientRequest { id: id.to_string() })
            .await
            .map(|_| ())
    }

    pub async fn get_history(&self, patient_id: &str) -> ClinicResult<ClinicalHistory> {
        self.call(&GetHistoryRequest {
            patient_id: patient_id.to_string(),
        })
        .await
    }

    pub async fn update_history(
        &self,
        patient_id: &str,
        history: ClinicalHistory,
    ) -> ClinicResult<ClinicalHistory> {
        self.call(&UpdateHistoryRequest {
            patient_id: patient_id.to_string(),
            history,
        })
        .await
    }

    // --- Citas ---

    pub async fn list_appointments(&self) -> ClinicResult<Vec<Appointment>> {
        self.call(&ListAppointmentsRequest).await
    }

    pub async fn create_appointment(&self, appointment: Appointment) -> ClinicResult<Appointment> {
        self.call(&CreateAppointmentRequest { appointment }).await
    }
}

fn default_message(kind: ErrorKind, status: u16) -> String {
    match kind {
        ErrorKind::Authentication => "Sesión no válida o credenciales incorrectas".to_string(),
        ErrorKind::Authorization => "No tiene permisos para realizar esta acción".to_string(),
        _ => format!("Error del servidor ({})", status),
    }
}

#[async_trait(?Send)]
impl<C: HttpClient> BookingApi for ClinicApi<C> {
    async fn send_code(&self, email: &str) -> ClinicResult<()> {
        self.call(&SendCodeRequest {
            email: email.to_string(),
        })
        .await
        .map(|_| ())
    }

    async fn verify_code(&self, email: &str, code: &str) -> ClinicResult<VerifiedPatient> {
        self.call(&VerifyCodeRequest {
            email: email.to_string(),
            code: code.trim().to_string(),
        })
        .await
        .map(|r| r.patient)
    }

    async fn available_slots(&self, date: NaiveDate) -> ClinicResult<Vec<Slot>> {
        self.call(&AvailableSlotsRequest { date }).await
    }

    async fn book(&self, req: BookFromBotRequest) -> ClinicResult<Appointment> {
        self.call(&req).await
    }
}
