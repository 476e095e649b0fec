use super::*;
use crate::booking::{BookingConversation, BookingInput, Step};
use crate::request::{HttpMethod, MockHttpClient};
use crate::Role;
use serde_json::json;

const BASE: &str = "https://api.clinica.test/api";

fn api() -> ClinicApi<MockHttpClient> {
    ClinicApi::new(format!("{}/", BASE), MockHttpClient::new())
}

fn url(path: &str) -> String {
    format!("{}{}", BASE, path)
}

// =========================================================
// 请求构造
// =========================================================

#[tokio::test]
async fn test_login_success_returns_user_and_token() {
    let api = api();
    api.client().mock_response(
        HttpMethod::Post,
        &url("/auth/login"),
        200,
        json!({
            "user": {"nombre": "Ana", "email": "ana@clinica.com", "rol": "admin"},
            "token": "jwt-token"
        }),
    );

    let res = api.login(" ana@clinica.com ", "secreto").await.unwrap();
    assert_eq!(res.token, "jwt-token");
    assert_eq!(res.user.role, Role::Administrator);

    let requests = api.client().requests.borrow();
    let (req_url, method, headers, _) = &requests[0];
    assert_eq!(req_url, &url("/auth/login"));
    assert_eq!(*method, HttpMethod::Post);
    assert!(!headers.contains_key(HEADER_AUTHORIZATION));
    drop(requests);
    assert_eq!(
        api.client().last_body(),
        Some(json!({"email": "ana@clinica.com", "password": "secreto"}))
    );
}

#[tokio::test]
async fn test_bearer_token_attached_when_present() {
    let api = api().with_token(Some("abc".to_string()));
    api.client()
        .mock_response(HttpMethod::Get, &url("/usuarios"), 200, json!([]));

    api.list_users().await.unwrap();

    let requests = api.client().requests.borrow();
    assert_eq!(
        requests[0].2.get(HEADER_AUTHORIZATION).map(String::as_str),
        Some("Bearer abc")
    );
}

#[tokio::test]
async fn test_empty_token_is_not_sent() {
    let api = api().with_token(Some(String::new()));
    assert!(!api.has_token());
}

// =========================================================
// 错误映射
// =========================================================

#[tokio::test]
async fn test_bad_credentials_map_to_authentication() {
    let api = api();
    api.client().mock_response(
        HttpMethod::Post,
        &url("/auth/login"),
        401,
        json!({"message": "Credenciales inválidas"}),
    );

    let err = api.login("ana@clinica.com", "mal").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authentication);
    assert_eq!(err.message(), "Credenciales inválidas");
    assert!(err.forces_logout());
}

#[tokio::test]
async fn test_forbidden_maps_to_authorization() {
    let api = api().with_token(Some("t".to_string()));
    api.client().mock_response(
        HttpMethod::Delete,
        &url("/usuarios/u1"),
        403,
        json!({}),
    );

    let err = api.delete_user("u1").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert!(!err.forces_logout());
}

#[tokio::test]
async fn test_transport_failure_is_network_error() {
    let api = api();
    api.client().mock_failure(HttpMethod::Get, &url("/pacientes"));

    let err = api.list_patients().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Network);
    assert!(err.to_string().contains("api.send(GET /pacientes)"));
}

#[tokio::test]
async fn test_undecodable_body_is_serialization_error() {
    let api = api();
    api.client()
        .mock_response(HttpMethod::Get, &url("/citas"), 200, json!({"unexpected": true}));

    let err = api.list_appointments().await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Serialization);
}

#[tokio::test]
async fn test_delete_accepts_any_success_body() {
    let api = api();
    api.client().mock_response(
        HttpMethod::Delete,
        &url("/pacientes/p1"),
        200,
        json!({"message": "Paciente eliminado"}),
    );
    api.delete_patient("p1").await.unwrap();
}

// =========================================================
// 本地校验先于网络
// =========================================================

#[tokio::test]
async fn test_short_reset_password_never_reaches_network() {
    let api = api();

    let err = api
        .reset_password("reset-token", "12345", "12345")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.spans()[0].operation, "api.reset_password");

    let err = api
        .reset_password("reset-token", "secreto1", "secreto2")
        .await
        .unwrap_err();
    assert_eq!(err.message(), "Las contraseñas no coinciden");
    assert_eq!(api.client().request_count(), 0);
}

#[tokio::test]
async fn test_invalid_login_never_reaches_network() {
    let api = api();

    let err = api.login("no-es-correo", "secreto").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(err.spans()[0].operation, "api.login");

    let err = api.login("ana@clinica.com", "   ").await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(api.client().request_count(), 0);
}

#[tokio::test]
async fn test_reset_password_posts_to_token_path() {
    let api = api();
    api.client().mock_response(
        HttpMethod::Post,
        &url("/auth/reset-password/reset-token"),
        200,
        json!({"ok": true}),
    );
    api.reset_password("reset-token", "nueva-clave", "nueva-clave")
        .await
        .unwrap();
    assert_eq!(
        api.client().last_body(),
        Some(json!({"newPassword": "nueva-clave"}))
    );
}

// =========================================================
// 预约对话经由真实客户端
// =========================================================

#[tokio::test]
async fn test_booking_flow_over_http() {
    let api = api();
    let client = api.client();
    client.mock_response(HttpMethod::Post, &url("/citas/enviar-codigo"), 200, json!({}));
    client.mock_response(
        HttpMethod::Post,
        &url("/citas/verificar-codigo"),
        400,
        json!({"message": "Código incorrecto"}),
    );
    client.mock_response(
        HttpMethod::Post,
        &url("/citas/verificar-codigo"),
        200,
        json!({"paciente": {"nombre": "Paciente", "email": "patient@example.com"}}),
    );
    client.mock_response(
        HttpMethod::Get,
        &url("/citas/disponibles?fecha=2026-10-18"),
        200,
        json!(["08:00", "08:30"]),
    );
    client.mock_response(
        HttpMethod::Post,
        &url("/citas/crear-desde-bot"),
        201,
        json!({
            "email": "patient@example.com",
            "fecha": "2026-10-18",
            "hora": "08:30",
            "motivo": "Consulta general"
        }),
    );

    let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    let tomorrow = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
    let mut conv = BookingConversation::new();

    conv.send(&api, BookingInput::Text("patient@example.com".into()), today)
        .await;
    conv.send(&api, BookingInput::Text("111111".into()), today)
        .await;
    assert_eq!(conv.state().step(), Step::AwaitingCode);
    conv.send(&api, BookingInput::Text("222222".into()), today)
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingReason);

    conv.send(&api, BookingInput::PickReason("Consulta general".into()), today)
        .await;
    conv.send(&api, BookingInput::PickDate(tomorrow), today)
        .await;
    assert_eq!(conv.state().step(), Step::ChoosingSlot);

    conv.send(&api, BookingInput::PickSlot(Slot::new("08:30")), today)
        .await;
    conv.send(&api, BookingInput::Confirm, today).await;
    assert_eq!(conv.state().step(), Step::Done);

    assert_eq!(
        client.last_body(),
        Some(json!({
            "email": "patient@example.com",
            "fecha": "2026-10-18",
            "hora": "08:30",
            "motivo": "Consulta general"
        }))
    );
}
