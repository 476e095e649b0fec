//! 表单本地校验
//!
//! 所有校验在发出网络请求之前完成，失败时返回 `ErrorKind::Validation`。

use crate::{ClinicError, ClinicResult, Role};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

pub fn validate_email(email: &str) -> ClinicResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(ClinicError::validation("Correo electrónico no válido"))
    }
}

fn require(value: &str, field: &str) -> ClinicResult<()> {
    if value.trim().is_empty() {
        Err(ClinicError::validation(format!("El campo {} es obligatorio", field)))
    } else {
        Ok(())
    }
}

pub fn validate_login(email: &str, password: &str) -> ClinicResult<()> {
    validate_email(email)?;
    require(password, "contraseña")
}

/// 重置密码：最少 6 个字符，且两次输入一致
pub fn validate_password_reset(new_password: &str, confirmation: &str) -> ClinicResult<()> {
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ClinicError::validation(format!(
            "La contraseña debe tener al menos {} caracteres",
            MIN_PASSWORD_LEN
        )));
    }
    if new_password != confirmation {
        return Err(ClinicError::validation("Las contraseñas no coinciden"));
    }
    Ok(())
}

/// 预约日期不得早于今天
pub fn validate_appointment_date(date: NaiveDate, today: NaiveDate) -> ClinicResult<()> {
    if date < today {
        Err(ClinicError::validation(
            "No se pueden agendar citas en fechas pasadas",
        ))
    } else {
        Ok(())
    }
}

pub fn validate_patient(name: &str, email: &str) -> ClinicResult<()> {
    require(name, "nombre")?;
    validate_email(email)
}

/// 新建用户时需要密码，编辑时密码可留空
pub fn validate_user(name: &str, email: &str, password: Option<&str>, role: Role) -> ClinicResult<()> {
    require(name, "nombre")?;
    validate_email(email)?;
    if let Some(password) = password {
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClinicError::validation(format!(
                "La contraseña debe tener al menos {} caracteres",
                MIN_PASSWORD_LEN
            )));
        }
    }
    if role == Role::Unrecognized {
        return Err(ClinicError::validation("Seleccione un rol"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_email_syntax() {
        assert!(is_valid_email("patient@example.com"));
        assert!(is_valid_email("  a.b@c.co "));
        assert!(!is_valid_email("patient@example"));
        assert!(!is_valid_email("no at sign.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_short_password_rejected() {
        let err = validate_password_reset("12345", "12345").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(validate_password_reset("123456", "123456").is_ok());
    }

    #[test]
    fn test_mismatched_confirmation_rejected() {
        let err = validate_password_reset("secreto1", "secreto2").unwrap_err();
        assert_eq!(err.message(), "Las contraseñas no coinciden");
    }

    #[test]
    fn test_past_date_rejected() {
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert!(validate_appointment_date(today, today).is_ok());
        assert!(validate_appointment_date(today.succ_opt().unwrap(), today).is_ok());
        assert!(validate_appointment_date(today.pred_opt().unwrap(), today).is_err());
    }

    #[test]
    fn test_user_form() {
        assert!(validate_user("Ana", "ana@clinica.com", Some("secreto"), Role::Editor).is_ok());
        assert!(validate_user("Ana", "ana@clinica.com", None, Role::Reader).is_ok());
        assert!(validate_user("", "ana@clinica.com", None, Role::Reader).is_err());
        assert!(validate_user("Ana", "ana@clinica.com", Some("123"), Role::Reader).is_err());
        assert!(validate_user("Ana", "ana@clinica.com", None, Role::Unrecognized).is_err());
    }
}
