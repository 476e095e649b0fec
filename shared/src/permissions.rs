//! 角色与权限
//!
//! 角色到权限集合是一个全函数（`match`），新增角色时编译器会强制补全映射。
//! 这里的判定只用于决定界面是否渲染某个操作入口，服务端会对每个写操作重新鉴权。

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 细粒度权限令牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ViewUsers,
    CreateUser,
    EditUser,
    DeleteUser,
    ViewPatients,
    CreatePatient,
    EditPatient,
    DeletePatient,
    ViewAppointments,
    CreateAppointment,
    ViewHistory,
    EditHistory,
}

impl Permission {
    pub const ALL: &'static [Permission] = &[
        Permission::ViewUsers,
        Permission::CreateUser,
        Permission::EditUser,
        Permission::DeleteUser,
        Permission::ViewPatients,
        Permission::CreatePatient,
        Permission::EditPatient,
        Permission::DeletePatient,
        Permission::ViewAppointments,
        Permission::CreateAppointment,
        Permission::ViewHistory,
        Permission::EditHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewUsers => "users.view",
            Permission::CreateUser => "users.create",
            Permission::EditUser => "users.edit",
            Permission::DeleteUser => "users.delete",
            Permission::ViewPatients => "patients.view",
            Permission::CreatePatient => "patients.create",
            Permission::EditPatient => "patients.edit",
            Permission::DeletePatient => "patients.delete",
            Permission::ViewAppointments => "appointments.view",
            Permission::CreateAppointment => "appointments.create",
            Permission::ViewHistory => "history.view",
            Permission::EditHistory => "history.edit",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == token)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const ADMIN_PERMISSIONS: &[Permission] = Permission::ALL;

const EDITOR_PERMISSIONS: &[Permission] = &[
    Permission::ViewPatients,
    Permission::CreatePatient,
    Permission::EditPatient,
    Permission::ViewAppointments,
    Permission::CreateAppointment,
    Permission::ViewHistory,
    Permission::EditHistory,
];

const READER_PERMISSIONS: &[Permission] = &[
    Permission::ViewPatients,
    Permission::ViewAppointments,
    Permission::ViewHistory,
];

/// 用户角色
///
/// 未识别的角色字符串反序列化为 `Unrecognized`，其权限集合为空（默认拒绝）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    Administrator,
    Editor,
    Reader,
    #[default]
    Unrecognized,
}

impl Role {
    /// 可分配给用户的角色（用于表单下拉框）
    pub const ASSIGNABLE: &'static [Role] = &[Role::Administrator, Role::Editor, Role::Reader];

    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Administrator => ADMIN_PERMISSIONS,
            Role::Editor => EDITOR_PERMISSIONS,
            Role::Reader => READER_PERMISSIONS,
            Role::Unrecognized => &[],
        }
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Administrator)
    }

    /// 线上名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator => "admin",
            Role::Editor => "editor",
            Role::Reader => "lector",
            Role::Unrecognized => "desconocido",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Administrator => "Administrador",
            Role::Editor => "Editor",
            Role::Reader => "Lector",
            Role::Unrecognized => "Sin rol",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrador" | "administrator" => Role::Administrator,
            "editor" => Role::Editor,
            "lector" | "reader" => Role::Reader,
            _ => Role::Unrecognized,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::parse(&raw))
    }
}

/// 按权限令牌字符串判定，未知角色或未知令牌均返回 false
pub fn has_permission(role: Role, token: &str) -> bool {
    Permission::parse(token).is_some_and(|p| role.can(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_has_every_permission() {
        for p in Permission::ALL {
            assert!(Role::Administrator.can(*p), "admin lacks {}", p);
        }
    }

    #[test]
    fn test_unrecognized_role_denies_everything() {
        let role = Role::parse("recepcionista");
        assert_eq!(role, Role::Unrecognized);
        for p in Permission::ALL {
            assert!(!has_permission(role, p.as_str()));
        }
    }

    #[test]
    fn test_unknown_token_denied_even_for_admin() {
        assert!(!has_permission(Role::Administrator, "server.reboot"));
        assert!(!has_permission(Role::Administrator, ""));
    }

    #[test]
    fn test_editor_and_reader_tables() {
        assert!(has_permission(Role::Editor, "patients.create"));
        assert!(!has_permission(Role::Editor, "users.delete"));
        assert!(has_permission(Role::Reader, "history.view"));
        assert!(!has_permission(Role::Reader, "history.edit"));
    }

    #[test]
    fn test_role_serde_roundtrip_and_aliases() {
        let role: Role = serde_json::from_str("\"Administrator\"").unwrap();
        assert_eq!(role, Role::Administrator);
        let role: Role = serde_json::from_str("\"reader\"").unwrap();
        assert_eq!(role, Role::Reader);
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"editor\"");
    }

    #[test]
    fn test_token_strings_are_unique() {
        for (i, a) in Permission::ALL.iter().enumerate() {
            for b in &Permission::ALL[i + 1..] {
                assert_ne!(a.as_str(), b.as_str());
            }
        }
    }
}
