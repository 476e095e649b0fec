//! 控制面板统计
//!
//! 三个计数请求并发发出，各自完成时只更新自己的字段，与完成顺序无关。

use crate::api::ClinicApi;
use crate::generation::{GenerationTag, RequestGeneration};
use crate::request::HttpClient;
use crate::ClinicResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountKind {
    Users,
    Patients,
    Appointments,
}

impl CountKind {
    pub const ALL: [CountKind; 3] = [CountKind::Users, CountKind::Patients, CountKind::Appointments];

    pub fn label(&self) -> &'static str {
        match self {
            CountKind::Users => "Usuarios",
            CountKind::Patients => "Pacientes",
            CountKind::Appointments => "Citas",
        }
    }
}

/// 单个计数请求的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountUpdate {
    pub tag: GenerationTag,
    pub kind: CountKind,
    pub value: usize,
}

/// 面板上显示的计数，`None` 表示尚未加载或加载失败
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardCounts {
    pub users: Option<usize>,
    pub patients: Option<usize>,
    pub appointments: Option<usize>,
}

impl DashboardCounts {
    pub fn get(&self, kind: CountKind) -> Option<usize> {
        match kind {
            CountKind::Users => self.users,
            CountKind::Patients => self.patients,
            CountKind::Appointments => self.appointments,
        }
    }

    /// 应用一个计数结果；代际已过期时忽略并返回 false
    pub fn apply(&mut self, update: CountUpdate, generation: &RequestGeneration) -> bool {
        if !generation.is_current(update.tag) {
            return false;
        }
        let slot = match update.kind {
            CountKind::Users => &mut self.users,
            CountKind::Patients => &mut self.patients,
            CountKind::Appointments => &mut self.appointments,
        };
        *slot = Some(update.value);
        true
    }
}

/// 获取一个计数
pub async fn fetch_count<C: HttpClient>(
    api: &ClinicApi<C>,
    kind: CountKind,
    tag: GenerationTag,
) -> ClinicResult<CountUpdate> {
    let value = match kind {
        CountKind::Users => api.list_users().await?.len(),
        CountKind::Patients => api.list_patients().await?.len(),
        CountKind::Appointments => api.list_appointments().await?.len(),
    };
    Ok(CountUpdate { tag, kind, value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{HttpMethod, MockHttpClient};
    use serde_json::json;

    #[test]
    fn test_updates_touch_only_their_own_field_in_any_order() {
        let generation = RequestGeneration::new();
        let tag = generation.begin();
        let users = CountUpdate {
            tag,
            kind: CountKind::Users,
            value: 4,
        };
        let patients = CountUpdate {
            tag,
            kind: CountKind::Patients,
            value: 12,
        };

        let mut a = DashboardCounts::default();
        assert!(a.apply(users, &generation));
        assert_eq!(a.patients, None);
        assert!(a.apply(patients, &generation));

        let mut b = DashboardCounts::default();
        assert!(b.apply(patients, &generation));
        assert_eq!(b.users, None);
        assert!(b.apply(users, &generation));

        assert_eq!(a, b);
        assert_eq!(a.users, Some(4));
        assert_eq!(a.patients, Some(12));
        assert_eq!(a.appointments, None);
    }

    #[test]
    fn test_stale_generation_is_ignored() {
        let generation = RequestGeneration::new();
        let old = generation.begin();
        generation.begin();

        let mut counts = DashboardCounts::default();
        let applied = counts.apply(
            CountUpdate {
                tag: old,
                kind: CountKind::Users,
                value: 99,
            },
            &generation,
        );
        assert!(!applied);
        assert_eq!(counts.users, None);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_resolve_independently() {
        let client = MockHttpClient::new();
        client.mock_response(
            HttpMethod::Get,
            "http://api/usuarios",
            200,
            json!([{"nombre": "A", "email": "a@x.com", "rol": "admin"}]),
        );
        client.mock_response(
            HttpMethod::Get,
            "http://api/pacientes",
            200,
            json!([
                {"nombre": "P1", "email": "p1@x.com"},
                {"nombre": "P2", "email": "p2@x.com"}
            ]),
        );
        client.mock_failure(HttpMethod::Get, "http://api/citas");
        let api = ClinicApi::new("http://api", client);

        let generation = RequestGeneration::new();
        let tag = generation.begin();
        let (users, patients, appointments) = tokio::join!(
            fetch_count(&api, CountKind::Users, tag),
            fetch_count(&api, CountKind::Patients, tag),
            fetch_count(&api, CountKind::Appointments, tag),
        );

        let mut counts = DashboardCounts::default();
        for update in [patients, users].into_iter().flatten() {
            counts.apply(update, &generation);
        }
        assert!(appointments.is_err());
        assert_eq!(counts.get(CountKind::Users), Some(1));
        assert_eq!(counts.get(CountKind::Patients), Some(2));
        assert_eq!(counts.get(CountKind::Appointments), None);
    }
}
