//! 用户管理（仅管理员）

use crate::auth::use_auth;
use crate::components::guards::Can;
use crate::components::icons::{Plus, Trash2};
use crate::components::notice::{Notice, NoticeToast, use_notice};
use crate::components::submit::SubmitState;
use clinica_shared::generation::RequestGeneration;
use clinica_shared::protocol::{CreateUserRequest, UpdateUserRequest};
use clinica_shared::{ClinicResult, Permission, Role, UserRecord, validation};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 用户表单状态
///
/// `editing` 为 `Some(id)` 时表示编辑已有用户，此时密码可留空。
#[derive(Clone, Copy)]
struct UserForm {
    editing: RwSignal<Option<String>>,
    name: RwSignal<String>,
    email: RwSignal<String>,
    password: RwSignal<String>,
    role: RwSignal<Role>,
}

impl UserForm {
    fn new() -> Self {
        Self {
            editing: RwSignal::new(None),
            name: RwSignal::new(String::new()),
            email: RwSignal::new(String::new()),
            password: RwSignal::new(String::new()),
            role: RwSignal::new(Role::Reader),
        }
    }

    fn reset(&self) {
        self.editing.set(None);
        self.name.set(String::new());
        self.email.set(String::new());
        self.password.set(String::new());
        self.role.set(Role::Reader);
    }

    fn load(&self, user: &UserRecord) {
        self.editing.set(user.id.clone());
        self.name.set(user.name.clone());
        self.email.set(user.email.clone());
        self.password.set(String::new());
        self.role.set(user.role);
    }

    fn validate(&self) -> ClinicResult<()> {
        let password = self.password.get_untracked();
        let password = if self.editing.get_untracked().is_some() && password.is_empty() {
            None
        } else {
            Some(password)
        };
        validation::validate_user(
            &self.name.get_untracked(),
            &self.email.get_untracked(),
            password.as_deref(),
            self.role.get_untracked(),
        )
    }

    fn to_create_request(&self) -> CreateUserRequest {
        CreateUserRequest {
            name: self.name.get_untracked().trim().to_string(),
            email: self.email.get_untracked().trim().to_string(),
            password: self.password.get_untracked(),
            role: self.role.get_untracked(),
        }
    }

    fn to_update_request(&self, id: String) -> UpdateUserRequest {
        let password = self.password.get_untracked();
        UpdateUserRequest {
            id,
            name: self.name.get_untracked().trim().to_string(),
            email: self.email.get_untracked().trim().to_string(),
            role: self.role.get_untracked(),
            password: (!password.is_empty()).then_some(password),
        }
    }
}

#[component]
pub fn UsersPage() -> impl IntoView {
    let auth = use_auth();
    let notice = use_notice();
    let form = UserForm::new();

    let users = RwSignal::new(Vec::<UserRecord>::new());
    let (loading, set_loading) = signal(true);
    let submit = SubmitState::new();

    // 只有最后一次加载的结果会写入列表
    let generation = StoredValue::new(RequestGeneration::new());

    let load_users = move || {
        let Some(generation) = generation.try_get_value() else {
            return;
        };
        let tag = generation.begin();
        let api = auth.api();
        set_loading.set(true);
        spawn_local(async move {
            let Some(result) = generation.settle(tag, api.list_users()).await else {
                return;
            };
            match result {
                Ok(list) => {
                    users.try_set(list);
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
            set_loading.try_set(false);
        });
    };

    Effect::new(move |_| load_users());

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if let Err(e) = form.validate() {
            notice.set(Some(Notice::error(e.message().to_string())));
            return;
        }
        if !submit.try_begin() {
            return;
        }

        let api = auth.api();
        let update = form.editing.get_untracked().map(|id| form.to_update_request(id));
        let create = form.to_create_request();

        spawn_local(async move {
            let result = match update {
                Some(req) => api.update_user(req).await.map(|_| "Usuario actualizado"),
                None => api.create_user(create).await.map(|_| "Usuario creado"),
            };
            match result {
                Ok(msg) => {
                    notice.try_set(Some(Notice::success(msg)));
                    form.reset();
                    load_users();
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
            submit.finish();
        });
    };

    let handle_delete = move |id: String| {
        let api = auth.api();
        spawn_local(async move {
            match api.delete_user(&id).await {
                Ok(()) => {
                    notice.try_set(Some(Notice::success("Usuario eliminado")));
                    users.try_update(|list| list.retain(|u| u.id.as_deref() != Some(id.as_str())));
                }
                Err(e) => {
                    auth.handle_error(&e);
                    notice.try_set(Some(Notice::error(e.message().to_string())));
                }
            }
        });
    };

    let can_submit = move || {
        if form.editing.get().is_some() {
            auth.can(Permission::EditUser)
        } else {
            auth.can(Permission::CreateUser)
        }
    };

    view! {
        <NoticeToast notice=notice />

        <div class="card bg-base-100 shadow-xl">
            <form class="card-body grid md:grid-cols-5 gap-2 items-end" on:submit=on_submit>
                <input class="input input-bordered" placeholder="Nombre"
                    on:input=move |ev| form.name.set(event_target_value(&ev)) prop:value=form.name />
                <input class="input input-bordered" type="email" placeholder="Correo"
                    on:input=move |ev| form.email.set(event_target_value(&ev)) prop:value=form.email />
                <input class="input input-bordered" type="password"
                    placeholder=move || {
                        if form.editing.get().is_some() { "Nueva contraseña (opcional)" } else { "Contraseña" }
                    }
                    on:input=move |ev| form.password.set(event_target_value(&ev)) prop:value=form.password />
                <select class="select select-bordered"
                    on:change=move |ev| form.role.set(Role::parse(&event_target_value(&ev)))
                    prop:value=move || form.role.get().as_str()
                >
                    {Role::ASSIGNABLE
                        .iter()
                        .map(|role| view! { <option value=role.as_str()>{role.label()}</option> })
                        .collect_view()}
                </select>
                <div class="flex gap-2">
                    <button class="btn btn-primary gap-1" disabled=move || submit.is_busy() || !can_submit()>
                        <Plus attr:class="h-4 w-4" />
                        {move || if form.editing.get().is_some() { "Guardar" } else { "Crear" }}
                    </button>
                    <Show when=move || form.editing.get().is_some()>
                        <button type="button" class="btn btn-ghost" on:click=move |_| form.reset()>"Cancelar"</button>
                    </Show>
                </div>
            </form>
        </div>

        <div class="card bg-base-100 shadow-xl">
            <div class="overflow-x-auto w-full">
                <table class="table table-zebra w-full">
                    <thead>
                        <tr>
                            <th>"Nombre"</th>
                            <th>"Correo"</th>
                            <th>"Rol"</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        <Show when=move || loading.get()>
                            <tr>
                                <td colspan="4" class="text-center py-8">
                                    <span class="loading loading-spinner loading-md"></span>
                                </td>
                            </tr>
                        </Show>
                        <For
                            each=move || users.get()
                            key=|u| (u.id.clone(), u.email.clone(), u.role.as_str())
                            children=move |user| {
                                let id = user.id.clone().unwrap_or_default();
                                let editable = user.clone();
                                view! {
                                    <tr>
                                        <td>{user.name.clone()}</td>
                                        <td class="font-mono text-sm">{user.email.clone()}</td>
                                        <td><span class="badge badge-outline">{user.role.label()}</span></td>
                                        <td class="flex gap-1 justify-end">
                                            <Can permission=Permission::EditUser>
                                                <button class="btn btn-ghost btn-sm" on:click={
                                                    let editable = editable.clone();
                                                    move |_| form.load(&editable)
                                                }>"Editar"</button>
                                            </Can>
                                            <Can permission=Permission::DeleteUser>
                                                <button class="btn btn-ghost btn-sm text-error" on:click={
                                                    let id = id.clone();
                                                    move |_| handle_delete(id.clone())
                                                }>
                                                    <Trash2 attr:class="h-4 w-4" />
                                                </button>
                                            </Can>
                                        </td>
                                    </tr>
                                }
                            }
                        />
                    </tbody>
                </table>
            </div>
        </div>
    }
}
