//! HTML page and form handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use dioxus::prelude::*;
use menu_types::{Category, MenuItem, MenuTree};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::{ApiError, AppState};
use crate::app::pages::{AdminPage, CartaPage, LoginPage, MenuPage, PRICE_FIELD_PREFIX};
use crate::app::render_page;
use crate::auth::AuthUser;
use crate::routes::{Route, SESSION_COOKIE};

/// GET / - Public menu
pub async fn menu_page(State(state): State<AppState>) -> Html<String> {
    let live = state.connection.is_configured();
    let tree = match state.menu.fetch_menu().await {
        Ok(tree) => tree,
        Err(e) => {
            warn!("Failed to fetch menu, showing bundled menu: {}", e);
            state.menu.normalize(MenuTree::default()).await
        }
    };
    Html(render_page(rsx! { MenuPage { tree, live } }))
}

/// GET /carta - Static carta
pub async fn carta_page(State(state): State<AppState>) -> Html<String> {
    if state.carta.read().await.is_empty() {
        let mut carta = state.carta.write().await;
        if carta.is_empty() {
            state.loader.load_into(&mut carta).await;
        }
    }
    let containers = state.carta.read().await.clone();
    Html(render_page(rsx! { CartaPage { containers } }))
}

/// GET /login
pub async fn login_page(State(state): State<AppState>) -> Html<String> {
    let configured = state.connection.is_configured();
    Html(render_page(rsx! { LoginPage { configured, error: None } }))
}

fn login_error(configured: bool, status: StatusCode, error: &str) -> Response {
    let error = error.to_string();
    let html = render_page(rsx! { LoginPage { configured, error } });
    (status, Html(html)).into_response()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// POST /login - Sign in and set the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let Some(auth) = state.connection.auth().await else {
        return login_error(
            state.connection.is_configured(),
            StatusCode::CONFLICT,
            "No hay un backend disponible para iniciar sesión.",
        );
    };

    auth.settled().await;
    match auth.sign_in(form.email.trim(), &form.password).await {
        Ok(token) => {
            let cookie = Cookie::build((SESSION_COOKIE, token))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax);
            (jar.add(cookie), Redirect::to(Route::Admin.path())).into_response()
        }
        Err(e) => {
            warn!("Sign-in failed for {}: {}", form.email, e);
            login_error(
                true,
                StatusCode::UNAUTHORIZED,
                "Correo o contraseña incorrectos.",
            )
        }
    }
}

/// POST /logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(auth) = state.connection.auth().await {
        auth.sign_out().await;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to(Route::Home.path())).into_response()
}

#[derive(Debug, Deserialize)]
pub struct ConfigForm {
    pub config: String,
}

/// POST /login/config - First-time backend setup
pub async fn configure_backend(
    State(state): State<AppState>,
    Form(form): Form<ConfigForm>,
) -> Response {
    // Once configured, changes go through the guarded admin page
    if state.connection.is_configured() {
        return login_error(
            true,
            StatusCode::CONFLICT,
            "El backend ya está configurado.",
        );
    }
    if !state.connection.configure(&form.config).await {
        return login_error(
            false,
            StatusCode::BAD_REQUEST,
            "Configuración inválida.",
        );
    }
    info!("Backend configured from the login page");
    Redirect::to(Route::Login.path()).into_response()
}

#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    pub saved: Option<String>,
}

fn saved_notice(saved: &str) -> Option<String> {
    let text = match saved {
        "item" => "Producto guardado.",
        "menu" => "Menú guardado.",
        "config" => "Configuración guardada.",
        _ => return None,
    };
    Some(text.to_string())
}

async fn render_admin(
    state: &AppState,
    user: &AuthUser,
    notice: Option<String>,
    error: Option<String>,
) -> Result<String, ApiError> {
    let tree = state.menu.fetch_menu().await?;
    let config_json = state
        .connection
        .config()
        .get_config()
        .and_then(|config| serde_json::to_string_pretty(&config).ok())
        .unwrap_or_default();
    let email = user.email.clone().unwrap_or_else(|| user.uid.clone());

    Ok(render_page(rsx! {
        AdminPage { tree, email, config_json, notice, error }
    }))
}

/// Re-render the admin page with an error, or fall back to the plain
/// error response when the page itself cannot be built.
async fn admin_error(state: &AppState, user: &AuthUser, error: ApiError) -> Response {
    let status = error.status();
    warn!("Admin action failed: {}", error);
    match render_admin(state, user, None, Some(error.to_string())).await {
        Ok(html) => (status, Html(html)).into_response(),
        Err(_) => error.into_response(),
    }
}

/// GET /admin
pub async fn admin_page(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<AdminQuery>,
) -> Result<Html<String>, ApiError> {
    let notice = query.saved.as_deref().and_then(saved_notice);
    Ok(Html(render_admin(&state, &user, notice, None).await?))
}

/// Build an item from the edit form fields. Unchecked `visible` means
/// hidden; `price_<key>` fields become prices.
pub fn item_from_form(fields: Vec<(String, String)>) -> Result<MenuItem, ApiError> {
    let mut item = MenuItem::new("", "");
    item.visible = false;

    for (name, value) in fields {
        let value = value.trim();
        match name.as_str() {
            "nombre" => item.nombre = value.to_string(),
            "ingredientes" => item.ingredientes = value.to_string(),
            "visible" => item.visible = true,
            _ => {
                if let Some(key) = name.strip_prefix(PRICE_FIELD_PREFIX) {
                    if !key.is_empty() && !value.is_empty() {
                        item.prices.insert(key.to_string(), price_value(value));
                    }
                }
            }
        }
    }

    if item.nombre.is_empty() {
        return Err(ApiError::BadRequest("item name is required".to_string()));
    }
    Ok(item)
}

/// Whole numbers are stored as numbers, anything else as text.
fn price_value(text: &str) -> Value {
    match text.parse::<i64>() {
        Ok(n) => Value::from(n),
        Err(_) => Value::from(text),
    }
}

/// POST /admin/items/{category}/{index}
pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path((category, index)): Path<(String, usize)>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let result = async {
        let category: Category = category
            .parse()
            .map_err(|e: menu_types::UnknownCategory| ApiError::BadRequest(e.to_string()))?;
        let item = item_from_form(fields)?;
        state.menu.update_item(category, index, &item).await?;
        Ok::<_, ApiError>(())
    }
    .await;

    match result {
        Ok(()) => Redirect::to("/admin?saved=item").into_response(),
        Err(e) => admin_error(&state, &user, e).await,
    }
}

#[derive(Debug, Deserialize)]
pub struct MenuForm {
    pub menu: String,
}

/// POST /admin/menu - Replace the whole menu
pub async fn save_menu(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Form(form): Form<MenuForm>,
) -> Response {
    let result = async {
        let tree: MenuTree = serde_json::from_str(&form.menu)
            .map_err(|e| ApiError::BadRequest(format!("invalid menu JSON: {}", e)))?;
        state.menu.save_menu(&tree).await?;
        Ok::<_, ApiError>(())
    }
    .await;

    match result {
        Ok(()) => Redirect::to("/admin?saved=menu").into_response(),
        Err(e) => admin_error(&state, &user, e).await,
    }
}

/// POST /admin/config - Replace the backend connection
pub async fn save_config(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Form(form): Form<ConfigForm>,
) -> Response {
    if state.connection.configure(&form.config).await {
        info!("Backend configuration replaced");
        return Redirect::to("/admin?saved=config").into_response();
    }
    admin_error(
        &state,
        &user,
        ApiError::BadRequest("invalid backend configuration".to_string()),
    )
    .await
}
