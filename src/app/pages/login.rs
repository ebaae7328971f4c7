//! Login page.
//!
//! Without a backend there is nobody to sign in against, so the page offers
//! the backend connection form instead.

use dioxus::prelude::*;

use crate::app::components::Layout;

const CONFIG_PLACEHOLDER: &str = r#"{
  "apiKey": "...",
  "authDomain": "...",
  "databaseURL": "https://<project>-default-rtdb.firebaseio.com",
  "projectId": "..."
}"#;

#[component]
pub fn LoginPage(configured: bool, error: Option<String>) -> Element {
    rsx! {
        Layout {
            title: "Ingresar".to_string(),
            nav_active: "admin".to_string(),

            h1 { "Ingresar" }
            if let Some(error) = error {
                p { class: "notice error", "{error}" }
            }

            if configured {
                form { method: "post", action: "/login",
                    label { "Correo"
                        input { r#type: "email", name: "email", required: true, autocomplete: "username" }
                    }
                    label { "Contraseña"
                        input { r#type: "password", name: "password", required: true, autocomplete: "current-password" }
                    }
                    button { r#type: "submit", "Entrar" }
                }
            } else {
                p { class: "notice",
                    "No hay un backend configurado. El menú se muestra desde los archivos incluidos. "
                    "Pega la configuración de la base de datos para habilitar la edición."
                }
                form { method: "post", action: "/login/config",
                    textarea { class: "json", name: "config", placeholder: CONFIG_PLACEHOLDER, required: true }
                    button { r#type: "submit", "Guardar configuración" }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::render_page;

    #[test]
    fn test_configured_shows_credentials_form() {
        let html = render_page(rsx! { LoginPage { configured: true, error: None } });
        assert!(html.contains("action=\"/login\""));
        assert!(!html.contains("/login/config"));
    }

    #[test]
    fn test_unconfigured_shows_config_form() {
        let html = render_page(rsx! {
            LoginPage { configured: false, error: Some("Configuración inválida".to_string()) }
        });
        assert!(html.contains("action=\"/login/config\""));
        assert!(html.contains("Configuración inválida"));
    }
}
