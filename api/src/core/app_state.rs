use std::sync::Arc;

use contextor::Pipeline;

/// Default bind host when neither `API_ADDRESS` nor `HOST` is set.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port when neither `API_ADDRESS` nor `PORT` is set.
pub const DEFAULT_PORT: &str = "8000";
/// Default bind address when no variable is set.
pub const DEFAULT_API_ADDRESS: &str = "0.0.0.0:8000";

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Loaded knowledge base and model clients; read-only after startup.
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}

/// Bind address from `API_ADDRESS`, else `HOST`:`PORT`
/// (defaults [`DEFAULT_HOST`] and [`DEFAULT_PORT`]).
pub fn api_address_from_env() -> String {
    let var = |name: &str| std::env::var(name).ok();
    resolve_api_address(var("API_ADDRESS"), var("HOST"), var("PORT"))
}

fn resolve_api_address(
    address: Option<String>,
    host: Option<String>,
    port: Option<String>,
) -> String {
    let non_blank = |v: Option<String>| {
        v.map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };
    if let Some(address) = non_blank(address) {
        return address;
    }
    let host = non_blank(host).unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = non_blank(port).unwrap_or_else(|| DEFAULT_PORT.to_string());
    format!("{host}:{port}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        assert_eq!(resolve_api_address(None, None, None), DEFAULT_API_ADDRESS);
        assert_eq!(resolve_api_address(s("  "), s(""), None), DEFAULT_API_ADDRESS);
    }

    #[test]
    fn host_and_port_are_used_without_api_address() {
        assert_eq!(resolve_api_address(None, s("127.0.0.1"), s("9000")), "127.0.0.1:9000");
        assert_eq!(resolve_api_address(None, None, s("5005")), "0.0.0.0:5005");
    }

    #[test]
    fn api_address_wins() {
        assert_eq!(
            resolve_api_address(s("localhost:7000"), s("127.0.0.1"), s("9000")),
            "localhost:7000"
        );
    }
}
