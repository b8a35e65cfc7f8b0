//! Listener configuration

use strip_ansi_escapes::strip;

const DEFAULT_HOST: &str = "127.0.0.1";

/// Where the HTTP listener binds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    /// 0 lets the OS pick a free port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: 0,
        }
    }
}

impl ServerConfig {
    /// Read `HOST` and `BACKEND_PORT`/`PORT`
    pub fn from_env() -> Self {
        let port = std::env::var("BACKEND_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|s| parse_port(&s))
            .unwrap_or_else(|| {
                tracing::info!("No PORT environment variable set, using port 0 for auto-assignment");
                0
            });

        let host = std::env::var("HOST")
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        Self { host, port }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Port from an env value; terminals sometimes leave ANSI codes in it
fn parse_port(raw: &str) -> Option<u16> {
    let cleaned = String::from_utf8(strip(raw.as_bytes())).ok()?;
    cleaned.trim().parse::<u16>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("3000"), Some(3000));
        assert_eq!(parse_port(" 8080\n"), Some(8080));
        assert_eq!(parse_port("\u{1b}[32m4000\u{1b}[0m"), Some(4000));
        assert_eq!(parse_port("http"), None);
        assert_eq!(parse_port("70000"), None);
    }

    #[test]
    fn test_bind_address() {
        let config = ServerConfig {
            host: "0.0.0.0".into(),
            port: 3000,
        };
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(ServerConfig::default().bind_address(), "127.0.0.1:0");
    }
}
