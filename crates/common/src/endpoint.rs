use url::Url;

/// The HTTP and websocket URLs of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub http: Url,
    pub ws: Url,
}

impl Endpoint {
    /// The Infura endpoint of `network`, e.g. `mainnet`. Without a project
    /// id the legacy unauthenticated URLs are used.
    pub fn infura(network: &str, project_id: Option<&str>) -> Result<Self, url::ParseError> {
        let (http, ws) = match project_id {
            Some(project_id) => (
                format!("https://{network}.infura.io/v3/{project_id}"),
                format!("wss://{network}.infura.io/ws/v3/{project_id}"),
            ),
            None => (
                format!("https://{network}.infura.io/"),
                format!("wss://{network}.infura.io/ws"),
            ),
        };

        Ok(Self {
            http: Url::parse(&http)?,
            ws: Url::parse(&ws)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infura_with_project_id() {
        let endpoint = Endpoint::infura("mainnet", Some("abc123")).unwrap();
        assert_eq!(endpoint.http.as_str(), "https://mainnet.infura.io/v3/abc123");
        assert_eq!(endpoint.ws.as_str(), "wss://mainnet.infura.io/ws/v3/abc123");
    }

    #[test]
    fn infura_without_project_id() {
        let endpoint = Endpoint::infura("sepolia", None).unwrap();
        assert_eq!(endpoint.http.as_str(), "https://sepolia.infura.io/");
        assert_eq!(endpoint.ws.as_str(), "wss://sepolia.infura.io/ws");
    }

    #[test]
    fn invalid_network() {
        Endpoint::infura("main net", None).unwrap_err();
    }
}
