use crate::constants::{CONTENT_TYPE, HTTPS_PORT};

/// Where one upload goes. Built once from configuration and never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    pub host: String,
    pub port: u16,
    /// Fully formed request target, including any query string
    pub path: String,
    /// Object name, used for log records only
    pub object_name: String,
}

impl RequestDescriptor {
    pub fn new(host: &str, path: &str, object_name: &str) -> Self {
        Self {
            host: host.to_string(),
            port: HTTPS_PORT,
            path: path.to_string(),
            object_name: object_name.to_string(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Request line and headers, including the blank line that ends them.
    pub fn head(&self) -> String {
        format!(
            "POST {} HTTP/1.0\r\n\
             Host: {}\r\n\
             Transfer-Encoding: chunked\r\n\
             Content-Type: {}\r\n\
             \r\n",
            self.path, self.host, CONTENT_TYPE
        )
    }
}
